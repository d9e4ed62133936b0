//! CLI `inspect` command: show one user's full state.

use anyhow::Result;

use crate::config::KindredConfig;
use crate::memory::store;

/// Turns shown at the bottom of the report.
const RECENT_TURNS: u32 = 5;

pub fn inspect(config: &KindredConfig, user_id: &str) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let Some(user) = crate::progression::ledger::load_user(&conn, user_id)? else {
        println!("No user {user_id} has been active yet.");
        return Ok(());
    };

    println!("User: {}", user.id);
    println!("{}", "=".repeat(50));
    println!("  Points:         {}", user.points);
    println!("  Level:          {}", user.level);
    println!(
        "  XP:             {} / {}",
        user.xp,
        crate::progression::xp_threshold(user.level)
    );
    println!("  Streak:         {} days", user.streak);
    if let Some(last) = user.last_activity_at {
        println!("  Last activity:  {last}");
    }
    println!("  Memory window:  {} turns", user.memory_window);
    println!("  Turns recorded: {}", store::turn_count(&conn, user_id)?);

    if !user.inventory.is_empty() {
        println!();
        println!("Inventory:");
        for item in &user.inventory {
            println!("  {item}");
        }
    }

    if !user.badges.is_empty() {
        println!();
        println!("Badges:");
        for badge in &user.badges {
            println!("  {badge}");
        }
    }

    let moods = crate::mood::list_moods(&conn, user_id)?;
    if let Some(latest) = moods.first() {
        println!();
        println!("Latest mood:      {} ({}, {})", latest.mood, latest.locale, latest.created_at);
    }

    let recent = store::recent_entries(&conn, user_id, RECENT_TURNS)?;
    if !recent.is_empty() {
        println!();
        println!("Recent turns:");
        for entry in &recent {
            println!("  [{}]", entry.created_at);
            println!("    user: {}", entry.user_text);
            println!("    bot:  {}", entry.bot_text);
        }
    }

    Ok(())
}
