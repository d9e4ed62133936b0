use anyhow::Result;

use crate::config::KindredConfig;

/// Display store statistics in the terminal.
pub fn stats(config: &KindredConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let s = crate::db::stats::store_stats(&conn, Some(&db_path))?;

    println!("Kindred Statistics");
    println!("{}", "=".repeat(40));
    println!("  Users:               {}", s.users);
    println!("  Points in play:      {}", s.total_points);
    println!("  Conversation turns:  {}", s.memories);
    println!("  Moods logged:        {}", s.moods);
    println!("  Badges awarded:      {}", s.badges_awarded);
    println!("  Items owned:         {}", s.items_owned);
    println!();

    println!("Daily:");
    println!("  Oracle days:         {}", s.oracle_days);
    println!("  Questions answered:  {}", s.questions_answered);
    println!("  Questions pending:   {}", s.questions_pending);
    println!();

    println!("Leaderboard:");
    for (rank, entry) in crate::leaderboard::read(&conn)?.iter().enumerate() {
        println!("  {:>2}. {:<24} {:>6} pts  L{}", rank + 1, entry.user_id, entry.points, entry.level);
    }
    println!();

    println!("Database size:         {} bytes", s.db_size_bytes);
    if let Some(oldest) = s.oldest_memory {
        println!("Oldest turn:           {oldest}");
    }
    if let Some(newest) = s.newest_memory {
        println!("Newest turn:           {newest}");
    }

    Ok(())
}
