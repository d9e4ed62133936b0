//! Age-based decay of the context window.
//!
//! [`build_context`] takes the user's `memory_window` most recent turns and
//! classifies each by whole days of age: fresh turns pass through verbatim,
//! faded turns carry an age marker on the user text, forgotten turns are left
//! out of the window (the stored rows are untouched).

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::error::Result;
use crate::memory::store::recent_entries;
use crate::memory::types::{ContextTurn, DecayPolicy, Freshness, MemoryEntry};

/// Whole days between `created_at` and `now`, rounded down. Turns stamped in
/// the future count as age 0.
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}

pub fn classify(age_days: i64, policy: &DecayPolicy) -> Freshness {
    if age_days >= policy.forget_after_days {
        Freshness::Forgotten
    } else if age_days >= policy.fade_after_days {
        Freshness::Faded
    } else {
        Freshness::Fresh
    }
}

/// Marker prepended to faded user text.
pub fn faded_marker(age_days: i64) -> String {
    if age_days == 1 {
        "[from 1 day ago] ".to_string()
    } else {
        format!("[from {age_days} days ago] ")
    }
}

/// Apply decay to turns that are already limited to the window, keeping
/// their order.
pub fn decay_window(entries: &[MemoryEntry], now: DateTime<Utc>, policy: &DecayPolicy) -> Vec<ContextTurn> {
    entries
        .iter()
        .filter_map(|entry| {
            let age_days = age_in_days(entry.created_at, now);
            let freshness = classify(age_days, policy);
            let user_text = match freshness {
                Freshness::Forgotten => return None,
                Freshness::Faded => format!("{}{}", faded_marker(age_days), entry.user_text),
                Freshness::Fresh => entry.user_text.clone(),
            };
            Some(ContextTurn {
                user_text,
                bot_text: entry.bot_text.clone(),
                age_days,
                freshness,
            })
        })
        .collect()
}

/// Build the decayed context window for a user, oldest turn first.
pub fn build_context(
    conn: &Connection,
    user_id: &str,
    memory_window: u32,
    now: DateTime<Utc>,
    policy: &DecayPolicy,
) -> Result<Vec<ContextTurn>> {
    let entries = recent_entries(conn, user_id, memory_window)?;
    let context = decay_window(&entries, now, policy);

    tracing::debug!(
        user_id = %user_id,
        window = memory_window,
        candidates = entries.len(),
        included = context.len(),
        "context built"
    );

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 20, 12, 0, 0).unwrap()
    }

    fn entry(text: &str, created_at: DateTime<Utc>) -> MemoryEntry {
        MemoryEntry {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: "u".into(),
            user_text: text.into(),
            bot_text: "reply".into(),
            created_at,
        }
    }

    #[test]
    fn age_rounds_down() {
        assert_eq!(age_in_days(now() - Duration::hours(71), now()), 2);
        assert_eq!(age_in_days(now() - Duration::hours(72), now()), 3);
        assert_eq!(age_in_days(now() + Duration::hours(5), now()), 0);
    }

    #[test]
    fn boundaries() {
        let policy = DecayPolicy::default();
        assert_eq!(classify(0, &policy), Freshness::Fresh);
        assert_eq!(classify(2, &policy), Freshness::Fresh);
        assert_eq!(classify(3, &policy), Freshness::Faded);
        assert_eq!(classify(6, &policy), Freshness::Faded);
        assert_eq!(classify(7, &policy), Freshness::Forgotten);
    }

    #[test]
    fn faded_turns_are_marked_and_forgotten_turns_dropped() {
        let entries = vec![
            entry("ancient", now() - Duration::days(7)),
            entry("older", now() - Duration::days(3)),
            entry("recent", now() - Duration::days(2)),
        ];

        let context = decay_window(&entries, now(), &DecayPolicy::default());
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].user_text, "[from 3 days ago] older");
        assert_eq!(context[0].freshness, Freshness::Faded);
        assert_eq!(context[1].user_text, "recent");
        assert_eq!(context[1].freshness, Freshness::Fresh);
        assert_eq!(context[1].bot_text, "reply");
    }
}
