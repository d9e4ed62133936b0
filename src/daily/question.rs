//! Per-user daily question.
//!
//! A user holds at most one question. It is generated on first request and
//! kept after being answered; there is no re-roll. A correct first answer
//! records progress through the ledger and marks the question answered, so
//! resubmissions never award twice.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{KindredError, Result};
use crate::progression::ledger::{apply_activity, validate_user_id};
use crate::progression::ActivityOutcome;

/// Fixed pool used when generation fails: (question, choices, answer index).
pub const FALLBACK_QUESTIONS: &[(&str, &[&str], usize)] = &[
    (
        "Which habit is most linked to better sleep?",
        &["Scrolling in bed", "A consistent bedtime", "Late coffee", "Skipping dinner"],
        1,
    ),
    (
        "How many minutes of brisk walking a day are often recommended?",
        &["5", "30", "90", "180"],
        1,
    ),
    (
        "What does the 4-7-8 technique describe?",
        &["A breathing pattern", "A diet plan", "A sleep schedule", "A workout split"],
        0,
    ),
    (
        "Which of these is a good first step when feeling overwhelmed?",
        &["Ignore it", "Name what you feel", "Work longer hours", "Skip meals"],
        1,
    ),
    (
        "Which planet is closest to the Sun?",
        &["Venus", "Earth", "Mercury", "Mars"],
        2,
    ),
];

/// A stored question, matching the `daily_questions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuestion {
    pub user_id: String,
    pub question: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
    pub reward: i64,
    pub answered: bool,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

/// What a client sees. The answer index stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub question: String,
    pub choices: Vec<String>,
    pub reward: i64,
    pub answered: bool,
}

impl From<&DailyQuestion> for QuestionView {
    fn from(q: &DailyQuestion) -> Self {
        Self {
            question: q.question.clone(),
            choices: q.choices.clone(),
            reward: q.reward,
            answered: q.answered,
        }
    }
}

/// A question as produced by the content provider or the fallback pool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub choices: Vec<String>,
    pub answer: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// Points actually awarded by this call.
    pub reward: i64,
    pub already_answered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityOutcome>,
}

/// The user's current question, answered or not.
pub fn find(conn: &Connection, user_id: &str) -> Result<Option<DailyQuestion>> {
    let row = conn
        .query_row(
            "SELECT user_id, question, choices, answer_index, reward, answered, created_at, answered_at \
             FROM daily_questions WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, bool>(5)?,
                    row.get::<_, DateTime<Utc>>(6)?,
                    row.get::<_, Option<DateTime<Utc>>>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, question, choices, answer_index, reward, answered, created_at, answered_at)) =
        row
    else {
        return Ok(None);
    };

    let answer_index = usize::try_from(answer_index)
        .map_err(|_| KindredError::Storage(format!("negative answer index for {user_id}")))?;

    Ok(Some(DailyQuestion {
        user_id,
        question,
        choices: serde_json::from_str(&choices)?,
        answer_index,
        reward,
        answered,
        created_at,
        answered_at,
    }))
}

/// Store a freshly generated question unless the user already has one, and
/// return the stored question.
pub fn store_if_absent(
    conn: &Connection,
    user_id: &str,
    generated: &GeneratedQuestion,
    reward: i64,
    now: DateTime<Utc>,
) -> Result<DailyQuestion> {
    validate_user_id(user_id)?;

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO daily_questions \
         (user_id, question, choices, answer_index, reward, answered, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
        params![
            user_id,
            generated.question,
            serde_json::to_string(&generated.choices)?,
            generated.answer as i64,
            reward,
            now,
        ],
    )?;
    if inserted > 0 {
        tracing::info!(user_id = %user_id, "daily question created");
    }

    find(conn, user_id)?
        .ok_or_else(|| KindredError::Internal(format!("question for {user_id} missing after insert")))
}

/// Insert a full question row (snapshot import).
pub(crate) fn insert_question(conn: &Connection, q: &DailyQuestion) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO daily_questions \
         (user_id, question, choices, answer_index, reward, answered, created_at, answered_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            q.user_id,
            q.question,
            serde_json::to_string(&q.choices)?,
            q.answer_index as i64,
            q.reward,
            q.answered,
            q.created_at,
            q.answered_at,
        ],
    )?;
    Ok(())
}

/// Every stored question.
pub fn all(conn: &Connection) -> Result<Vec<DailyQuestion>> {
    let ids: Vec<String> = conn
        .prepare("SELECT user_id FROM daily_questions ORDER BY user_id")?
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut questions = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(q) = find(conn, &id)? {
            questions.push(q);
        }
    }
    Ok(questions)
}

/// Grade an answer.
///
/// Out-of-range indices are a `Validation` error. Wrong answers leave the
/// question open. A correct answer to an open question records `reward`
/// through the ledger and closes it, in one transaction.
pub fn answer(
    conn: &mut Connection,
    user_id: &str,
    choice_index: i64,
    now: DateTime<Utc>,
    default_window: u32,
) -> Result<AnswerOutcome> {
    validate_user_id(user_id)?;

    let tx = conn.transaction()?;

    let question = find(&tx, user_id)?
        .ok_or_else(|| KindredError::not_found(format!("daily question for {user_id}")))?;

    let index = usize::try_from(choice_index)
        .ok()
        .filter(|i| *i < question.choices.len())
        .ok_or_else(|| {
            KindredError::validation(format!(
                "choice index must be between 0 and {}, got {choice_index}",
                question.choices.len().saturating_sub(1)
            ))
        })?;
    let correct = index == question.answer_index;

    if question.answered {
        return Ok(AnswerOutcome {
            correct,
            reward: 0,
            already_answered: true,
            activity: None,
        });
    }

    if !correct {
        tracing::debug!(user_id = %user_id, index, "daily answer incorrect");
        return Ok(AnswerOutcome {
            correct: false,
            reward: 0,
            already_answered: false,
            activity: None,
        });
    }

    let activity = apply_activity(&tx, user_id, question.reward, now, default_window)?;
    tx.execute(
        "UPDATE daily_questions SET answered = 1, answered_at = ?1 WHERE user_id = ?2",
        params![now, user_id],
    )?;
    crate::leaderboard::update(&tx, user_id, now)?;
    tx.commit()?;

    tracing::info!(user_id = %user_id, award = activity.award, "daily question answered");

    Ok(AnswerOutcome {
        correct: true,
        reward: activity.award,
        already_answered: false,
        activity: Some(activity),
    })
}

/// Parse a provider reply into a question. Accepts a bare JSON object or one
/// wrapped in prose or code fences.
pub fn parse_generated(text: &str) -> Option<GeneratedQuestion> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    let parsed: GeneratedQuestion = serde_json::from_str(&text[start..=end]).ok()?;
    let valid = !parsed.question.trim().is_empty()
        && (2..=6).contains(&parsed.choices.len())
        && parsed.choices.iter().all(|c| !c.trim().is_empty())
        && parsed.answer < parsed.choices.len();

    valid.then_some(parsed)
}

/// Deterministic pick from [`FALLBACK_QUESTIONS`] for a user.
pub fn fallback_question(user_id: &str) -> GeneratedQuestion {
    let seed = user_id
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    let (question, choices, answer) = FALLBACK_QUESTIONS[seed % FALLBACK_QUESTIONS.len()];
    GeneratedQuestion {
        question: question.to_string(),
        choices: choices.iter().map(|c| c.to_string()).collect(),
        answer,
    }
}
