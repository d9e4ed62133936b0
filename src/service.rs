//! The companion service: every exposed operation, wired across the engine
//! components.
//!
//! Holds the shared connection, the external providers, config and a clock.
//! Database work runs on the blocking pool while holding the connection lock
//! for exactly one transaction; provider calls run without the lock and are
//! always bounded by a timeout.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::KindredConfig;
use crate::daily::oracle::{self, utc_day};
use crate::daily::question::{self, AnswerOutcome, QuestionView};
use crate::db::SharedDb;
use crate::economy::{self, PurchaseOutcome, ShopItem};
use crate::error::{KindredError, Result};
use crate::leaderboard::{self, LeaderboardEntry};
use crate::memory::{self, DecayPolicy};
use crate::mood::{self, MoodEntry};
use crate::progression::ledger;
use crate::progression::{Profile, User};
use crate::prompt;
use crate::providers::{bounded, turns_from_context, ChatCompletionProvider, ChatTurn, WebSearchProvider};

/// Longest accepted chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    /// `None` when the provider failed and nothing was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_awarded: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub new_badges: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoodReply {
    pub heartbeat_message: String,
    pub entry: MoodEntry,
}

#[derive(Debug, Clone, Serialize)]
pub struct OracleView {
    pub day: NaiveDate,
    /// The day's stored payload, identical for every call that day.
    pub oracle: String,
    /// What to show: the payload on first reveal, a rotating placeholder after.
    pub message: String,
    pub already_consumed: bool,
}

pub struct Kindred {
    db: SharedDb,
    completion: Arc<dyn ChatCompletionProvider>,
    search: Option<Arc<dyn WebSearchProvider>>,
    config: Arc<KindredConfig>,
    clock: Arc<dyn Clock>,
    /// Serialises oracle generation so a day is generated once.
    oracle_gate: tokio::sync::Mutex<()>,
    /// Per-user gates so a user is generated one question without making
    /// other users wait.
    question_gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    placeholder_turn: AtomicUsize,
}

impl Kindred {
    pub fn new(
        db: SharedDb,
        completion: Arc<dyn ChatCompletionProvider>,
        search: Option<Arc<dyn WebSearchProvider>>,
        config: Arc<KindredConfig>,
    ) -> Self {
        Self {
            db,
            completion,
            search,
            config,
            clock: Arc::new(SystemClock),
            oracle_gate: tokio::sync::Mutex::new(()),
            question_gates: Mutex::new(HashMap::new()),
            placeholder_turn: AtomicUsize::new(0),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &KindredConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn default_window(&self) -> u32 {
        self.config.memory.default_window.max(1)
    }

    fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.config.completion.timeout_secs.max(1))
    }

    /// Run `f` on the blocking pool with the connection locked.
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| KindredError::Internal(format!("db lock poisoned: {e}")))?;
            f(&mut conn)
        })
        .await?
    }

    /// One chat turn: decayed context → optional search → completion →
    /// append turn, record activity and refresh the leaderboard atomically.
    ///
    /// Provider failures never surface as errors: the reply becomes a generic
    /// fallback and nothing is written.
    pub async fn submit_chat_turn(&self, user_id: &str, message: &str, locale: &str) -> Result<ChatReply> {
        ledger::validate_user_id(user_id)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(KindredError::validation("message must not be empty"));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(KindredError::validation(format!(
                "message must be at most {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let now = self.now();
        let policy = DecayPolicy::from(&self.config.memory);
        let default_window = self.default_window();
        let uid = user_id.to_string();
        let context = self
            .with_db(move |conn| {
                let window = ledger::load_user(conn, &uid)?
                    .map(|u| u.memory_window)
                    .unwrap_or(default_window);
                memory::build_context(conn, &uid, window, now, &policy)
            })
            .await?;

        let search_context = match &self.search {
            Some(search) => {
                let limit = Duration::from_secs(self.config.search.timeout_secs.max(1));
                bounded(limit, "search", async { Ok::<_, KindredError>(search.search(message).await) })
                    .await
                    .unwrap_or_default()
            }
            None => String::new(),
        };

        let system_prompt = prompt::chat_system_prompt(locale, &search_context);
        let turns = turns_from_context(&context, message);

        let reply = match bounded(
            self.completion_timeout(),
            "completion",
            self.completion.complete(&system_prompt, &turns),
        )
        .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    provider = self.completion.name(),
                    error = %e,
                    "completion failed, returning fallback reply"
                );
                return Ok(ChatReply {
                    reply: prompt::FALLBACK_REPLY.to_string(),
                    points_awarded: None,
                    new_badges: Vec::new(),
                });
            }
        };

        let now = self.now();
        let base_points = self.config.progression.chat_points;
        let uid = user_id.to_string();
        let user_text = message.to_string();
        let bot_text = reply.clone();
        let outcome = self
            .with_db(move |conn| {
                let tx = conn.transaction()?;
                memory::store::append(&tx, &uid, &user_text, &bot_text, now)?;
                let outcome = ledger::apply_activity(&tx, &uid, base_points, now, default_window)?;
                leaderboard::update(&tx, &uid, now)?;
                tx.commit()?;
                Ok(outcome)
            })
            .await?;

        Ok(ChatReply {
            reply,
            points_awarded: Some(outcome.award),
            new_badges: outcome.new_badges,
        })
    }

    pub async fn record_mood(&self, user_id: &str, mood_name: &str, locale: &str) -> Result<MoodReply> {
        let now = self.now();
        let (uid, m, loc) = (user_id.to_string(), mood_name.to_string(), locale.to_string());
        let entry = self
            .with_db(move |conn| mood::record_mood(conn, &uid, &m, &loc, now))
            .await?;

        Ok(MoodReply {
            heartbeat_message: mood::heartbeat_message(&entry.mood, &entry.locale),
            entry,
        })
    }

    pub async fn list_moods(&self, user_id: &str) -> Result<Vec<MoodEntry>> {
        ledger::validate_user_id(user_id)?;
        let uid = user_id.to_string();
        self.with_db(move |conn| mood::list_moods(conn, &uid)).await
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        let uid = user_id.to_string();
        let window = self.default_window();
        self.with_db(move |conn| ledger::profile(conn, &uid, window)).await
    }

    pub async fn list_shop(&self) -> Result<Vec<ShopItem>> {
        self.with_db(|conn| economy::list_items(conn)).await
    }

    pub async fn preview_item(&self, item_id: &str) -> Result<ShopItem> {
        let id = item_id.to_string();
        self.with_db(move |conn| economy::preview(conn, &id)).await
    }

    pub async fn purchase(&self, user_id: &str, item_id: &str) -> Result<PurchaseOutcome> {
        let now = self.now();
        let (uid, iid) = (user_id.to_string(), item_id.to_string());
        self.with_db(move |conn| economy::purchase(conn, &uid, &iid, now)).await
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        self.with_db(|conn| leaderboard::read(conn)).await
    }

    /// The user's current daily question, generated on first request.
    pub async fn daily_question(&self, user_id: &str) -> Result<QuestionView> {
        ledger::validate_user_id(user_id)?;

        if let Some(existing) = self.stored_question(user_id).await? {
            return Ok(QuestionView::from(&existing));
        }

        let gate = self.question_gate(user_id)?;
        let guard = gate.lock().await;

        // another request may have stored it while we waited
        let stored = match self.stored_question(user_id).await? {
            Some(existing) => existing,
            None => {
                let generated = self.generate_question(user_id).await;
                let now = self.now();
                let reward = self.config.progression.question_reward;
                let uid = user_id.to_string();
                self.with_db(move |conn| question::store_if_absent(conn, &uid, &generated, reward, now))
                    .await?
            }
        };

        drop(guard);
        self.release_question_gate(user_id, &gate)?;

        Ok(QuestionView::from(&stored))
    }

    async fn stored_question(&self, user_id: &str) -> Result<Option<question::DailyQuestion>> {
        let uid = user_id.to_string();
        self.with_db(move |conn| question::find(conn, &uid)).await
    }

    fn question_gate(&self, user_id: &str) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut gates = self
            .question_gates
            .lock()
            .map_err(|e| KindredError::Internal(format!("question gates poisoned: {e}")))?;
        Ok(Arc::clone(gates.entry(user_id.to_string()).or_default()))
    }

    /// Forget a user's gate once nobody else holds it. Later requests find
    /// the stored question before ever needing a gate.
    fn release_question_gate(&self, user_id: &str, gate: &Arc<tokio::sync::Mutex<()>>) -> Result<()> {
        let mut gates = self
            .question_gates
            .lock()
            .map_err(|e| KindredError::Internal(format!("question gates poisoned: {e}")))?;
        // one reference in the map, one held by the caller
        if Arc::strong_count(gate) <= 2 {
            gates.remove(user_id);
        }
        Ok(())
    }

    async fn generate_question(&self, user_id: &str) -> question::GeneratedQuestion {
        if self.completion.generates_content() {
            let result = bounded(
                self.completion_timeout(),
                "question generation",
                self.completion.complete(
                    prompt::question_system_prompt(),
                    &[ChatTurn::user("Write today's question.")],
                ),
            )
            .await;

            match result.map(|text| question::parse_generated(&text)) {
                Ok(Some(generated)) => return generated,
                Ok(None) => tracing::warn!(user_id = %user_id, "generated question unusable, using fallback pool"),
                Err(e) => tracing::warn!(user_id = %user_id, error = %e, "question generation failed, using fallback pool"),
            }
        }
        question::fallback_question(user_id)
    }

    pub async fn answer_daily_question(&self, user_id: &str, choice_index: i64) -> Result<AnswerOutcome> {
        let now = self.now();
        let window = self.default_window();
        let uid = user_id.to_string();
        self.with_db(move |conn| question::answer(conn, &uid, choice_index, now, window))
            .await
    }

    /// Today's oracle. The first call of a UTC day generates and stores it;
    /// later calls that day return the same payload flagged as consumed.
    pub async fn daily_oracle(&self) -> Result<OracleView> {
        let _gate = self.oracle_gate.lock().await;

        let now = self.now();
        let day = utc_day(now);

        let existing = self.with_db(move |conn| oracle::find(conn, day)).await?;
        let reading = match existing {
            Some(payload) => oracle::OracleReading {
                day,
                payload,
                already_consumed: true,
            },
            None => {
                let payload = self.generate_oracle(day).await;
                self.with_db(move |conn| oracle::insert_if_absent(conn, day, &payload, now))
                    .await?
            }
        };

        let message = if reading.already_consumed {
            let turn = self.placeholder_turn.fetch_add(1, Ordering::Relaxed);
            oracle::placeholder(turn).to_string()
        } else {
            reading.payload.clone()
        };

        Ok(OracleView {
            day: reading.day,
            oracle: reading.payload,
            message,
            already_consumed: reading.already_consumed,
        })
    }

    async fn generate_oracle(&self, day: NaiveDate) -> String {
        if self.completion.generates_content() {
            let result = bounded(
                self.completion_timeout(),
                "oracle generation",
                self.completion.complete(
                    prompt::oracle_system_prompt(),
                    &[ChatTurn::user(format!("Today is {day}."))],
                ),
            )
            .await;

            match result {
                Ok(text) => {
                    if let Some(payload) = oracle::clean_payload(&text) {
                        return payload;
                    }
                    tracing::warn!(day = %day, "empty oracle from provider, using fallback");
                }
                Err(e) => tracing::warn!(day = %day, error = %e, "oracle generation failed, using fallback"),
            }
        }
        oracle::fallback_oracle(day).to_string()
    }

    /// Grant points directly. Requires `secret` to match the configured admin
    /// token; with no token configured every call is forbidden.
    pub async fn admin_add_points(&self, user_id: &str, amount: i64, secret: &str) -> Result<User> {
        let authorized = self
            .config
            .server
            .admin_token
            .as_deref()
            .is_some_and(|token| !token.is_empty() && token == secret);
        if !authorized {
            tracing::warn!(user_id = %user_id, "admin grant rejected");
            return Err(KindredError::Forbidden);
        }

        let now = self.now();
        let window = self.default_window();
        let uid = user_id.to_string();
        self.with_db(move |conn| ledger::add_points(conn, &uid, amount, now, window))
            .await
    }
}
