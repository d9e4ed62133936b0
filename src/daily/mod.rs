//! Resources generated at most once per key: the global daily oracle and each
//! user's daily question. Day boundaries are UTC.

pub mod oracle;
pub mod question;

pub use oracle::OracleReading;
pub use question::{AnswerOutcome, DailyQuestion, QuestionView};
