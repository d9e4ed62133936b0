mod helpers;

use chrono::Duration;
use kindred::clock::FixedClock;
use kindred::daily::oracle::{fallback_oracle, PLACEHOLDERS};
use kindred::error::KindredError;
use std::sync::Arc;

const QUESTION_JSON: &str =
    r#"{"question": "Which planet is closest to the sun?", "choices": ["Venus", "Mercury", "Mars"], "answer": 1}"#;

#[tokio::test]
async fn oracle_is_generated_once_per_day() {
    let clock = Arc::new(FixedClock::new(helpers::day(3)));
    let provider = helpers::ScriptedProvider::new("\"Breathe in the morning.\"");
    let kindred = helpers::service(provider.clone(), clock.clone());

    let first = kindred.daily_oracle().await.unwrap();
    assert!(!first.already_consumed);
    assert_eq!(first.oracle, "Breathe in the morning.");
    assert_eq!(first.message, first.oracle);

    clock.advance(Duration::hours(6));
    let second = kindred.daily_oracle().await.unwrap();
    assert!(second.already_consumed);
    assert_eq!(second.oracle, first.oracle);
    assert!(PLACEHOLDERS.contains(&second.message.as_str()));
    assert_eq!(provider.calls(), 1);

    clock.set(helpers::day(4));
    let next_day = kindred.daily_oracle().await.unwrap();
    assert!(!next_day.already_consumed);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn concurrent_oracle_requests_share_one_payload() {
    let clock = Arc::new(FixedClock::new(helpers::day(3)));
    let provider = helpers::ScriptedProvider::new("Be gentle with yourself.");
    let kindred = Arc::new(helpers::service(provider.clone(), clock));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let k = Arc::clone(&kindred);
            tokio::spawn(async move { k.daily_oracle().await.unwrap() })
        })
        .collect();

    let mut fresh = 0;
    for h in handles {
        let view = h.await.unwrap();
        assert_eq!(view.oracle, "Be gentle with yourself.");
        if !view.already_consumed {
            fresh += 1;
        }
    }
    assert_eq!(fresh, 1);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn failing_provider_uses_fallback_oracle() {
    let clock = Arc::new(FixedClock::new(helpers::day(5)));
    let kindred = helpers::service(Arc::new(helpers::FailingProvider), clock);

    let view = kindred.daily_oracle().await.unwrap();
    assert_eq!(view.oracle, fallback_oracle(helpers::day(5).date_naive()));
}

#[tokio::test]
async fn question_reward_is_paid_once() {
    let clock = Arc::new(FixedClock::new(helpers::day(3)));
    let kindred = helpers::service(helpers::ScriptedProvider::new(QUESTION_JSON), clock);

    let view = kindred.daily_question("gia").await.unwrap();
    assert_eq!(view.choices.len(), 3);
    assert_eq!(view.reward, 20);
    assert!(!view.answered);

    let wrong = kindred.answer_daily_question("gia", 0).await.unwrap();
    assert!(!wrong.correct);
    assert_eq!(wrong.reward, 0);

    let right = kindred.answer_daily_question("gia", 1).await.unwrap();
    assert!(right.correct);
    assert_eq!(right.reward, 20);

    let again = kindred.answer_daily_question("gia", 1).await.unwrap();
    assert!(again.correct);
    assert!(again.already_answered);
    assert_eq!(again.reward, 0);

    assert_eq!(kindred.get_profile("gia").await.unwrap().user.points, 20);
    assert!(kindred.daily_question("gia").await.unwrap().answered);
}

#[tokio::test]
async fn question_is_stable_and_hides_the_answer() {
    let clock = Arc::new(FixedClock::new(helpers::day(3)));
    let provider = helpers::ScriptedProvider::new(QUESTION_JSON);
    let kindred = helpers::service(provider.clone(), clock);

    let a = kindred.daily_question("hal").await.unwrap();
    let b = kindred.daily_question("hal").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(provider.calls(), 1);

    let json = serde_json::to_value(&a).unwrap();
    assert!(json.get("answer").is_none());
    assert!(json.get("answer_index").is_none());
}

#[tokio::test]
async fn unusable_generation_falls_back_to_pool() {
    let clock = Arc::new(FixedClock::new(helpers::day(3)));
    let kindred = helpers::service(helpers::ScriptedProvider::new("no json here"), clock);

    let view = kindred.daily_question("ivy").await.unwrap();
    let expected = kindred::daily::question::fallback_question("ivy");
    assert_eq!(view.question, expected.question);
}

#[tokio::test]
async fn answer_validation() {
    let clock = Arc::new(FixedClock::new(helpers::day(3)));
    let kindred = helpers::service(helpers::ScriptedProvider::new(QUESTION_JSON), clock);

    assert!(matches!(
        kindred.answer_daily_question("jo", 0).await,
        Err(KindredError::NotFound(_))
    ));

    kindred.daily_question("jo").await.unwrap();
    assert!(matches!(
        kindred.answer_daily_question("jo", 7).await,
        Err(KindredError::Validation(_))
    ));
    assert!(matches!(
        kindred.answer_daily_question("jo", -1).await,
        Err(KindredError::Validation(_))
    ));
}

#[tokio::test]
async fn slow_generation_does_not_block_other_users() {
    let clock = Arc::new(FixedClock::new(helpers::day(3)));
    let provider = helpers::SlowProvider::new(QUESTION_JSON, std::time::Duration::from_millis(600));
    let kindred = Arc::new(helpers::service(provider.clone(), clock));

    kindred.daily_question("bob").await.unwrap();

    let k = Arc::clone(&kindred);
    let alice = tokio::spawn(async move { k.daily_question("alice").await.unwrap() });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let started = std::time::Instant::now();
    kindred.daily_question("bob").await.unwrap();
    assert!(started.elapsed() < std::time::Duration::from_millis(300));

    alice.await.unwrap();
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_generate_one_question_per_user() {
    let clock = Arc::new(FixedClock::new(helpers::day(3)));
    let provider = helpers::SlowProvider::new(QUESTION_JSON, std::time::Duration::from_millis(100));
    let kindred = Arc::new(helpers::service(provider.clone(), clock));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let k = Arc::clone(&kindred);
            let user = if i % 2 == 0 { "fay" } else { "gus" };
            tokio::spawn(async move { k.daily_question(user).await.unwrap() })
        })
        .collect();
    for h in handles {
        assert_eq!(h.await.unwrap().choices.len(), 3);
    }
    assert_eq!(provider.calls(), 2);
}
