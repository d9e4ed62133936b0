mod helpers;

use chrono::Duration;
use kindred::clock::FixedClock;
use kindred::error::KindredError;
use kindred::progression::badges::EMPATHY_EXPERT;
use kindred::prompt::FALLBACK_REPLY;
use kindred::providers::{ChatRole, ChatTurn};
use std::sync::Arc;

#[tokio::test]
async fn successful_turn_records_memory_and_points() {
    let clock = Arc::new(FixedClock::new(helpers::day(1)));
    let kindred = helpers::service(helpers::ScriptedProvider::new("Hello there!"), clock);

    let reply = kindred.submit_chat_turn("kai", "hi", "en").await.unwrap();
    assert_eq!(reply.reply, "Hello there!");
    assert_eq!(reply.points_awarded, Some(10));

    let profile = kindred.get_profile("kai").await.unwrap();
    assert_eq!(profile.turn_count, 1);
    assert_eq!(profile.user.points, 10);
    assert_eq!(profile.user.streak, 1);

    let board = kindred.leaderboard().await.unwrap();
    assert_eq!(board[0].user_id, "kai");
}

#[tokio::test]
async fn earlier_turns_are_replayed_with_age_markers() {
    let clock = Arc::new(FixedClock::new(helpers::day(1)));
    let provider = helpers::ScriptedProvider::new("noted");
    let kindred = helpers::service(provider.clone(), clock.clone());

    kindred.submit_chat_turn("kai", "my cat is called Miso", "en").await.unwrap();
    clock.advance(Duration::days(4));
    kindred.submit_chat_turn("kai", "remember my cat?", "en").await.unwrap();

    assert_eq!(
        provider.last_turns(),
        vec![
            ChatTurn::user("[from 4 days ago] my cat is called Miso"),
            ChatTurn::assistant("noted"),
            ChatTurn::user("remember my cat?"),
        ]
    );

    clock.advance(Duration::days(10));
    kindred.submit_chat_turn("kai", "hello again", "en").await.unwrap();
    let turns = provider.last_turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, ChatRole::User);
}

#[tokio::test]
async fn provider_failure_returns_fallback_without_side_effects() {
    let clock = Arc::new(FixedClock::new(helpers::day(1)));
    let kindred = helpers::service(Arc::new(helpers::FailingProvider), clock);

    let reply = kindred.submit_chat_turn("lea", "hi", "en").await.unwrap();
    assert_eq!(reply.reply, FALLBACK_REPLY);
    assert_eq!(reply.points_awarded, None);

    let profile = kindred.get_profile("lea").await.unwrap();
    assert_eq!(profile.turn_count, 0);
    assert_eq!(profile.user.points, 0);
    assert!(kindred.leaderboard().await.unwrap().is_empty());
}

#[tokio::test]
async fn hanging_provider_is_cut_off() {
    let clock = Arc::new(FixedClock::new(helpers::day(1)));
    let kindred = helpers::service(Arc::new(helpers::HangingProvider), clock);

    let reply = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        kindred.submit_chat_turn("max", "hi", "en"),
    )
    .await
    .expect("chat turn should resolve within the provider timeout")
    .unwrap();

    assert_eq!(reply.reply, FALLBACK_REPLY);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let clock = Arc::new(FixedClock::new(helpers::day(1)));
    let provider = helpers::ScriptedProvider::new("unused");
    let kindred = helpers::service(provider.clone(), clock);

    let err = kindred.submit_chat_turn("ned", "   ", "en").await.unwrap_err();
    assert!(matches!(err, KindredError::Validation(_)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn support_conversations_earn_empathy_badge() {
    let clock = Arc::new(FixedClock::new(helpers::day(1)));
    let kindred = helpers::service(helpers::ScriptedProvider::new("I'm here."), clock.clone());

    let mut earned = Vec::new();
    for i in 0..10 {
        clock.advance(Duration::minutes(1));
        let reply = kindred
            .submit_chat_turn("ora", &format!("I feel anxious today ({i})"), "en")
            .await
            .unwrap();
        earned.extend(reply.new_badges);
    }

    assert_eq!(earned, vec![EMPATHY_EXPERT.to_string()]);
    let profile = kindred.get_profile("ora").await.unwrap();
    assert!(profile.user.badges.contains(EMPATHY_EXPERT));
}

#[tokio::test]
async fn mood_journal_round_trip() {
    let clock = Arc::new(FixedClock::new(helpers::day(1)));
    let kindred = helpers::service(helpers::ScriptedProvider::new("ok"), clock.clone());

    let reply = kindred.record_mood("pia", "calm", "es-MX").await.unwrap();
    assert!(reply.heartbeat_message.starts_with("Gracias"));

    clock.advance(Duration::hours(1));
    kindred.record_mood("pia", "tired", "en").await.unwrap();

    let moods: Vec<String> = kindred
        .list_moods("pia")
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.mood)
        .collect();
    assert_eq!(moods, vec!["tired", "calm"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_turns_never_lose_updates() {
    let clock = Arc::new(FixedClock::new(helpers::day(1)));
    let kindred = Arc::new(helpers::service(helpers::ScriptedProvider::new("ok"), clock));
    let users = ["ana", "ben", "cal", "dee"];

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let k = Arc::clone(&kindred);
            let user = users[i % users.len()];
            tokio::spawn(async move { k.submit_chat_turn(user, &format!("message {i}"), "en").await.unwrap() })
        })
        .collect();
    for h in handles {
        assert_eq!(h.await.unwrap().points_awarded, Some(10));
    }

    for user in users {
        let profile = kindred.get_profile(user).await.unwrap();
        assert_eq!(profile.turn_count, 5, "{user}");
        assert_eq!(profile.user.points, 50, "{user}");
        assert_eq!(profile.user.streak, 1, "{user}");
    }

    let board = kindred.leaderboard().await.unwrap();
    assert_eq!(board.len(), users.len());
    assert!(board.iter().all(|e| e.points == 50));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_purchases_charge_once() {
    let clock = Arc::new(FixedClock::new(helpers::day(1)));
    let kindred = Arc::new(helpers::service(helpers::ScriptedProvider::new("ok"), clock));
    kindred.admin_add_points("eli", 120, helpers::ADMIN_SECRET).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let k = Arc::clone(&kindred);
            tokio::spawn(async move { k.purchase("eli", "golden_frame").await.unwrap() })
        })
        .collect();

    let mut charged = 0;
    for h in handles {
        let outcome = h.await.unwrap();
        charged += outcome.charged;
        if !outcome.already_owned {
            assert_eq!(outcome.charged, 50);
        }
    }
    assert_eq!(charged, 50);

    let profile = kindred.get_profile("eli").await.unwrap();
    assert_eq!(profile.user.points, 70);
    assert!(profile.user.inventory.contains("golden_frame"));
    assert_eq!(kindred.leaderboard().await.unwrap()[0].points, 70);
}
