use std::collections::HashSet;
use std::sync::Arc;

use cartwise_core::domain::interaction::{InteractionAction, InteractionEvent};
use cartwise_core::domain::order::Order;
use cartwise_core::metrics::{measure_success_metrics, ShownItem};
use cartwise_core::recommend::{
    FirstN, HistoryEntry, HistoryStore, InMemoryHistoryStore, RecommendationEngine,
    RecommendationRequest, SeededRandom,
};
use cartwise_core::{FeatureStore, Platform, RecommendationBatch, ScoreBlender};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn wings_orders() -> Vec<Order> {
    vec![
        Order::new("1", ["Traditional Wings", "Ranch Dip"]),
        Order::new("2", ["Traditional Wings", "Fries"]),
        Order::new("3", ["Fries", "Soda"]),
    ]
}

fn evening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 18, 30, 0).unwrap()
}

fn wings_cart(customer: &str, platform: Platform) -> RecommendationRequest {
    RecommendationRequest::new(customer, platform).with_current_items(["Traditional Wings"])
}

fn names(batch: &RecommendationBatch) -> Vec<String> {
    batch.item_names().into_iter().map(str::to_string).collect()
}

#[test]
fn cooccurring_items_outrank_unrelated_ones() {
    let features = FeatureStore::build(&wings_orders());
    let cart = vec!["Traditional Wings".to_string()];
    let exclude: HashSet<String> = cart.iter().cloned().collect();

    let ranked = ScoreBlender::new().rank(&features, &cart, &exclude, 10);
    let position = |item: &str| ranked.iter().position(|candidate| candidate.item_name == item);

    let soda = position("Soda").expect("soda is still a popularity candidate");
    assert!(position("Ranch Dip").expect("ranch dip ranked") < soda);
    assert!(position("Fries").expect("fries ranked") < soda);
    assert!(features.cooccurrence("Traditional Wings", "Soda") == 0.0);
}

#[test]
fn item_shown_two_days_ago_is_withheld() {
    let now = evening();
    let history = Arc::new(InMemoryHistoryStore::new());
    history.append("c-42", &[HistoryEntry::new("Ranch Dip", now - Duration::days(2))]).unwrap();
    let engine = RecommendationEngine::new(FeatureStore::build(&wings_orders()))
        .with_history_store(history)
        .with_random_source(FirstN);

    let batch = engine.recommend_at(&wings_cart("c-42", Platform::Web), now).unwrap();

    assert!(!batch.item_names().contains(&"Ranch Dip"));
    assert!(batch.item_names().contains(&"Fries"));
}

#[test]
fn adoption_rate_counts_purchases_over_shown_items() {
    let shown: Vec<ShownItem> = (0..10).map(|index| ShownItem::new(format!("Item {index}"))).collect();
    let interactions = vec![InteractionEvent::new(InteractionAction::Purchase, "X"); 3];

    let metrics = measure_success_metrics(&shown, &interactions, None);

    assert!((metrics.recommendation_adoption_rate - 0.3).abs() < 1e-9);
    assert_eq!(metrics.click_through_rate, 0.0);
    assert_eq!(metrics.conversion_rate, 0.0);
}

#[test]
fn empty_metrics_input_reports_every_key_as_zero() {
    let metrics = measure_success_metrics(&[], &[], None);
    let report = metrics.to_map();

    assert_eq!(report.len(), 9);
    assert!(report.values().all(|value| *value == 0.0));
}

#[test]
fn list_length_respects_platform_target_and_ranks_are_contiguous() {
    let engine = RecommendationEngine::new(FeatureStore::build(&wings_orders()))
        .with_random_source(SeededRandom::new(3));

    for (customer, platform, limit) in
        [("app-user", Platform::App, 3), ("web-user", Platform::Web, 5), ("kiosk-user", Platform::Kiosk, 3)]
    {
        let batch = engine.recommend_at(&wings_cart(customer, platform), evening()).unwrap();

        assert!(batch.len() <= limit, "{platform} returned {} items", batch.len());
        let ranks: Vec<usize> = batch.recommendations.iter().map(|rec| rec.rank).collect();
        assert_eq!(ranks, (1..=batch.len()).collect::<Vec<_>>());
    }

    let short = wings_cart("custom", Platform::Web).with_target_count(2);
    assert_eq!(engine.recommend_at(&short, evening()).unwrap().len(), 2);
}

#[test]
fn same_seed_replays_the_same_list() {
    let build = || {
        RecommendationEngine::new(FeatureStore::build(&wings_orders()))
            .with_random_source(SeededRandom::new(2024))
    };

    let first = build().recommend_at(&wings_cart("c-7", Platform::Web), evening()).unwrap();
    let second = build().recommend_at(&wings_cart("c-7", Platform::Web), evening()).unwrap();

    assert_eq!(names(&first), names(&second));
    assert_ne!(first.request_id, second.request_id);
}

#[test]
fn consecutive_sessions_rotate_items() {
    let engine = RecommendationEngine::new(FeatureStore::build(&wings_orders()))
        .with_random_source(FirstN);
    let request = wings_cart("regular", Platform::Web);
    let start = evening();

    let sessions: Vec<Vec<String>> = (0..3)
        .map(|hour| names(&engine.recommend_at(&request, start + Duration::hours(hour)).unwrap()))
        .collect();

    assert_ne!(sessions[0], sessions[1]);
    assert_ne!(sessions[1], sessions[2]);
    let first: HashSet<&String> = sessions[0].iter().collect();
    assert!(sessions[1].iter().all(|item| !first.contains(item)));
}

#[test]
fn fresh_candidates_are_used_before_recent_fallback_items() {
    let orders: Vec<Order> = (0..20)
        .map(|index| {
            Order::new(index.to_string(), ["Traditional Wings".to_string(), format!("Side Salad {index}")])
        })
        .collect();
    let engine = RecommendationEngine::new(FeatureStore::build(&orders)).with_random_source(FirstN);
    let request = wings_cart("salad-fan", Platform::Web);
    let start = evening();

    let mut seen: HashSet<String> = HashSet::new();
    for hour in 0..5 {
        let session = names(&engine.recommend_at(&request, start + Duration::hours(hour)).unwrap());
        assert_eq!(session.len(), 5, "session {hour} came back short: {session:?}");
        let repeats: Vec<&String> = session.iter().filter(|item| seen.contains(*item)).collect();
        assert!(repeats.is_empty(), "session {hour} repeated {repeats:?}");
        seen.extend(session);
    }
}

#[test]
fn concurrent_calls_for_one_customer_keep_every_history_entry() {
    let history = Arc::new(InMemoryHistoryStore::new());
    let engine = RecommendationEngine::new(FeatureStore::build(&wings_orders()))
        .with_history_store(history.clone())
        .with_random_source(SeededRandom::new(11));
    let request = wings_cart("shared", Platform::Web);
    let now = evening();

    let returned: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| engine.recommend_at(&request, now).unwrap().len()))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).sum()
    });

    let stored = history.get_recent("shared", now - Duration::days(1)).unwrap();
    assert_eq!(stored.len(), returned);
}

#[test]
fn history_outside_retention_is_pruned_after_a_call() {
    let now = evening();
    let history = Arc::new(InMemoryHistoryStore::new());
    history.append("c-9", &[HistoryEntry::new("Old Favourite", now - Duration::days(45))]).unwrap();
    let engine = RecommendationEngine::new(FeatureStore::build(&wings_orders()))
        .with_history_store(history.clone())
        .with_random_source(FirstN);

    engine.recommend_at(&wings_cart("c-9", Platform::Kiosk), now).unwrap();

    let everything = history.get_recent("c-9", now - Duration::days(400)).unwrap();
    assert!(everything.iter().all(|entry| entry.item_name != "Old Favourite"));
}
