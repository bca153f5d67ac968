//! Integration tests for a complete driver run.
//!
//! Runs small seeded simulations against a real engine and checks that the
//! driver's mirrors agree with what the engine holds.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;

use agora_core::config::SimulationConfig;
use agora_core::driver::{DriverError, WorkloadDriver};
use agora_core::mirror::MirroredPost;
use agora_engine::{EngineConfig, IdProviderKind, Request, Response};

fn driver(num_clients: usize, direct_message_chance: f64) -> WorkloadDriver {
    WorkloadDriver::new(
        EngineConfig {
            id_provider: IdProviderKind::Sequential,
            ..EngineConfig::default()
        },
        SimulationConfig {
            num_clients,
            direct_message_chance,
            seed: Some(2024),
            ..SimulationConfig::default()
        },
    )
}

#[tokio::test]
async fn run_populates_mirrors_consistently() {
    let driver = driver(25, 0.0);
    let report = driver.run().await.unwrap();

    assert_eq!(report.clients, 25);
    assert_eq!(report.subreddits, 7);
    assert_eq!(report.posts, 25);
    assert_eq!(report.comments, 25);
    assert_eq!(report.direct_messages, 0);

    let status = driver.status().await;
    assert_eq!(status.active_users, 25);
    assert_eq!(status.subreddits, 7);
    assert!(status.total_posts >= 1 && status.total_posts <= 7);
    assert_eq!(status.total_comments, 25);

    let subreddits = driver.subreddits().await;
    assert_eq!(subreddits.first().map(String::as_str), Some("AskReddit"));

    let posts = driver.posts().await;
    assert_eq!(posts.len(), 25);
    assert_eq!(driver.feed("user0").await.len(), 5);

    let engine = driver.engine().await.unwrap();
    for post in &posts {
        assert!(engine.karma(post.id).await.unwrap().is_some());
        assert_eq!(driver.comments(post.id).await.len(), 1);
    }

    let stats = driver.shutdown().await.unwrap().unwrap();
    assert_eq!(stats.posts, 25);
    assert_eq!(stats.comments, 25);
    assert!(!engine.is_running());
}

#[tokio::test]
async fn mirrored_direct_messages_match_engine() {
    let driver = driver(20, 1.0);
    let report = driver.run().await.unwrap();
    assert!(report.direct_messages > 0);

    let engine = driver.engine().await.unwrap();
    let mut mirrored_total = 0_usize;
    for i in 0..20 {
        let username = format!("user{i}");
        let mirrored = driver.direct_messages(&username).await;
        mirrored_total = mirrored_total.saturating_add(mirrored.len());

        let response = engine
            .request(
                Request::GetDirectMessages {
                    username: username.clone(),
                },
                &username,
            )
            .await
            .unwrap();
        let Response::DirectMessages { messages } = response else {
            panic!("unexpected {response:?}");
        };
        let engine_contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        let mirror_contents: Vec<&str> = mirrored.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(engine_contents, mirror_contents);
    }
    assert_eq!(mirrored_total, report.direct_messages);
}

#[tokio::test]
async fn background_start_is_claimed_once() {
    let driver = Arc::new(driver(3, 0.0));
    let task = driver.start_in_background().unwrap();
    assert!(matches!(
        driver.start_in_background(),
        Err(DriverError::AlreadyStarted)
    ));
    let report = task.await.unwrap().unwrap();
    assert_eq!(report.clients, 3);
}

#[tokio::test]
async fn seeded_runs_are_reproducible() {
    let first = driver(10, 0.5);
    let second = driver(10, 0.5);
    first.run().await.unwrap();
    second.run().await.unwrap();

    let titles = |posts: Vec<MirroredPost>| {
        posts
            .into_iter()
            .map(|p| (p.username, p.subreddit, p.title))
            .collect::<Vec<_>>()
    };
    assert_eq!(titles(first.posts().await), titles(second.posts().await));
}
