//! Ingestion pipeline tests against a local feed server.

mod common;

use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use common::{local_rss_config, spawn_feed_server};
use gator::db::{NewUser, User, UserRepository};
use gator::rss::{
    Feed, FeedRepository, FeedStore, IngestPipeline, NewFeed, PollCycle, PostRepository,
    RssFetcher,
};
use gator::{Database, FetchError, FixedClock, GatorError};

fn cycle_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

async fn setup_db() -> (Database, User) {
    let db = Database::open_in_memory().await.unwrap();
    let user = UserRepository::new(db.pool())
        .create(&NewUser::new("kahya", cycle_time()))
        .await
        .unwrap();
    (db, user)
}

async fn add_feed(db: &Database, user: &User, name: &str, url: &str) -> Feed {
    FeedRepository::new(db.pool())
        .create_with_follow(&NewFeed::new(name, url, user.id, cycle_time()))
        .await
        .unwrap()
        .0
}

fn fetcher() -> RssFetcher {
    RssFetcher::new(&local_rss_config()).unwrap()
}

#[tokio::test]
async fn test_cycle_ingests_feed() {
    let addr = spawn_feed_server().await;
    let (db, user) = setup_db().await;
    let feed = add_feed(&db, &user, "Blog", &format!("http://{addr}/feed.xml")).await;

    let pipeline = IngestPipeline::new(&db, fetcher(), FixedClock(cycle_time()));
    let report = pipeline.run_cycle(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.feed.id, feed.id);
    assert_eq!(report.inserted, 2);

    let posts = db.posts_for_feeds(&[feed.id], 10).await.unwrap();
    assert_eq!(posts.len(), 2);

    let second = &posts[0].post;
    assert_eq!(second.title, "Second");
    assert_eq!(
        second.published_at,
        Utc.with_ymd_and_hms(2006, 1, 3, 10, 0, 0).unwrap()
    );
    assert!(second.description.is_none());

    let hello = &posts[1].post;
    assert_eq!(hello.url, "https://blog.example.com/hello");
    assert_eq!(
        hello.published_at,
        Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap()
    );
    assert_eq!(hello.description.as_deref(), Some("<b>Hi</b> & bye"));
    assert_eq!(hello.created_at, cycle_time());
}

#[tokio::test]
async fn test_repeated_cycles_do_not_duplicate() {
    let addr = spawn_feed_server().await;
    let (db, user) = setup_db().await;
    let feed = add_feed(&db, &user, "Blog", &format!("http://{addr}/feed.xml")).await;

    let pipeline = IngestPipeline::new(&db, fetcher(), FixedClock(cycle_time()));
    pipeline.run_cycle(&CancellationToken::new()).await.unwrap();
    let report = pipeline.run_cycle(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.duplicates, 2);
    assert_eq!(
        PostRepository::new(db.pool())
            .count_for_feed(feed.id)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_same_post_in_two_feeds_is_stored_once() {
    let addr = spawn_feed_server().await;
    let (db, user) = setup_db().await;
    add_feed(&db, &user, "One", &format!("http://{addr}/feed.xml")).await;
    add_feed(&db, &user, "Two", &format!("http://{addr}/feed.xml?mirror")).await;

    let pipeline = IngestPipeline::new(&db, fetcher(), FixedClock(cycle_time()));
    let first = pipeline.run_cycle(&CancellationToken::new()).await.unwrap();
    let second = pipeline.run_cycle(&CancellationToken::new()).await.unwrap();

    assert_ne!(first.feed.id, second.feed.id);
    assert_eq!(first.inserted + second.inserted, 2);
    assert_eq!(second.duplicates, 2);
}

#[tokio::test]
async fn test_parse_error_marks_feed_without_posts() {
    let addr = spawn_feed_server().await;
    let (db, user) = setup_db().await;
    let feed = add_feed(&db, &user, "Broken", &format!("http://{addr}/broken.xml")).await;

    let pipeline = IngestPipeline::new(&db, fetcher(), FixedClock(cycle_time()));
    let result = pipeline.run_cycle(&CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(GatorError::Fetch(FetchError::Parse(_)))
    ));
    let stored = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.last_fetched_at, Some(cycle_time()));
    assert_eq!(
        PostRepository::new(db.pool())
            .count_for_feed(feed.id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_http_error_is_reported() {
    let addr = spawn_feed_server().await;
    let (db, user) = setup_db().await;
    add_feed(&db, &user, "Gone", &format!("http://{addr}/missing.xml")).await;

    let pipeline = IngestPipeline::new(&db, fetcher(), FixedClock(cycle_time()));
    let result = pipeline.run_cycle(&CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(GatorError::Fetch(FetchError::HttpStatus(404)))
    ));
}

#[tokio::test]
async fn test_failing_feed_does_not_block_rotation() {
    let addr = spawn_feed_server().await;
    let (db, user) = setup_db().await;
    let broken = add_feed(&db, &user, "Broken", &format!("http://{addr}/broken.xml")).await;
    let good = add_feed(&db, &user, "Good", &format!("http://{addr}/feed.xml")).await;
    let feeds = FeedRepository::new(db.pool());
    // Broken is due first.
    feeds
        .mark_fetched(good.id, cycle_time(), cycle_time())
        .await
        .unwrap();

    let later = cycle_time() + chrono::Duration::minutes(1);
    let pipeline = IngestPipeline::new(&db, fetcher(), FixedClock(later));
    assert!(pipeline.run_cycle(&CancellationToken::new()).await.is_err());

    let report = pipeline.run_cycle(&CancellationToken::new()).await.unwrap();
    assert_eq!(report.feed.id, good.id);
    assert_eq!(report.inserted, 2);

    let broken = feeds.get_by_id(broken.id).await.unwrap().unwrap();
    assert_eq!(broken.last_fetched_at, Some(later));
}

#[tokio::test]
async fn test_no_feeds_available() {
    let (db, _user) = setup_db().await;

    let pipeline = IngestPipeline::new(&db, fetcher(), FixedClock(cycle_time()));
    let result = pipeline.run_cycle(&CancellationToken::new()).await;

    assert!(matches!(result, Err(GatorError::NoFeedsAvailable)));
}
