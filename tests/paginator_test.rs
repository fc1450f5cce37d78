use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Semaphore;

use spacetraveling::client::ContentSource;
use spacetraveling::models::{Page, PostDocument, PostSummary};
use spacetraveling::paginator::{LoadOutcome, Paginator};

/// In-memory listing: the first page plus pages keyed by cursor
struct FakeSource {
    first: Page,
    pages: HashMap<String, Page>,
    fetches: AtomicUsize,
    // When set, `page_at` waits for a permit before answering
    gate: Option<Semaphore>,
}

impl FakeSource {
    fn new(first: Page, pages: Vec<(&str, Page)>) -> Self {
        Self {
            first,
            pages: pages.into_iter().map(|(c, p)| (c.to_string(), p)).collect(),
            fetches: AtomicUsize::new(0),
            gate: None,
        }
    }

    fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn first_page(&self, _page_size: u32) -> Result<Page> {
        Ok(self.first.clone())
    }

    async fn page_at(&self, cursor: &str) -> Result<Page> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        self.pages
            .get(cursor)
            .cloned()
            .ok_or_else(|| anyhow!("no page at {}", cursor))
    }

    async fn post_by_uid(&self, _uid: &str) -> Result<Option<PostDocument>> {
        Ok(None)
    }
}

fn post(uid: &str) -> PostSummary {
    PostSummary {
        uid: Some(uid.to_string()),
        first_publication_date: None,
        title: format!("Post {}", uid),
        subtitle: "subtitle".to_string(),
        author: "Joseph Oliveira".to_string(),
    }
}

fn page(uids: &[&str], next: Option<&str>) -> Page {
    Page {
        items: uids.iter().map(|u| post(u)).collect(),
        next_cursor: next.map(String::from),
    }
}

fn uids(paginator: &Paginator<FakeSource>) -> Vec<String> {
    paginator
        .snapshot()
        .items()
        .iter()
        .filter_map(|p| p.uid.clone())
        .collect()
}

fn three_pages() -> FakeSource {
    FakeSource::new(
        page(&["a", "b"], Some("page2")),
        vec![
            ("page2", page(&["c"], Some("page3"))),
            ("page3", page(&["d", "e"], None)),
        ],
    )
}

#[tokio::test]
async fn test_load_more_until_exhausted() {
    let source = Arc::new(three_pages());
    let paginator = Paginator::start(source.clone(), 2).await.unwrap();
    assert!(paginator.has_more());

    assert_eq!(paginator.load_more().await.unwrap(), LoadOutcome::Appended { added: 1 });
    assert_eq!(paginator.load_more().await.unwrap(), LoadOutcome::Appended { added: 2 });
    assert!(!paginator.has_more());
    assert_eq!(uids(&paginator), vec!["a", "b", "c", "d", "e"]);

    // Nothing is fetched once the cursor is gone
    assert_eq!(paginator.load_more().await.unwrap(), LoadOutcome::Exhausted);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_load_all_enumerates_every_post() {
    let source = Arc::new(three_pages());
    let paginator = Paginator::start(source, 2).await.unwrap();

    assert_eq!(paginator.load_all().await.unwrap(), 2);
    assert_eq!(paginator.snapshot().len(), 5);
}

#[tokio::test]
async fn test_second_load_is_rejected_while_first_is_in_flight() {
    let source = Arc::new(three_pages().gated());
    let paginator = Paginator::start(source.clone(), 2).await.unwrap();

    let first = paginator.load_more();
    let second = async {
        let outcome = paginator.load_more().await;
        source.release();
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), LoadOutcome::Appended { added: 1 });
    assert_eq!(second.unwrap(), LoadOutcome::Busy);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(uids(&paginator), vec!["a", "b", "c"]);

    // The flag is released once the first load lands
    source.release();
    assert_eq!(paginator.load_more().await.unwrap(), LoadOutcome::Appended { added: 2 });
}

#[tokio::test]
async fn test_page_landing_after_close_is_discarded() {
    let source = Arc::new(three_pages().gated());
    let paginator = Paginator::start(source.clone(), 2).await.unwrap();

    let load = paginator.load_more();
    let teardown = async {
        paginator.close();
        source.release();
    };
    let (outcome, _) = tokio::join!(load, teardown);

    assert_eq!(outcome.unwrap(), LoadOutcome::Discarded);
    assert_eq!(uids(&paginator), vec!["a", "b"]);
    assert!(!paginator.has_more());

    // Closed sessions do not fetch again
    assert_eq!(paginator.load_more().await.unwrap(), LoadOutcome::Discarded);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_state_and_releases_flag() {
    let source = Arc::new(FakeSource::new(page(&["a"], Some("missing")), vec![]));
    let paginator = Paginator::start(source.clone(), 1).await.unwrap();

    assert!(paginator.load_more().await.is_err());
    assert_eq!(uids(&paginator), vec!["a"]);
    assert!(paginator.has_more());

    // A retry reaches the source again instead of reporting Busy
    assert!(paginator.load_more().await.is_err());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_from_another_task_discards_landing_page() {
    let source = Arc::new(three_pages().gated());
    let paginator = Arc::new(Paginator::start(source.clone(), 2).await.unwrap());

    let load = tokio::spawn({
        let paginator = paginator.clone();
        async move { paginator.load_more().await }
    });

    // Wait until the load is parked inside the source
    while source.fetches.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    paginator.close();
    source.release();

    assert_eq!(load.await.unwrap().unwrap(), LoadOutcome::Discarded);
    assert_eq!(uids(&paginator), vec!["a", "b"]);
    assert!(paginator.is_closed());
}
