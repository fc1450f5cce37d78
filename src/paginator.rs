use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use crate::client::ContentSource;
use crate::pagination::PaginationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and appended
    Appended { added: usize },
    /// No cursor left, nothing was fetched
    Exhausted,
    /// Another load is still in flight, nothing was fetched
    Busy,
    /// The session was closed; any fetched page was dropped
    Discarded,
}

/// Drives "load more" for one listing session
/// At most one load runs at a time, and a page that arrives after
/// [`Paginator::close`] is never applied.
pub struct Paginator<S: ContentSource> {
    source: Arc<S>,
    state: Mutex<PaginationState>,
    in_flight: AtomicBool,
    closed: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: ContentSource> Paginator<S> {
    /// Opens a session from the first page of the listing
    pub async fn start(source: Arc<S>, page_size: u32) -> Result<Self> {
        let first = source.first_page(page_size).await?;
        info!(
            items = first.items.len(),
            has_more = first.next_cursor.is_some(),
            "listing session started"
        );

        Ok(Self {
            source,
            state: Mutex::new(PaginationState::new(first)),
            in_flight: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    pub fn snapshot(&self) -> PaginationState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn has_more(&self) -> bool {
        !self.is_closed() && self.state.lock().unwrap_or_else(PoisonError::into_inner).has_more()
    }

    /// Ends the session. Loads still in flight are discarded when they land.
    pub fn close(&self) {
        let _state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Fetches the page behind the current cursor and appends it
    /// Fetch errors are returned and leave the state unchanged.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        if self.is_closed() {
            return Ok(LoadOutcome::Discarded);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("load already in flight");
            return Ok(LoadOutcome::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let cursor = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.next_cursor().map(String::from)
        };
        let Some(cursor) = cursor else {
            return Ok(LoadOutcome::Exhausted);
        };

        let page = self.source.page_at(&cursor).await?;

        let added = page.items.len();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // Checked under the lock so a concurrent close() cannot slip in
        // between the check and the append
        if self.is_closed() {
            debug!(cursor = %cursor, "session closed, discarding page");
            return Ok(LoadOutcome::Discarded);
        }
        *state = state.append_page(page);
        debug!(
            added,
            total = state.len(),
            has_more = state.has_more(),
            "page appended"
        );

        Ok(LoadOutcome::Appended { added })
    }

    /// Loads pages until the listing is exhausted
    /// Returns how many pages were appended.
    pub async fn load_all(&self) -> Result<usize> {
        let mut pages = 0;
        loop {
            match self.load_more().await? {
                LoadOutcome::Appended { .. } => pages += 1,
                LoadOutcome::Exhausted | LoadOutcome::Discarded => return Ok(pages),
                LoadOutcome::Busy => return Err(anyhow!("Another load is already in flight")),
            }
        }
    }
}
