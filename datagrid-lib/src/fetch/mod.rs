//! Data-fetch adapter.
//!
//! [`Fetcher`] turns query parameters into page requests against a
//! [`DataSource`]. Requests run as spawned tasks and report back through a
//! channel as [`FetchCompletion`] events, which the owner feeds into
//! [`Fetcher::complete`] on its own event loop. Every request carries a
//! generation number and only the latest generation is ever committed, so a
//! slow response can never overwrite the result of a newer request.

mod http;

pub use http::*;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::model::Entity;
use crate::query::FetchedPage;
use crate::query::QueryParams;

/// A remote paginated list of entities.
#[async_trait]
pub trait DataSource<E: Entity>: Send + Sync {
    /// Fetches one page.
    async fn fetch_page(&self, params: &QueryParams) -> Result<FetchedPage<E>, ApiError>;
}

/// Result of one issued request, delivered on the completion channel.
#[derive(Debug)]
pub struct FetchCompletion<E> {
    /// Generation of the request this answers.
    pub generation: u64,
    /// Parameters the request was issued with.
    pub params: QueryParams,
    /// The page, or why it could not be fetched.
    pub result: Result<FetchedPage<E>, ApiError>,
}

/// What the presentation layer sees of the fetch.
#[derive(Debug, Clone)]
pub struct FetchState<E> {
    /// The committed page. Cleared on error.
    pub data: Option<FetchedPage<E>>,
    /// A request is in flight.
    pub is_loading: bool,
    /// Message of the last committed failure.
    pub error: Option<String>,
}

impl<E> Default for FetchState<E> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<E> FetchState<E> {
    /// Returns `true` when the last committed request failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Rows of the committed page, empty when there is none.
    pub fn rows(&self) -> &[E] {
        self.data.as_ref().map(|page| page.data.as_slice()).unwrap_or(&[])
    }

    /// Total pages reported by the committed page.
    pub fn total_pages(&self) -> u32 {
        self.data.as_ref().map(|page| page.pagination.total_pages).unwrap_or(0)
    }

    /// Total items reported by the committed page.
    pub fn total_items(&self) -> u64 {
        self.data.as_ref().map(|page| page.pagination.total_items).unwrap_or(0)
    }
}

/// Issues page requests with last-request-wins semantics.
pub struct Fetcher<E: Entity> {
    source: Arc<dyn DataSource<E>>,
    sender: mpsc::UnboundedSender<FetchCompletion<E>>,
    generation: u64,
    last_params: Option<QueryParams>,
    in_flight: Option<CancellationToken>,
    abort_superseded: bool,
    state: FetchState<E>,
}

impl<E: Entity> Fetcher<E> {
    /// Creates a fetcher and the receiving end of its completion channel.
    pub fn new(source: Arc<dyn DataSource<E>>) -> (Self, mpsc::UnboundedReceiver<FetchCompletion<E>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let fetcher = Self {
            source,
            sender,
            generation: 0,
            last_params: None,
            in_flight: None,
            abort_superseded: true,
            state: FetchState::default(),
        };
        (fetcher, receiver)
    }

    /// Whether a superseded in-flight request is aborted. Defaults to `true`.
    ///
    /// When off, the superseded request runs to completion and its result is
    /// discarded by [`complete`](Self::complete).
    pub fn with_abort_superseded(mut self, abort: bool) -> Self {
        self.abort_superseded = abort;
        self
    }

    /// Requests the page for `params`. Does nothing when `params` equal the
    /// last issued parameters. Returns whether a request was issued.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request(&mut self, params: QueryParams) -> bool {
        if self.last_params.as_ref() == Some(&params) {
            return false;
        }
        self.issue(params);
        true
    }

    /// Issues the last parameters again, e.g. after an error.
    pub fn retry(&mut self) -> bool {
        match self.last_params.clone() {
            Some(params) => {
                self.issue(params);
                true
            }
            None => false,
        }
    }

    fn issue(&mut self, params: QueryParams) {
        self.generation += 1;
        let generation = self.generation;

        if self.abort_superseded
            && let Some(token) = self.in_flight.take()
        {
            token.cancel();
        }
        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        self.last_params = Some(params.clone());
        self.state.is_loading = true;

        log::debug!("fetch #{} issued: {:?}", generation, params);

        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        let request = params.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    log::debug!("fetch #{} aborted", generation);
                }
                result = source.fetch_page(&request) => {
                    let _ = sender.send(FetchCompletion {
                        generation,
                        params,
                        result,
                    });
                }
            }
        });
    }

    /// Commits a completion if it answers the latest request. Stale
    /// completions are discarded. Returns whether the state changed.
    pub fn complete(&mut self, completion: FetchCompletion<E>) -> bool {
        if completion.generation != self.generation {
            log::debug!(
                "fetch #{} discarded, latest is #{}",
                completion.generation,
                self.generation
            );
            return false;
        }

        self.in_flight = None;
        self.state.is_loading = false;
        match completion.result {
            Ok(page) => {
                log::debug!(
                    "fetch #{} committed: {} rows, {} total",
                    completion.generation,
                    page.len(),
                    page.pagination.total_items
                );
                self.state.data = Some(page);
                self.state.error = None;
            }
            Err(e) => {
                log::warn!("fetch #{} failed: {}", completion.generation, e);
                self.state.data = None;
                self.state.error = Some(e.to_string());
            }
        }
        true
    }

    /// Current fetch state.
    pub fn state(&self) -> &FetchState<E> {
        &self.state
    }

    /// Generation of the most recently issued request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Parameters of the most recently issued request.
    pub fn last_params(&self) -> Option<&QueryParams> {
        self.last_params.as_ref()
    }
}
