//! Gallery state and the workflows that mutate it
//!
//! [`GalleryState`] is a plain value with pure transitions ([`GalleryState::apply`]).
//! [`Gallery`] owns the state, issues requests on the tokio runtime and applies
//! their completions when the UI thread polls it. Requests are never cancelled:
//! a refresh bumps the generation counter and completions from an older
//! generation are dropped on arrival.

use crate::api::{FetchError, MemeSource};
use crate::constants::{LOAD_ERROR_MESSAGE, PAGE_SIZE, SHARE_TEXT};
use crate::platform::Platform;
use crate::types::{Meme, Phase, ShareOutcome, SharePayload};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug)]
pub enum GalleryEvent {
    InitialLoaded(Result<Vec<Meme>, FetchError>),
    LoadMoreStarted,
    /// `base_count` is the item count at the time the request was issued
    LoadMoreFinished {
        base_count: usize,
        result: Result<Vec<Meme>, FetchError>,
    },
}

impl GalleryEvent {
    fn is_success(&self) -> bool {
        match self {
            GalleryEvent::InitialLoaded(result) => result.is_ok(),
            GalleryEvent::LoadMoreFinished { result, .. } => result.is_ok(),
            GalleryEvent::LoadMoreStarted => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryState {
    items: Vec<Meme>,
    phase: Phase,
    loading_more: bool,
    error_message: Option<String>,
}

impl Default for GalleryState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            phase: Phase::Loading,
            loading_more: false,
            error_message: None,
        }
    }
}

impl GalleryState {
    pub fn items(&self) -> &[Meme] {
        &self.items
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn can_load_more(&self) -> bool {
        self.phase == Phase::Ready && !self.loading_more
    }

    /// Total count to ask upstream for on the next "load more"
    pub fn next_request_count(&self) -> usize {
        self.items.len() + PAGE_SIZE
    }

    pub fn apply(mut self, event: GalleryEvent) -> Self {
        match event {
            GalleryEvent::InitialLoaded(result) => {
                if self.phase != Phase::Loading {
                    return self;
                }
                match result {
                    Ok(memes) => {
                        self.items = memes;
                        self.phase = Phase::Ready;
                    }
                    Err(_) => {
                        self.items.clear();
                        self.phase = Phase::Error;
                        self.error_message = Some(LOAD_ERROR_MESSAGE.to_string());
                    }
                }
            }
            GalleryEvent::LoadMoreStarted => {
                if self.can_load_more() {
                    self.loading_more = true;
                }
            }
            GalleryEvent::LoadMoreFinished { base_count, result } => {
                if !self.loading_more {
                    return self;
                }
                self.loading_more = false;
                if let Ok(memes) = result {
                    self.items.extend(memes.into_iter().skip(base_count));
                }
            }
        }
        self
    }
}

// ============================================================================
// DRIVER
// ============================================================================

struct Completion {
    generation: u64,
    event: GalleryEvent,
}

pub struct Gallery {
    state: GalleryState,
    source: Arc<dyn MemeSource>,
    runtime: tokio::runtime::Handle,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    generation: u64,
    repaint: Arc<dyn Fn() + Send + Sync>,
    last_updated: Option<DateTime<Local>>,
}

impl Gallery {
    pub fn new(
        source: Arc<dyn MemeSource>,
        runtime: tokio::runtime::Handle,
        repaint: Arc<dyn Fn() + Send + Sync>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: GalleryState::default(),
            source,
            runtime,
            tx,
            rx,
            generation: 0,
            repaint,
            last_updated: None,
        }
    }

    pub fn state(&self) -> &GalleryState {
        &self.state
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn load_initial(&mut self) {
        info!(count = PAGE_SIZE, generation = self.generation, "Loading initial memes");
        self.spawn_fetch(PAGE_SIZE, GalleryEvent::InitialLoaded);
    }

    /// Returns false when a load is already in flight or the gallery isn't ready
    pub fn load_more(&mut self) -> bool {
        if !self.state.can_load_more() {
            debug!(
                phase = ?self.state.phase(),
                loading_more = self.state.is_loading_more(),
                "Load more ignored"
            );
            return false;
        }

        let base_count = self.state.items().len();
        let requested = self.state.next_request_count();
        self.transition(GalleryEvent::LoadMoreStarted);

        info!(current = base_count, requested, "Loading more memes");
        self.spawn_fetch(requested, move |result| GalleryEvent::LoadMoreFinished {
            base_count,
            result,
        });
        true
    }

    /// Discards all state and starts over. In-flight requests keep running;
    /// their results are ignored when they arrive.
    pub fn refresh(&mut self) {
        self.generation += 1;
        self.state = GalleryState::default();
        self.last_updated = None;
        info!(generation = self.generation, "Gallery reset");
        self.load_initial();
    }

    /// Applies every completion that has arrived. Returns true if any was applied.
    pub fn poll(&mut self) -> bool {
        let mut applied = false;
        while let Ok(completion) = self.rx.try_recv() {
            applied |= self.handle_completion(completion);
        }
        applied
    }

    fn handle_completion(&mut self, completion: Completion) -> bool {
        if completion.generation != self.generation {
            debug!(
                stale = completion.generation,
                current = self.generation,
                "Dropping completion from a previous gallery"
            );
            return false;
        }

        match &completion.event {
            GalleryEvent::InitialLoaded(Ok(memes)) => {
                info!(count = memes.len(), "Initial memes loaded");
            }
            GalleryEvent::InitialLoaded(Err(e)) => {
                warn!(error = %e, "Initial load failed");
            }
            GalleryEvent::LoadMoreFinished {
                base_count,
                result: Ok(memes),
            } => {
                info!(
                    received = memes.len(),
                    appended = memes.len().saturating_sub(*base_count),
                    "More memes loaded"
                );
            }
            GalleryEvent::LoadMoreFinished { result: Err(e), .. } => {
                warn!(error = %e, "Load more failed, keeping current items");
            }
            GalleryEvent::LoadMoreStarted => {}
        }

        if completion.event.is_success() {
            self.last_updated = Some(Local::now());
        }
        self.transition(completion.event);
        true
    }

    fn transition(&mut self, event: GalleryEvent) {
        self.state = std::mem::take(&mut self.state).apply(event);
    }

    fn spawn_fetch<F>(&self, count: usize, into_event: F)
    where
        F: FnOnce(Result<Vec<Meme>, FetchError>) -> GalleryEvent + Send + 'static,
    {
        let source = self.source.clone();
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        let generation = self.generation;

        self.runtime.spawn(async move {
            let result = source.fetch(count).await;
            let completion = Completion {
                generation,
                event: into_event(result),
            };
            // Receiver only goes away with the app
            if tx.send(completion).is_ok() {
                repaint();
            }
        });
    }

    #[cfg(test)]
    async fn settle(&mut self) -> bool {
        match self.rx.recv().await {
            Some(completion) => self.handle_completion(completion),
            None => false,
        }
    }
}

// ============================================================================
// SHARING
// ============================================================================

pub fn share(platform: &dyn Platform, meme: &Meme) -> ShareOutcome {
    let payload = SharePayload {
        title: meme.caption.clone(),
        text: SHARE_TEXT.to_string(),
        url: meme.source_link.clone(),
    };

    match platform.try_share(&payload) {
        Ok(()) => ShareOutcome::Shared,
        Err(e) => {
            debug!(error = %e, "Share unavailable, opening source link instead");
            if open_source(platform, meme) {
                ShareOutcome::OpenedExternally
            } else {
                ShareOutcome::Failed
            }
        }
    }
}

pub fn open_source(platform: &dyn Platform, meme: &Meme) -> bool {
    match platform.open_external(&meme.source_link) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, url = %meme.source_link, "Failed to open source link");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMemeSource;
    use crate::platform::{MockPlatform, ShareError};
    use mockall::predicate::eq;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn memes(range: std::ops::Range<usize>) -> Vec<Meme> {
        range
            .map(|i| Meme {
                url: format!("https://i.redd.it/{i}.png"),
                caption: format!("Meme {i}"),
                source_link: format!("https://redd.it/{i}"),
            })
            .collect()
    }

    fn http_error() -> FetchError {
        FetchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn ready_with(items: Vec<Meme>) -> GalleryState {
        GalleryState::default().apply(GalleryEvent::InitialLoaded(Ok(items)))
    }

    fn gallery_with(source: MockMemeSource) -> Gallery {
        Gallery::new(
            Arc::new(source),
            tokio::runtime::Handle::current(),
            Arc::new(|| {}),
        )
    }

    // ------------------------------------------------------------------------
    // Pure transitions
    // ------------------------------------------------------------------------

    #[test]
    fn new_state_is_loading_and_empty() {
        let state = GalleryState::default();
        assert_eq!(state.phase(), Phase::Loading);
        assert!(state.items().is_empty());
        assert!(!state.is_loading_more());
        assert_eq!(state.error_message(), None);
        assert!(!state.can_load_more());
    }

    #[test]
    fn initial_success_keeps_response_order() {
        let state = ready_with(memes(0..12));
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.items(), memes(0..12).as_slice());
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn initial_failure_sets_error_and_no_items() {
        let state = GalleryState::default().apply(GalleryEvent::InitialLoaded(Err(http_error())));
        assert_eq!(state.phase(), Phase::Error);
        assert!(state.items().is_empty());
        assert_eq!(state.error_message(), Some(LOAD_ERROR_MESSAGE));
        assert!(!state.can_load_more());
    }

    #[test]
    fn second_initial_result_is_ignored() {
        let state = ready_with(memes(0..12))
            .apply(GalleryEvent::InitialLoaded(Err(http_error())));
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.items().len(), 12);
    }

    #[rstest]
    #[case(12)]
    #[case(24)]
    #[case(36)]
    fn load_more_appends_only_the_new_tail(#[case] n: usize) {
        let state = ready_with(memes(0..n)).apply(GalleryEvent::LoadMoreStarted);
        assert!(state.is_loading_more());
        assert_eq!(state.next_request_count(), n + PAGE_SIZE);

        let state = state.apply(GalleryEvent::LoadMoreFinished {
            base_count: n,
            result: Ok(memes(0..n + PAGE_SIZE)),
        });

        assert_eq!(state.items().len(), n + PAGE_SIZE);
        assert_eq!(&state.items()[..n], memes(0..n).as_slice());
        assert_eq!(&state.items()[n..], memes(n..n + PAGE_SIZE).as_slice());
        assert!(!state.is_loading_more());
        assert_eq!(state.phase(), Phase::Ready);
    }

    #[test]
    fn load_more_with_short_response_appends_what_arrived() {
        let state = ready_with(memes(0..12))
            .apply(GalleryEvent::LoadMoreStarted)
            .apply(GalleryEvent::LoadMoreFinished {
                base_count: 12,
                result: Ok(memes(0..20)),
            });

        assert_eq!(state.items().len(), 20);
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn load_more_response_shorter_than_current_appends_nothing() {
        let state = ready_with(memes(0..12))
            .apply(GalleryEvent::LoadMoreStarted)
            .apply(GalleryEvent::LoadMoreFinished {
                base_count: 12,
                result: Ok(memes(0..5)),
            });

        assert_eq!(state.items(), memes(0..12).as_slice());
        assert!(!state.is_loading_more());
    }

    #[test]
    fn load_more_keeps_existing_items_even_if_upstream_prefix_changed() {
        let mut reshuffled = memes(100..112);
        reshuffled.extend(memes(12..24));

        let state = ready_with(memes(0..12))
            .apply(GalleryEvent::LoadMoreStarted)
            .apply(GalleryEvent::LoadMoreFinished {
                base_count: 12,
                result: Ok(reshuffled),
            });

        assert_eq!(&state.items()[..12], memes(0..12).as_slice());
        assert_eq!(&state.items()[12..], memes(12..24).as_slice());
    }

    #[test]
    fn load_more_failure_leaves_items_and_clears_flag() {
        let before = ready_with(memes(0..12));
        let after = before
            .clone()
            .apply(GalleryEvent::LoadMoreStarted)
            .apply(GalleryEvent::LoadMoreFinished {
                base_count: 12,
                result: Err(http_error()),
            });

        assert_eq!(after, before);
        assert_eq!(after.phase(), Phase::Ready);
        assert!(!after.is_loading_more());
    }

    #[test]
    fn load_more_cannot_start_twice() {
        let once = ready_with(memes(0..12)).apply(GalleryEvent::LoadMoreStarted);
        let twice = once.clone().apply(GalleryEvent::LoadMoreStarted);
        assert_eq!(once, twice);
        assert!(!twice.can_load_more());
    }

    #[rstest]
    #[case::loading(GalleryState::default())]
    #[case::error(GalleryState::default().apply(GalleryEvent::InitialLoaded(Err(http_error()))))]
    fn load_more_needs_ready_phase(#[case] state: GalleryState) {
        let after = state.clone().apply(GalleryEvent::LoadMoreStarted);
        assert_eq!(after, state);
    }

    #[test]
    fn load_more_result_without_request_is_ignored() {
        let state = ready_with(memes(0..12)).apply(GalleryEvent::LoadMoreFinished {
            base_count: 12,
            result: Ok(memes(0..24)),
        });
        assert_eq!(state.items().len(), 12);
    }

    // ------------------------------------------------------------------------
    // Driver
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn load_initial_requests_one_page() {
        let mut source = MockMemeSource::new();
        source
            .expect_fetch()
            .with(eq(PAGE_SIZE))
            .times(1)
            .returning(|_| Ok(memes(0..12)));

        let mut gallery = gallery_with(source);
        gallery.load_initial();
        assert!(gallery.settle().await);

        assert_eq!(gallery.state().phase(), Phase::Ready);
        assert_eq!(gallery.state().items(), memes(0..12).as_slice());
        assert!(gallery.last_updated().is_some());
    }

    #[tokio::test]
    async fn load_initial_failure_surfaces_error() {
        let mut source = MockMemeSource::new();
        source.expect_fetch().times(1).returning(|_| Err(http_error()));

        let mut gallery = gallery_with(source);
        gallery.load_initial();
        gallery.settle().await;

        assert_eq!(gallery.state().phase(), Phase::Error);
        assert!(gallery.state().items().is_empty());
        assert!(gallery.last_updated().is_none());
    }

    #[tokio::test]
    async fn load_more_asks_for_current_count_plus_page() {
        let mut source = MockMemeSource::new();
        source
            .expect_fetch()
            .with(eq(12))
            .times(1)
            .returning(|_| Ok(memes(0..12)));
        source
            .expect_fetch()
            .with(eq(24))
            .times(1)
            .returning(|_| Ok(memes(0..24)));

        let mut gallery = gallery_with(source);
        gallery.load_initial();
        gallery.settle().await;

        assert!(gallery.load_more());
        assert!(gallery.state().is_loading_more());
        gallery.settle().await;

        assert_eq!(gallery.state().items(), memes(0..24).as_slice());
        assert!(!gallery.state().is_loading_more());
    }

    #[tokio::test]
    async fn load_more_is_single_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut source = MockMemeSource::new();
        source.expect_fetch().returning(move |count| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(memes(0..count))
        });

        let mut gallery = gallery_with(source);
        gallery.load_initial();
        gallery.settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(gallery.load_more());
        let in_flight = gallery.state().clone();
        assert!(!gallery.load_more());
        assert!(!gallery.load_more());
        assert_eq!(gallery.state(), &in_flight);

        gallery.settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(gallery.state().items().len(), 24);
    }

    #[tokio::test]
    async fn load_more_is_ignored_before_initial_load_finishes() {
        let mut source = MockMemeSource::new();
        source.expect_fetch().times(1).returning(|_| Ok(memes(0..12)));

        let mut gallery = gallery_with(source);
        gallery.load_initial();
        assert!(!gallery.load_more());
        gallery.settle().await;
        assert_eq!(gallery.state().items().len(), 12);
    }

    #[tokio::test]
    async fn load_more_failure_keeps_gallery_ready() {
        let mut source = MockMemeSource::new();
        source
            .expect_fetch()
            .with(eq(12))
            .returning(|_| Ok(memes(0..12)));
        source
            .expect_fetch()
            .with(eq(24))
            .returning(|_| Err(http_error()));

        let mut gallery = gallery_with(source);
        gallery.load_initial();
        gallery.settle().await;
        gallery.load_more();
        gallery.settle().await;

        assert_eq!(gallery.state().phase(), Phase::Ready);
        assert_eq!(gallery.state().items(), memes(0..12).as_slice());
        assert!(!gallery.state().is_loading_more());
        assert!(gallery.state().can_load_more());
    }

    #[tokio::test]
    async fn refresh_discards_results_of_the_previous_gallery() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut source = MockMemeSource::new();
        source.expect_fetch().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(http_error())
            } else {
                Ok(memes(50..62))
            }
        });

        let mut gallery = gallery_with(source);
        gallery.load_initial();
        gallery.refresh();
        assert_eq!(gallery.state().phase(), Phase::Loading);

        assert!(!gallery.settle().await);
        assert!(gallery.settle().await);

        assert_eq!(gallery.state().phase(), Phase::Ready);
        assert_eq!(gallery.state().items(), memes(50..62).as_slice());
    }

    #[tokio::test]
    async fn refresh_from_error_starts_over() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut source = MockMemeSource::new();
        source.expect_fetch().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(http_error())
            } else {
                Ok(memes(0..12))
            }
        });

        let mut gallery = gallery_with(source);
        gallery.load_initial();
        gallery.settle().await;
        assert_eq!(gallery.state().phase(), Phase::Error);

        gallery.refresh();
        gallery.settle().await;
        assert_eq!(gallery.state().phase(), Phase::Ready);
        assert_eq!(gallery.state().error_message(), None);
    }

    #[tokio::test]
    async fn poll_applies_arrived_completions() {
        let mut source = MockMemeSource::new();
        source.expect_fetch().returning(|_| Ok(memes(0..12)));

        let mut gallery = gallery_with(source);
        assert!(!gallery.poll());

        gallery.load_initial();
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if gallery.poll() {
                break;
            }
        }
        assert_eq!(gallery.state().phase(), Phase::Ready);
    }

    // ------------------------------------------------------------------------
    // Sharing
    // ------------------------------------------------------------------------

    #[test]
    fn share_uses_caption_fixed_text_and_source_link() {
        let meme = memes(0..1).remove(0);
        let mut platform = MockPlatform::new();
        platform
            .expect_try_share()
            .withf(|p| {
                p.title == "Meme 0" && p.text == SHARE_TEXT && p.url == "https://redd.it/0"
            })
            .times(1)
            .returning(|_| Ok(()));
        platform.expect_open_external().never();

        assert_eq!(share(&platform, &meme), ShareOutcome::Shared);
    }

    #[rstest]
    #[case::unavailable(ShareError::Unavailable)]
    #[case::failed(ShareError::Failed("cancelled".to_string()))]
    fn share_falls_back_to_opening_the_link_once(#[case] error: ShareError) {
        let meme = memes(3..4).remove(0);
        let mut platform = MockPlatform::new();
        let mut error = Some(error);
        platform
            .expect_try_share()
            .times(1)
            .returning(move |_| Err(error.take().unwrap_or(ShareError::Unavailable)));
        platform
            .expect_open_external()
            .withf(|url| url == "https://redd.it/3")
            .times(1)
            .returning(|_| Ok(()));

        assert_eq!(share(&platform, &meme), ShareOutcome::OpenedExternally);
    }

    #[test]
    fn share_reports_failure_when_fallback_fails() {
        let meme = memes(0..1).remove(0);
        let mut platform = MockPlatform::new();
        platform
            .expect_try_share()
            .returning(|_| Err(ShareError::Unavailable));
        platform
            .expect_open_external()
            .times(1)
            .returning(|_| Err(std::io::Error::other("no handler")));

        assert_eq!(share(&platform, &meme), ShareOutcome::Failed);
    }
}
