//! Single owner of a list view's filter state
//!
//! The controller keeps a [`FilterState`] in step with the address bar:
//!
//! - on construction the state is decoded from the current URL, with the
//!   caller's defaults filling whatever the URL leaves out
//! - every change arms a [`Debouncer`]; once the quiet period ends the URL is
//!   rebuilt and pushed through the [`Navigator`] (without scrolling)
//! - external navigation (back/forward) is fed back with
//!   [`on_url_changed`](FilterStateController::on_url_changed)
//!
//! Pushes are skipped when the built URL already matches the current one,
//! which keeps decode → encode → decode from looping.
//!
//! Every state change is also published on a `watch` channel. A list fetcher
//! can [`follow`](super::ListFetcher::follow) it, and
//! [`spawn_url_sync`](FilterStateController::spawn_url_sync) moves the
//! debounced push into a background task so nobody has to call
//! [`poll`](FilterStateController::poll).

use super::debounce::Debouncer;
use crate::codec::{SearchParams, UrlCodec};
use crate::config::ListConfig;
use crate::core::filter::{FilterCondition, SortDirective};
use crate::core::presets::FilterPreset;
use crate::core::query::{FilterState, FilterStatePatch};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Options passed along with a history push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOptions {
    pub scroll: bool,
}

/// Access to the browsing context's URL
pub trait Navigator: Send + Sync {
    /// Current path and query (`/shows?page=2`)
    fn current_url(&self) -> String;

    /// Push a new history entry
    fn push(&self, url: &str, options: NavigateOptions);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn current_url(&self) -> String {
        (**self).current_url()
    }

    fn push(&self, url: &str, options: NavigateOptions) {
        (**self).push(url, options)
    }
}

/// Construction options for [`FilterStateController`]
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Values used wherever the URL is silent
    pub defaults: FilterStatePatch,

    /// Keep the URL in sync with the state
    pub sync_with_url: bool,

    /// Path the query string is appended to; the current path when `None`
    pub base_path: Option<String>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            defaults: FilterStatePatch::default(),
            sync_with_url: true,
            base_path: None,
        }
    }
}

pub struct FilterStateController<N: Navigator> {
    navigator: N,
    codec: UrlCodec,
    allowed_limits: Vec<usize>,
    defaults: FilterState,
    state: FilterState,
    debouncer: Debouncer,
    sync_with_url: bool,
    base_path: Option<String>,
    changes: watch::Sender<FilterState>,
    url_sync_spawned: bool,
}

impl<N: Navigator> FilterStateController<N> {
    pub fn new(
        config: &ListConfig,
        defaults: FilterStatePatch,
        navigator: N,
        base_path: impl Into<String>,
    ) -> Self {
        Self::with_options(
            config,
            navigator,
            ControllerOptions {
                defaults,
                sync_with_url: true,
                base_path: Some(base_path.into()),
            },
        )
    }

    pub fn with_options(config: &ListConfig, navigator: N, options: ControllerOptions) -> Self {
        let codec = UrlCodec::new(config);
        let defaults = options
            .defaults
            .overlay(FilterState::with_limit(config.default_limit));

        let state = if options.sync_with_url {
            let params = SearchParams::from_url(&navigator.current_url());
            codec.decode_patch(&params).overlay(defaults.clone())
        } else {
            defaults.clone()
        };

        tracing::debug!(
            search = ?state.search,
            conditions = state.conditions.len(),
            page = state.page,
            limit = state.limit,
            "Initialised filter state"
        );

        let (changes, _) = watch::channel(state.clone());

        Self {
            navigator,
            codec,
            allowed_limits: config.allowed_limits.clone(),
            defaults,
            state,
            debouncer: Debouncer::new(config.debounce()),
            sync_with_url: options.sync_with_url,
            base_path: options.base_path,
            changes,
            url_sync_spawned: false,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Receiver that sees the current state and every later change
    pub fn subscribe(&self) -> watch::Receiver<FilterState> {
        self.changes.subscribe()
    }

    /// `true` while a URL update is waiting for the quiet period
    ///
    /// Always `false` once the push is handed to
    /// [`spawn_url_sync`](Self::spawn_url_sync).
    pub fn is_syncing(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// When the pending URL update is due
    pub fn sync_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Number of active search and filter conditions
    pub fn active_filter_count(&self) -> usize {
        self.state.conditions.len() + usize::from(self.state.search_term().is_some())
    }

    /// URL the current state encodes to
    pub fn url(&self) -> String {
        self.codec.build_url(&self.target_path(), &self.state)
    }

    /// Replace the whole state
    pub fn set_filter_state(&mut self, next: FilterState) {
        self.replace(next);
    }

    /// Merge a partial update; filter changes go back to page 1
    ///
    /// A page size outside the allowed set is dropped from the patch.
    pub fn update_filter_state(&mut self, mut patch: FilterStatePatch) {
        if let Some(limit) = patch.limit.filter(|l| !self.allowed_limits.contains(l)) {
            tracing::warn!(limit, allowed = ?self.allowed_limits, "Ignoring page size outside the allowed set");
            patch.limit = None;
        }
        let next = self.state.update(patch);
        self.replace(next);
    }

    /// Set the search term; a blank term clears it
    pub fn set_search(&mut self, term: &str) {
        let patch = if term.trim().is_empty() {
            FilterStatePatch::new().clear_search()
        } else {
            FilterStatePatch::new().search(term)
        };
        self.update_filter_state(patch);
    }

    pub fn set_conditions(&mut self, conditions: Vec<FilterCondition>) {
        self.update_filter_state(FilterStatePatch::new().conditions(conditions));
    }

    pub fn add_condition(&mut self, condition: FilterCondition) {
        let mut conditions = self.state.conditions.clone();
        conditions.push(condition);
        self.set_conditions(conditions);
    }

    pub fn remove_condition(&mut self, index: usize) {
        if index < self.state.conditions.len() {
            let mut conditions = self.state.conditions.clone();
            conditions.remove(index);
            self.set_conditions(conditions);
        }
    }

    pub fn set_sort(&mut self, sort: Vec<SortDirective>) {
        self.update_filter_state(FilterStatePatch::new().sort(sort));
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.update_filter_state(FilterStatePatch::new().page(page.max(1)));
    }

    /// Change the page size; sizes outside the allowed set are ignored
    pub fn set_limit(&mut self, limit: usize) {
        if !self.allowed_limits.contains(&limit) {
            tracing::warn!(limit, allowed = ?self.allowed_limits, "Ignoring page size outside the allowed set");
            return;
        }
        self.update_filter_state(FilterStatePatch::new().limit(limit));
    }

    /// Swap in a preset's search, conditions and sort on page 1
    pub fn apply_preset(&mut self, preset: &FilterPreset) {
        tracing::debug!(preset = %preset.id, "Applying filter preset");
        let next = FilterState {
            search: preset.filters.search.clone(),
            conditions: preset.filters.conditions.clone(),
            sort: preset.filters.sort.clone(),
            page: 1,
            limit: self.state.limit,
        };
        self.replace(next);
    }

    /// Back to the defaults, keeping the current page size
    pub fn reset_filters(&mut self) {
        let next = FilterState {
            limit: self.state.limit,
            ..self.defaults.clone()
        };
        self.replace(next);
    }

    /// React to navigation the controller did not cause
    ///
    /// Returns `true` when the state changed.
    pub fn on_url_changed(&mut self, params: &SearchParams) -> bool {
        if !self.sync_with_url {
            return false;
        }

        let next = self.codec.decode_patch(params).overlay(self.defaults.clone());
        if next == self.state {
            return false;
        }

        tracing::debug!(page = next.page, "Filter state restored from URL");
        self.state = next;
        // The URL already describes the new state
        self.debouncer.cancel();
        self.changes.send_replace(self.state.clone());
        true
    }

    /// Push the URL if the quiet period is over; `true` when a push happened
    pub fn poll(&mut self) -> bool {
        if self.debouncer.fire_if_due(Instant::now()) {
            self.sync_url()
        } else {
            false
        }
    }

    /// Wait out the pending quiet period, then sync
    pub async fn settle(&mut self) -> bool {
        if !self.debouncer.is_pending() {
            return false;
        }
        self.debouncer.wait().await;
        self.poll()
    }

    fn replace(&mut self, mut next: FilterState) {
        if !self.allowed_limits.contains(&next.limit) {
            tracing::warn!(limit = next.limit, allowed = ?self.allowed_limits, "Ignoring page size outside the allowed set");
            next.limit = self.state.limit;
        }
        next.page = next.page.max(1);

        if next == self.state {
            return;
        }
        self.state = next;
        if self.sync_with_url && !self.url_sync_spawned {
            self.debouncer.arm();
        }
        self.changes.send_replace(self.state.clone());
    }

    fn sync_url(&self) -> bool {
        push_state(&self.navigator, &self.codec, self.base_path.as_deref(), &self.state)
    }

    fn target_path(&self) -> String {
        match &self.base_path {
            Some(base) => base.clone(),
            None => path_of(&self.navigator.current_url()).to_string(),
        }
    }
}

impl<N: Navigator + Clone + 'static> FilterStateController<N> {
    /// Hand the debounced URL push to a background task
    ///
    /// The task restarts the quiet period on every published change and pushes
    /// the latest state once it ends. [`poll`](Self::poll) and
    /// [`settle`](Self::settle) become no-ops. The task ends, flushing a
    /// pending push, when the controller is dropped. Returns `None` for a
    /// controller that does not sync with the URL or already has a task.
    pub fn spawn_url_sync(&mut self) -> Option<JoinHandle<()>> {
        if !self.sync_with_url || self.url_sync_spawned {
            return None;
        }
        self.url_sync_spawned = true;

        let mut debouncer = self.debouncer.clone();
        if debouncer.is_pending() {
            self.debouncer.cancel();
        }
        let mut changes = self.changes.subscribe();
        let navigator = self.navigator.clone();
        let codec = self.codec.clone();
        let base_path = self.base_path.clone();

        Some(tokio::spawn(async move {
            loop {
                let deadline = debouncer.deadline();
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        debouncer.arm();
                    }
                    _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                        debouncer.cancel();
                        let state = changes.borrow_and_update().clone();
                        push_state(&navigator, &codec, base_path.as_deref(), &state);
                    }
                }
            }

            if debouncer.is_pending() {
                let state = changes.borrow().clone();
                push_state(&navigator, &codec, base_path.as_deref(), &state);
            }
            tracing::debug!("URL sync task finished");
        }))
    }
}

/// Push `state` unless the navigator already shows its URL
fn push_state<N: Navigator>(navigator: &N, codec: &UrlCodec, base_path: Option<&str>, state: &FilterState) -> bool {
    let current = navigator.current_url();
    let base = base_path.unwrap_or_else(|| path_of(&current));
    let url = codec.build_url(base, state);

    if url == current {
        tracing::debug!(url = %url, "URL already up to date");
        return false;
    }

    tracing::debug!(url = %url, "Pushing filter state to URL");
    navigator.push(&url, NavigateOptions { scroll: false });
    true
}

fn path_of(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Duration;

    #[derive(Default)]
    struct RecordingNavigator {
        url: Mutex<String>,
        pushes: Mutex<Vec<(String, NavigateOptions)>>,
    }

    impl RecordingNavigator {
        fn at(url: &str) -> Arc<Self> {
            Arc::new(Self {
                url: Mutex::new(url.to_string()),
                pushes: Mutex::default(),
            })
        }

        fn pushes(&self) -> Vec<String> {
            self.pushes.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
        }
    }

    impl Navigator for RecordingNavigator {
        fn current_url(&self) -> String {
            self.url.lock().unwrap().clone()
        }

        fn push(&self, url: &str, options: NavigateOptions) {
            *self.url.lock().unwrap() = url.to_string();
            self.pushes.lock().unwrap().push((url.to_string(), options));
        }
    }

    fn controller(url: &str) -> (FilterStateController<Arc<RecordingNavigator>>, Arc<RecordingNavigator>) {
        let nav = RecordingNavigator::at(url);
        let ctrl = FilterStateController::new(
            &ListConfig::default(),
            FilterStatePatch::new(),
            nav.clone(),
            "/shows",
        );
        (ctrl, nav)
    }

    #[test]
    fn test_initial_state_from_url() {
        let (ctrl, _) = controller("/shows?search=jazz&page=3");
        assert_eq!(ctrl.state().search.as_deref(), Some("jazz"));
        assert_eq!(ctrl.state().page, 3);
        assert_eq!(ctrl.state().limit, 20);
        assert!(!ctrl.is_syncing());
    }

    #[test]
    fn test_defaults_fill_what_the_url_leaves_out() {
        let nav = RecordingNavigator::at("/arrangements?page=2");
        let config = ListConfig::default().with_default_limit(12);
        let defaults = FilterStatePatch::new()
            .limit(12)
            .sort(vec![SortDirective::asc("title")]);
        let ctrl = FilterStateController::new(&config, defaults, nav, "/arrangements");

        assert_eq!(ctrl.state().page, 2);
        assert_eq!(ctrl.state().limit, 12);
        assert_eq!(ctrl.state().sort, vec![SortDirective::asc("title")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_changes_pushes_once() {
        let (mut ctrl, nav) = controller("/shows");
        ctrl.set_search("j");
        tokio::time::advance(Duration::from_millis(100)).await;
        ctrl.set_search("ja");
        tokio::time::advance(Duration::from_millis(100)).await;
        ctrl.set_search("jazz");
        assert!(!ctrl.poll());

        tokio::time::advance(Duration::from_millis(299)).await;
        assert!(!ctrl.poll());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(ctrl.poll());

        assert_eq!(nav.pushes(), vec!["/shows?search=jazz".to_string()]);
        assert!(!ctrl.is_syncing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_does_not_scroll() {
        let (mut ctrl, nav) = controller("/shows");
        ctrl.go_to_page(2);
        assert!(ctrl.settle().await);
        let (_, options) = nav.pushes.lock().unwrap()[0].clone();
        assert_eq!(options, NavigateOptions { scroll: false });
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_url_is_not_pushed() {
        let (mut ctrl, nav) = controller("/shows?page=2");
        ctrl.go_to_page(3);
        ctrl.go_to_page(2);
        assert!(!ctrl.settle().await);
        assert!(nav.pushes().is_empty());
    }

    #[test]
    fn test_filter_change_resets_page() {
        let (mut ctrl, _) = controller("/shows?page=4");
        ctrl.add_condition(FilterCondition::equals("difficulty", "Advanced"));
        assert_eq!(ctrl.state().page, 1);
    }

    #[test]
    fn test_sort_change_keeps_page() {
        let (mut ctrl, _) = controller("/shows?page=4");
        ctrl.set_sort(vec![SortDirective::desc("year")]);
        assert_eq!(ctrl.state().page, 4);
    }

    #[test]
    fn test_limit_outside_allowed_set_is_ignored() {
        let (mut ctrl, _) = controller("/shows");
        ctrl.set_limit(7);
        assert_eq!(ctrl.state().limit, 20);
        assert!(!ctrl.is_syncing());
    }

    #[test]
    fn test_disallowed_limit_never_reaches_the_state() {
        let (mut ctrl, _) = controller("/shows?page=3");
        ctrl.update_filter_state(FilterStatePatch::new().limit(7));
        assert_eq!((ctrl.state().page, ctrl.state().limit), (3, 20));
        assert!(!ctrl.is_syncing());

        ctrl.set_filter_state(FilterState::with_limit(7).page(0));
        assert_eq!((ctrl.state().page, ctrl.state().limit), (1, 20));
        assert_eq!(ctrl.url(), "/shows");
    }

    #[test]
    fn test_subscribers_see_every_change() {
        let (mut ctrl, _) = controller("/shows?page=3");
        let mut changes = ctrl.subscribe();
        assert_eq!(changes.borrow().page, 3);

        ctrl.set_limit(7);
        assert!(!changes.has_changed().unwrap());

        ctrl.go_to_page(4);
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().page, 4);

        assert!(ctrl.on_url_changed(&SearchParams::parse("page=2")));
        assert_eq!(changes.borrow_and_update().page, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_url_sync_pushes_without_polling() {
        let (mut ctrl, nav) = controller("/shows");
        let task = ctrl.spawn_url_sync().unwrap();
        assert!(ctrl.spawn_url_sync().is_none());

        ctrl.set_search("j");
        tokio::time::sleep(Duration::from_millis(100)).await;
        ctrl.set_search("jazz");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(nav.pushes().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(nav.pushes(), vec!["/shows?search=jazz".to_string()]);
        assert!(!ctrl.is_syncing());
        assert!(!ctrl.settle().await);

        // Dropping the controller flushes the pending push
        ctrl.go_to_page(2);
        drop(ctrl);
        task.await.unwrap();
        assert_eq!(nav.pushes().last().map(String::as_str), Some("/shows?search=jazz&page=2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_url_sync_ignores_external_navigation() {
        let (mut ctrl, nav) = controller("/shows?page=3");
        let _task = ctrl.spawn_url_sync().unwrap();

        *nav.url.lock().unwrap() = "/shows".to_string();
        assert!(ctrl.on_url_changed(&SearchParams::parse("")));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(nav.pushes().is_empty());
    }

    #[test]
    fn test_reset_keeps_limit() {
        let (mut ctrl, _) = controller("/shows?search=jazz&limit=50&page=3");
        ctrl.reset_filters();
        assert_eq!(ctrl.state(), &FilterState::with_limit(50));
    }

    #[test]
    fn test_apply_preset_keeps_limit_and_goes_to_first_page() {
        let (mut ctrl, _) = controller("/shows?limit=10&page=5&search=x");
        let preset = FilterPreset::new("featured", "Featured")
            .condition(FilterCondition::equals("featured", true))
            .sort_by(SortDirective::asc("displayOrder"));
        ctrl.apply_preset(&preset);

        assert_eq!(ctrl.state().search, None);
        assert_eq!(ctrl.state().conditions.len(), 1);
        assert_eq!((ctrl.state().page, ctrl.state().limit), (1, 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_navigation_replaces_state_without_pushing() {
        let (mut ctrl, nav) = controller("/shows?page=3");
        assert!(ctrl.on_url_changed(&SearchParams::parse("")));
        assert_eq!(ctrl.state().page, 1);
        assert!(!ctrl.is_syncing());

        assert!(!ctrl.on_url_changed(&SearchParams::parse("page=1")));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!ctrl.poll());
        assert!(nav.pushes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_navigation_cancels_pending_sync() {
        let (mut ctrl, nav) = controller("/shows");
        ctrl.go_to_page(5);
        assert!(ctrl.is_syncing());
        assert!(ctrl.on_url_changed(&SearchParams::parse("page=2")));
        assert!(!ctrl.is_syncing());
        assert!(!ctrl.settle().await);
        assert!(nav.pushes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsynced_controller_never_touches_the_url() {
        let nav = RecordingNavigator::at("/shows?page=9");
        let mut ctrl = FilterStateController::with_options(
            &ListConfig::default(),
            nav.clone(),
            ControllerOptions {
                sync_with_url: false,
                ..ControllerOptions::default()
            },
        );
        assert_eq!(ctrl.state().page, 1);

        ctrl.set_search("brass");
        assert!(!ctrl.is_syncing());
        assert!(!ctrl.on_url_changed(&SearchParams::parse("page=4")));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!ctrl.poll());
        assert!(nav.pushes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_base_path_defaults_to_current_path() {
        let nav = RecordingNavigator::at("/arrangements?page=2");
        let mut ctrl =
            FilterStateController::with_options(&ListConfig::default(), nav.clone(), ControllerOptions::default());
        ctrl.go_to_page(3);
        assert!(ctrl.settle().await);
        assert_eq!(nav.pushes(), vec!["/arrangements?page=3".to_string()]);
    }

    #[test]
    fn test_active_filter_count() {
        let (mut ctrl, _) = controller("/shows?search=jazz");
        ctrl.add_condition(FilterCondition::equals("difficulty", "Advanced"));
        assert_eq!(ctrl.active_filter_count(), 2);
        ctrl.remove_condition(0);
        assert_eq!(ctrl.active_filter_count(), 1);
    }
}
