//! Reactive controller
//!
//! One [`Controller`] per document. [`Controller::start`] fetches the
//! mapping, tags the page kind, runs the initial pass and spawns an event
//! loop that multiplexes:
//!
//! - store change notifications
//! - document mutations whose text holds an identifier
//! - navigation transitions
//! - a periodic safety re-scan (only while the mapping is non-empty)
//!
//! Every trigger goes through the single-slot debounce scheduler, so a burst
//! becomes one pass. Passes hold the document lock from start to finish.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::logging::{fields, PassLog};
use crate::navigation::{LocationPoller, NavigationObserver};
use crate::scheduler::{PassPlan, PendingSlot, Trigger};
use crate::state_machine::{validate_transition, ControllerState};
use idlabel_annotate::markers::tag_page_kind;
use idlabel_annotate::{Annotator, PassReport};
use idlabel_core::identifier::contains_identifier;
use idlabel_core::{LabelMap, LabelStore};
use idlabel_dom::{DocumentTree, MutationKind, MutationRecord, Scope};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Document shared between host and controller
pub type SharedDocument<D> = Arc<Mutex<D>>;

/// Reactive annotation controller
pub struct Controller<D> {
    document: SharedDocument<D>,
    store: Arc<dyn LabelStore>,
    annotator: Arc<Annotator>,
    config: EngineConfig,
    state: Arc<watch::Sender<ControllerState>>,
    pass_log: Arc<PassLog>,
    navigation: Option<Box<dyn NavigationObserver>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl<D> Controller<D>
where
    D: DocumentTree + Send + 'static,
{
    /// Controller for `document` fed by `store`
    ///
    /// # Errors
    /// [`EngineError::Config`] when the configuration does not validate
    pub fn new(
        document: SharedDocument<D>,
        store: Arc<dyn LabelStore>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;
        let annotator = Annotator::new(config.classifier()?);
        let (state, _) = watch::channel(ControllerState::Uninitialized);
        Ok(Self {
            document,
            store,
            annotator: Arc::new(annotator),
            config,
            state: Arc::new(state),
            pass_log: Arc::new(PassLog::new()),
            navigation: None,
            shutdown: None,
            task: None,
        })
    }

    /// Use a native navigation event source instead of location polling
    #[must_use]
    pub fn with_navigation_observer(mut self, observer: Box<dyn NavigationObserver>) -> Self {
        self.navigation = Some(observer);
        self
    }

    /// Initialize and spawn the event loop
    ///
    /// An initialization failure is logged and leaves the controller
    /// [`ControllerState::Uninitialized`]; the loop still runs and retries
    /// on the next trigger.
    ///
    /// # Errors
    /// [`EngineError::AlreadyStarted`] on a second call
    pub async fn start(&mut self) -> EngineResult<()> {
        if self.task.is_some() || *self.state.borrow() == ControllerState::Stopped {
            return Err(EngineError::AlreadyStarted);
        }

        let mutations = self.document.lock().observe();
        let navigation: Box<dyn NavigationObserver> = match self.navigation.take() {
            Some(observer) => observer,
            None => Box::new(LocationPoller::new(
                Arc::clone(&self.document),
                self.config.navigation_poll(),
            )),
        };
        info!(
            component = "controller",
            navigation = navigation.kind(),
            "starting"
        );

        let mut runner = Runner {
            document: Arc::clone(&self.document),
            store: Arc::clone(&self.store),
            annotator: Arc::clone(&self.annotator),
            state: Arc::clone(&self.state),
            pass_log: Arc::clone(&self.pass_log),
            cache: LabelMap::new(),
            slot: PendingSlot::new(self.config.debounce()),
            safety_interval: self.config.safety_interval(),
            mutations,
            changes: None,
            navigation,
        };
        if let Err(error) = runner.initialize().await {
            error!(component = "controller", %error, "initialization failed; annotation disabled");
        }

        let (shutdown, signal) = oneshot::channel();
        self.shutdown = Some(shutdown);
        self.task = Some(tokio::spawn(runner.run(signal)));
        Ok(())
    }

    /// Stop the event loop and wait for it to finish
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                warn!(component = "controller", %error, "event loop ended abnormally");
            }
        }
        transition(&self.state, ControllerState::Stopped);
        info!(component = "controller", "stopped");
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }

    /// Watch state changes
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    /// Pass history
    #[must_use]
    pub fn pass_log(&self) -> Arc<PassLog> {
        Arc::clone(&self.pass_log)
    }

    /// Shared document
    #[must_use]
    pub fn document(&self) -> SharedDocument<D> {
        Arc::clone(&self.document)
    }

    /// Whether the event loop is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl<D> Drop for Controller<D> {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl<D> std::fmt::Debug for Controller<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &*self.state.borrow())
            .field("config", &self.config)
            .field("passes", &self.pass_log.len())
            .finish_non_exhaustive()
    }
}

/// Apply a validated transition; illegal ones are logged and ignored
fn transition(state: &watch::Sender<ControllerState>, to: ControllerState) -> bool {
    let from = *state.borrow();
    if from == to {
        return true;
    }
    match validate_transition(from, to) {
        Ok(()) => {
            state.send_replace(to);
            debug!(%from, %to, "state transition");
            true
        }
        Err(error) => {
            warn!(%error, "state transition rejected");
            false
        }
    }
}

/// Whether a mutation record should trigger a pass
pub fn is_relevant_mutation(record: &MutationRecord) -> bool {
    matches!(
        record.kind,
        MutationKind::ChildAdded | MutationKind::TextChanged
    ) && contains_identifier(&record.text)
}

/// Event loop state, owned by the spawned task
struct Runner<D> {
    document: SharedDocument<D>,
    store: Arc<dyn LabelStore>,
    annotator: Arc<Annotator>,
    state: Arc<watch::Sender<ControllerState>>,
    pass_log: Arc<PassLog>,
    cache: LabelMap,
    slot: PendingSlot,
    safety_interval: Duration,
    mutations: mpsc::UnboundedReceiver<MutationRecord>,
    changes: Option<broadcast::Receiver<LabelMap>>,
    navigation: Box<dyn NavigationObserver>,
}

impl<D> Runner<D>
where
    D: DocumentTree + Send + 'static,
{
    fn current_state(&self) -> ControllerState {
        *self.state.borrow()
    }

    /// Subscribe, fetch the mapping, tag the page and run the first pass
    async fn initialize(&mut self) -> EngineResult<()> {
        if self.changes.is_none() {
            self.changes = Some(self.store.subscribe().map_err(EngineError::Initialization)?);
        }
        let mapping = self
            .store
            .get_all()
            .await
            .map_err(EngineError::Initialization)?;
        self.cache = mapping;

        let report = {
            let document = Arc::clone(&self.document);
            let mut doc = document.lock();
            let report = self.run_pass(&mut *doc, PassPlan::from_trigger(Trigger::Initial));
            self.drain_mutations();
            report
        };
        self.pass_log.append(vec![Trigger::Initial], report);

        transition(&self.state, ControllerState::Ready);
        info!(component = "controller", entries = self.cache.len(), "initialized");
        Ok(())
    }

    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let start = Instant::now() + self.safety_interval;
        let mut safety = interval_at(start, self.safety_interval);
        safety.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.slot.deadline();
            tokio::select! {
                _ = &mut shutdown => break,
                change = next_change(&mut self.changes) => self.on_change(change).await,
                Some(record) = self.mutations.recv() => {
                    if is_relevant_mutation(&record) {
                        debug!(node = %record.target, "identifier mutation");
                        self.slot.schedule(PassPlan::from_trigger(Trigger::Mutation));
                    }
                }
                Some(location) = self.navigation.next_navigation() => {
                    debug!(%location, "navigation");
                    self.slot.schedule(PassPlan::from_trigger(Trigger::Navigation));
                }
                _ = safety.tick() => {
                    if !self.cache.is_empty() {
                        self.slot.schedule(PassPlan::from_trigger(Trigger::SafetyTimer));
                    }
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(plan) = self.slot.take() {
                        self.execute(plan).await;
                    }
                }
            }
        }
        debug!(component = "controller", "event loop finished");
    }

    async fn on_change(&mut self, change: Result<LabelMap, broadcast::error::RecvError>) {
        match change {
            Ok(mapping) => {
                debug!(entries = mapping.len(), "mapping changed");
                self.slot.schedule(PassPlan::mapping_changed(mapping));
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "missed mapping notifications; re-reading store");
                match self.store.get_all().await.map_err(EngineError::from) {
                    Ok(mapping) => self.slot.schedule(PassPlan::mapping_changed(mapping)),
                    Err(error) => warn!(%error, recoverable = error.is_recoverable(), "store read failed"),
                }
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("store notifications closed");
                self.changes = None;
            }
        }
    }

    async fn execute(&mut self, plan: PassPlan) {
        if self.current_state() == ControllerState::Uninitialized {
            if let Err(error) = self.initialize().await {
                error!(component = "controller", %error, "initialization retry failed");
            }
            return;
        }
        if !transition(&self.state, ControllerState::Scanning) {
            return;
        }

        let span = tracing::debug_span!(
            "pass",
            component = "controller",
            pass = tracing::field::Empty,
            triggers = tracing::field::Empty
        );
        let _entered = span.enter();

        let triggers = plan.triggers.clone();
        let report = {
            let document = Arc::clone(&self.document);
            let mut doc = document.lock();
            let report = self.run_pass(&mut *doc, plan);
            self.drain_mutations();
            report
        };

        span.record(fields::TRIGGERS, tracing::field::debug(&triggers));
        let sequence = self.pass_log.append(triggers, report.clone());
        span.record(fields::PASS, sequence);
        debug!(
            rewritten = report.rewritten,
            cleared = report.cleared,
            failed = report.failed,
            "pass complete"
        );

        transition(&self.state, ControllerState::Idle);
        if self.cache.is_empty() {
            // Nothing left to keep applied; wait for a mapping.
            transition(&self.state, ControllerState::Ready);
        }
    }

    fn run_pass(&mut self, doc: &mut D, plan: PassPlan) -> PassReport {
        let mut report = PassReport::default();
        let root = doc.root();

        if let Some(mapping) = plan.mapping {
            report.merge(&self.annotator.clear(doc, root));
            self.annotator.restore_title(doc);
            self.cache = mapping;
        }

        let location = doc.location();
        let classifier = self.annotator.classifier();
        if plan.navigated {
            let kind = classifier.detect_page_kind(&location);
            if let Err(error) = tag_page_kind(doc, kind) {
                warn!(%error, "failed to tag page kind");
            }
            if !classifier.classify_location(&location).page_content_eligible {
                report.merge(&self.annotator.clear_scope(doc, root, Scope::PageContent));
            }
            debug!(location = %location, kind = ?kind, "location classified");
        }

        for scope in classifier.scopes(&location) {
            for scope_root in classifier.selector_set().roots(doc, scope) {
                let scoped = self
                    .annotator
                    .annotate_subtree(doc, scope_root, &self.cache, scope);
                report.merge(&scoped);
            }
        }
        report.title_updated |= self.annotator.update_title(doc, &self.cache);
        report
    }

    /// Discard records produced by our own rewrites
    ///
    /// Must run before the document lock of the pass is released.
    fn drain_mutations(&mut self) {
        while self.mutations.try_recv().is_ok() {}
    }
}

async fn next_change(
    changes: &mut Option<broadcast::Receiver<LabelMap>>,
) -> Result<LabelMap, broadcast::error::RecvError> {
    match changes {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
