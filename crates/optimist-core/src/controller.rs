//! Optimistic mutation controller
//!
//! Every submit follows the same two-phase shape:
//! 1. Under the state lock: admit the mutation, apply it to the collection,
//!    capture a rollback snapshot and claim the record
//! 2. Outside the lock: issue the backend call and spawn its continuation,
//!    which reconciles by id using only the captured snapshot
//!
//! Observers learn outcomes from [`MutationController::view`] or
//! [`MutationController::subscribe`]; submits never report backend results.

use crate::backend::{FailureSwitch, TodoBackend};
use crate::config::BackendConfig;
use crate::error::{BackendError, MutationError, SubmitError};
use crate::simulated::SimulatedBackend;
use crate::types::{IdAllocator, MutationKind, NewTodo, Record, RecordId};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;

/// Presentation snapshot of the controller
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerView {
    /// Records in display order
    pub records: Vec<Record>,
    /// Most recent failed mutation, if not cleared
    pub last_error: Option<MutationError>,
    /// Current failure-mode flag
    pub failure_mode: bool,
    /// Number of unresolved backend calls
    pub in_flight: usize,
}

impl ControllerView {
    /// Look up a record by id
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Record texts in display order
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.text.as_str()).collect()
    }

    /// True when no backend call is outstanding
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.in_flight == 0
    }
}

/// Rollback data for a toggle
#[derive(Debug, Clone, Copy)]
struct ToggleSnapshot {
    prior_done: bool,
}

/// Rollback data for a delete
#[derive(Debug, Clone)]
struct DeleteSnapshot {
    record: Record,
    /// Record that followed the deleted one when it was removed
    successor: Option<RecordId>,
}

#[derive(Debug, Default)]
struct State {
    records: Vec<Record>,
    /// One entry per record with an unresolved mutation
    claims: HashMap<RecordId, MutationKind>,
    last_error: Option<MutationError>,
}

impl State {
    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn find_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Check the claim before existence so a record detached by an in-flight
    /// delete reports `InFlight` rather than `NotFound`.
    fn admit(&self, id: RecordId) -> Result<usize, SubmitError> {
        if let Some(&kind) = self.claims.get(&id) {
            return Err(SubmitError::InFlight { id, kind });
        }
        self.position(id).ok_or(SubmitError::NotFound(id))
    }

    fn fail(&mut self, kind: MutationKind, id: RecordId, source: BackendError) {
        tracing::warn!(%id, %kind, error = %source, "mutation rolled back");
        self.last_error = Some(MutationError::new(kind, id, source));
    }
}

struct Inner {
    backend: Arc<dyn TodoBackend>,
    failure: FailureSwitch,
    ids: IdAllocator,
    state: Mutex<State>,
    view: watch::Sender<ControllerView>,
}

impl Inner {
    fn publish(&self, state: &State) {
        self.view.send_replace(ControllerView {
            records: state.records.clone(),
            last_error: state.last_error.clone(),
            failure_mode: self.failure.is_on(),
            in_flight: state.claims.len(),
        });
    }

    fn settle_create(&self, id: RecordId, outcome: Result<Record, BackendError>) {
        let mut state = self.state.lock();
        state.claims.remove(&id);
        match outcome {
            Ok(stored) => {
                if let Some(record) = state.find_mut(id) {
                    record.pending = false;
                }
                tracing::debug!(%id, stored = %stored.id, "create confirmed");
            }
            Err(source) => {
                state.records.retain(|r| r.id != id);
                state.fail(MutationKind::Create, id, source);
            }
        }
        self.publish(&state);
    }

    fn settle_toggle<T>(
        &self,
        id: RecordId,
        snapshot: ToggleSnapshot,
        outcome: Result<T, BackendError>,
    ) {
        let mut state = self.state.lock();
        state.claims.remove(&id);
        let failure = outcome.err();
        if let Some(record) = state.find_mut(id) {
            record.pending = false;
            if failure.is_some() {
                record.done = snapshot.prior_done;
            }
        }
        match failure {
            Some(source) => state.fail(MutationKind::Toggle, id, source),
            None => tracing::debug!(%id, "toggle confirmed"),
        }
        self.publish(&state);
    }

    fn settle_delete<T>(&self, snapshot: DeleteSnapshot, outcome: Result<T, BackendError>) {
        let id = snapshot.record.id;
        let mut state = self.state.lock();
        state.claims.remove(&id);
        match outcome {
            Ok(_) => tracing::debug!(%id, "delete confirmed"),
            Err(source) => {
                if state.position(id).is_none() {
                    let at = snapshot
                        .successor
                        .and_then(|next| state.position(next))
                        .unwrap_or(state.records.len());
                    state.records.insert(at, snapshot.record);
                }
                state.fail(MutationKind::Delete, id, source);
            }
        }
        self.publish(&state);
    }
}

/// Reconciles one backend call exactly once
///
/// If the call never completes (the task is dropped, the backend future
/// panics, or no runtime accepted the spawn) the drop settles it as
/// [`BackendError::Unavailable`], releasing the claim and rolling back.
struct Settlement<T, F>
where
    F: FnOnce(&Inner, Result<T, BackendError>),
{
    inner: Arc<Inner>,
    settle: Option<F>,
    _outcome: PhantomData<fn(T)>,
}

impl<T, F> Settlement<T, F>
where
    F: FnOnce(&Inner, Result<T, BackendError>),
{
    fn complete(mut self, outcome: Result<T, BackendError>) {
        if let Some(settle) = self.settle.take() {
            settle(&self.inner, outcome);
        }
    }
}

impl<T, F> Drop for Settlement<T, F>
where
    F: FnOnce(&Inner, Result<T, BackendError>),
{
    fn drop(&mut self) {
        if let Some(settle) = self.settle.take() {
            let abandoned = BackendError::Unavailable("backend call abandoned".to_string());
            settle(&self.inner, Err(abandoned));
        }
    }
}

/// Owns the record collection and reconciles optimistic mutations
///
/// Cheap to clone; clones share the same collection.
#[derive(Clone)]
pub struct MutationController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MutationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationController")
            .field("failure_mode", &self.inner.failure.is_on())
            .field("records", &self.inner.state.lock().records.len())
            .finish_non_exhaustive()
    }
}

impl MutationController {
    /// Create a controller over a backend
    ///
    /// `failure` is the switch the backend reads; the controller only flips it.
    #[must_use]
    pub fn new(backend: Arc<dyn TodoBackend>, failure: FailureSwitch) -> Self {
        let (view, _) = watch::channel(ControllerView {
            failure_mode: failure.is_on(),
            ..ControllerView::default()
        });
        Self {
            inner: Arc::new(Inner {
                backend,
                failure,
                ids: IdAllocator::new(),
                state: Mutex::new(State::default()),
                view,
            }),
        }
    }

    /// Create a controller over a fresh [`SimulatedBackend`]
    #[must_use]
    pub fn simulated(config: &BackendConfig) -> Self {
        let backend = SimulatedBackend::from_config(config);
        let failure = backend.failure_switch();
        Self::new(Arc::new(backend), failure)
    }

    /// Optimistically append a record and ask the backend to store it
    ///
    /// Empty or whitespace-only text is ignored: nothing is added, no call is
    /// made, and `None` is returned.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn submit_create(&self, text: impl Into<String>) -> Option<RecordId> {
        let text = text.into();
        if text.trim().is_empty() {
            tracing::debug!("ignoring create with empty text");
            return None;
        }

        let id = self.inner.ids.allocate();
        let record = Record::optimistic(id, text);
        let payload = NewTodo::from(&record);
        {
            let mut state = self.inner.state.lock();
            state.records.push(record);
            state.claims.insert(id, MutationKind::Create);
            self.inner.publish(&state);
        }
        tracing::info!(%id, kind = %MutationKind::Create, "mutation submitted");

        let call = self.inner.backend.add_todo(payload);
        self.reconcile(call, move |inner, outcome| inner.settle_create(id, outcome));
        Some(id)
    }

    /// Optimistically flip a record's done flag
    ///
    /// # Errors
    /// - `SubmitError::InFlight` if the record already has a mutation pending
    /// - `SubmitError::NotFound` if no such record exists
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn submit_toggle(&self, id: RecordId) -> Result<(), SubmitError> {
        let snapshot = {
            let mut state = self.inner.state.lock();
            let index = state.admit(id)?;
            let record = &mut state.records[index];
            let snapshot = ToggleSnapshot {
                prior_done: record.done,
            };
            record.done = !record.done;
            record.pending = true;
            state.claims.insert(id, MutationKind::Toggle);
            self.inner.publish(&state);
            snapshot
        };
        tracing::info!(%id, kind = %MutationKind::Toggle, "mutation submitted");

        let call = self.inner.backend.toggle_todo(id);
        self.reconcile(call, move |inner, outcome| {
            inner.settle_toggle(id, snapshot, outcome);
        });
        Ok(())
    }

    /// Optimistically remove a record
    ///
    /// # Errors
    /// - `SubmitError::InFlight` if the record already has a mutation pending
    /// - `SubmitError::NotFound` if no such record exists
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn submit_delete(&self, id: RecordId) -> Result<(), SubmitError> {
        let snapshot = {
            let mut state = self.inner.state.lock();
            let index = state.admit(id)?;
            let record = state.records.remove(index);
            let successor = state.records.get(index).map(|r| r.id);
            state.claims.insert(id, MutationKind::Delete);
            self.inner.publish(&state);
            DeleteSnapshot { record, successor }
        };
        tracing::info!(%id, kind = %MutationKind::Delete, "mutation submitted");

        let call = self.inner.backend.delete_todo(id);
        self.reconcile(call, move |inner, outcome| inner.settle_delete(snapshot, outcome));
        Ok(())
    }

    /// Switch failure mode; only calls issued afterwards are affected
    pub fn set_simulate_failure(&self, on: bool) {
        self.inner.failure.set(on);
        tracing::info!(failure_mode = on, "failure mode changed");
        let state = self.inner.state.lock();
        self.inner.publish(&state);
    }

    /// Current failure-mode flag
    #[inline]
    #[must_use]
    pub fn simulate_failure(&self) -> bool {
        self.inner.failure.is_on()
    }

    /// Dismiss the last error
    pub fn clear_error(&self) {
        let mut state = self.inner.state.lock();
        if state.last_error.take().is_some() {
            self.inner.publish(&state);
        }
    }

    /// Most recent failed mutation
    #[must_use]
    pub fn last_error(&self) -> Option<MutationError> {
        self.inner.state.lock().last_error.clone()
    }

    /// Current presentation snapshot
    ///
    /// `failure_mode` is read from the switch itself, so flips made through
    /// a shared [`FailureSwitch`] clone are reported immediately.
    #[must_use]
    pub fn view(&self) -> ControllerView {
        let mut view = self.inner.view.borrow().clone();
        view.failure_mode = self.inner.failure.is_on();
        view
    }

    /// Receiver notified after every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ControllerView> {
        self.inner.view.subscribe()
    }

    /// Look up a record by id
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.inner
            .state
            .lock()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Number of visible records
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().records.len()
    }

    /// True when no records are visible
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until every issued backend call has been reconciled
    pub async fn settled(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(ControllerView::is_settled).await;
    }

    fn reconcile<T, F>(&self, call: BoxFuture<'static, Result<T, BackendError>>, settle: F)
    where
        T: Send + 'static,
        F: FnOnce(&Inner, Result<T, BackendError>) + Send + 'static,
    {
        let settlement = Settlement {
            inner: Arc::clone(&self.inner),
            settle: Some(settle),
            _outcome: PhantomData,
        };
        tokio::spawn(async move {
            let outcome = call.await;
            settlement.complete(outcome);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockTodoBackend;
    use crate::types::Ack;
    use futures::FutureExt;
    use pretty_assertions::assert_eq;

    fn controller() -> (MutationController, SimulatedBackend) {
        let backend = SimulatedBackend::from_config(&BackendConfig::new());
        let switch = backend.failure_switch();
        (
            MutationController::new(Arc::new(backend.clone()), switch),
            backend,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_never_reaches_backend() {
        let mut backend = MockTodoBackend::new();
        backend.expect_add_todo().never();
        let controller = MutationController::new(Arc::new(backend), FailureSwitch::default());

        assert_eq!(controller.submit_create(""), None);
        assert_eq!(controller.submit_create("   "), None);
        assert_eq!(controller.submit_create("\t\n"), None);
        assert!(controller.is_empty());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn create_calls_backend_once_with_client_id() {
        let mut backend = MockTodoBackend::new();
        backend
            .expect_add_todo()
            .times(1)
            .withf(|todo| todo.text == "Buy milk")
            .returning(|todo| async move { Ok(Record::new(todo.id, todo.text)) }.boxed());
        let controller = MutationController::new(Arc::new(backend), FailureSwitch::default());

        let id = controller.submit_create("Buy milk").unwrap();
        controller.settled().await;

        assert_eq!(controller.get(id), Some(Record::new(id, "Buy milk")));
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_failure_restores_captured_value() {
        let mut backend = MockTodoBackend::new();
        backend
            .expect_add_todo()
            .returning(|todo| async move { Ok(Record::new(todo.id, todo.text)) }.boxed());
        backend
            .expect_toggle_todo()
            .times(1)
            .returning(|_| async { Err(BackendError::rejected(MutationKind::Toggle)) }.boxed());
        let controller = MutationController::new(Arc::new(backend), FailureSwitch::default());

        let id = controller.submit_create("X").unwrap();
        controller.settled().await;
        controller.submit_toggle(id).unwrap();
        assert!(controller.get(id).unwrap().done);

        controller.settled().await;
        let record = controller.get(id).unwrap();
        assert!(!record.done);
        assert!(!record.pending);
        assert_eq!(controller.last_error().unwrap().kind, MutationKind::Toggle);
    }

    #[tokio::test(start_paused = true)]
    async fn second_mutation_on_same_record_is_rejected() {
        let (controller, _) = controller();
        let id = controller.submit_create("busy").unwrap();

        assert_eq!(
            controller.submit_toggle(id),
            Err(SubmitError::InFlight {
                id,
                kind: MutationKind::Create
            })
        );
        assert_eq!(
            controller.submit_delete(id),
            Err(SubmitError::InFlight {
                id,
                kind: MutationKind::Create
            })
        );

        controller.settled().await;
        assert!(controller.submit_toggle(id).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn detached_record_reports_in_flight() {
        let (controller, _) = controller();
        let id = controller.submit_create("gone").unwrap();
        controller.settled().await;

        controller.submit_delete(id).unwrap();
        assert_eq!(
            controller.submit_toggle(id),
            Err(SubmitError::InFlight {
                id,
                kind: MutationKind::Delete
            })
        );

        controller.settled().await;
        assert_eq!(controller.submit_toggle(id), Err(SubmitError::NotFound(id)));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_delete_reinserts_before_successor() {
        let (controller, _) = controller();
        let a = controller.submit_create("a").unwrap();
        let b = controller.submit_create("b").unwrap();
        let c = controller.submit_create("c").unwrap();
        controller.settled().await;

        controller.set_simulate_failure(true);
        controller.submit_delete(b).unwrap();
        assert_eq!(controller.view().texts(), vec!["a", "c"]);

        controller.settled().await;
        let view = controller.view();
        assert_eq!(view.texts(), vec!["a", "b", "c"]);
        assert_eq!(
            view.records.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![a, b, c]
        );
        assert_eq!(view.last_error.unwrap().kind, MutationKind::Delete);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_delete_appends_when_successor_is_gone() {
        let (controller, _) = controller();
        let a = controller.submit_create("a").unwrap();
        let b = controller.submit_create("b").unwrap();
        controller.settled().await;

        controller.set_simulate_failure(true);
        controller.submit_delete(a).unwrap();
        controller.set_simulate_failure(false);
        controller.submit_delete(b).unwrap();
        controller.submit_create("c").unwrap();

        controller.settled().await;
        assert_eq!(controller.view().texts(), vec!["c", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_error_empties_slot() {
        let (controller, _) = controller();
        controller.set_simulate_failure(true);
        controller.submit_create("Will fail");
        controller.settled().await;
        assert!(controller.last_error().is_some());

        controller.clear_error();
        assert!(controller.last_error().is_none());
        assert!(controller.view().last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn success_does_not_clear_previous_error() {
        let (controller, _) = controller();
        controller.set_simulate_failure(true);
        controller.submit_create("Will fail");
        controller.settled().await;

        controller.set_simulate_failure(false);
        controller.submit_create("Works");
        controller.settled().await;

        assert_eq!(controller.view().texts(), vec!["Works"]);
        assert_eq!(
            controller.last_error().unwrap().kind,
            MutationKind::Create
        );
    }

    #[tokio::test(start_paused = true)]
    async fn view_tracks_in_flight_count() {
        let (controller, _) = controller();
        controller.submit_create("one");
        controller.submit_create("two");
        assert_eq!(controller.view().in_flight, 2);
        assert!(!controller.view().is_settled());

        controller.settled().await;
        assert_eq!(controller.view().in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_optimistic_then_settled_state() {
        let (controller, _) = controller();
        let mut rx = controller.subscribe();

        let id = controller.submit_create("watched").unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().get(id).unwrap().pending);

        rx.changed().await.unwrap();
        assert!(!rx.borrow().get(id).unwrap().pending);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_ack_is_ignored_on_success() {
        let mut backend = MockTodoBackend::new();
        backend
            .expect_add_todo()
            .returning(|todo| async move { Ok(Record::new(todo.id, todo.text)) }.boxed());
        backend
            .expect_delete_todo()
            .times(1)
            .returning(|_| async { Ok(Ack::OK) }.boxed());
        let controller = MutationController::new(Arc::new(backend), FailureSwitch::default());

        let id = controller.submit_create("bye").unwrap();
        controller.settled().await;
        controller.submit_delete(id).unwrap();
        controller.settled().await;

        assert!(controller.is_empty());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_backend_call_rolls_back_and_releases_claim() {
        let mut backend = MockTodoBackend::new();
        backend
            .expect_add_todo()
            .returning(|todo| async move { Ok(Record::new(todo.id, todo.text)) }.boxed());
        backend.expect_toggle_todo().times(1).returning(|_| {
            futures::future::lazy(|_| -> Result<Ack, BackendError> { panic!("backend crashed") })
                .boxed()
        });
        let controller = MutationController::new(Arc::new(backend), FailureSwitch::default());

        let id = controller.submit_create("fragile").unwrap();
        controller.settled().await;
        controller.submit_toggle(id).unwrap();
        controller.settled().await;

        let record = controller.get(id).unwrap();
        assert!(!record.done);
        assert!(!record.pending);
        let error = controller.last_error().unwrap();
        assert_eq!(error.kind, MutationKind::Toggle);
        assert!(matches!(error.source, BackendError::Unavailable(_)));
        assert!(controller.view().is_settled());
    }

    #[test]
    fn submit_outside_runtime_does_not_leak_claim() {
        let mut backend = MockTodoBackend::new();
        backend
            .expect_add_todo()
            .times(1)
            .returning(|todo| async move { Ok(Record::new(todo.id, todo.text)) }.boxed());
        let controller = MutationController::new(Arc::new(backend), FailureSwitch::default());

        let submitted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            controller.submit_create("orphan")
        }));
        assert!(submitted.is_err());

        let view = controller.view();
        assert!(view.records.is_empty());
        assert!(view.is_settled());
        assert_eq!(view.last_error.unwrap().kind, MutationKind::Create);
    }
}
