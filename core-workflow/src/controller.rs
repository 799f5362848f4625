//! # Workflow Controller
//!
//! Top-level state machine for moving a selection of records from one
//! collection into another.
//!
//! ## Stages
//!
//! 1. `Reviewing` - build the selection across pages, remove rows
//! 2. `PickingDestination` - choose the destination collection
//! 3. `Confirming` - advancing submits the transfer
//!
//! `advance` moves one stage forward when the current stage's guard holds:
//! a non-empty selection to leave `Reviewing`, a chosen destination to leave
//! `PickingDestination`. `back` moves exactly one stage backward.
//!
//! ## Submission
//!
//! Advancing from `Confirming` invokes the `TransferExecutor`. While the call
//! is in flight `is_submitting` is set and every advance, back, and selection
//! edit is refused. The state lock is released for the duration of the call.
//!
//! - Success: the selection is cleared, the workflow closes, and a success
//!   notification is shown.
//! - Failure: the workflow stays at `Confirming` with its selection and
//!   destination intact, and an error notification is shown.
//!
//! If the `advance` future is dropped before the call resolves, the
//! submission is released: `is_submitting` goes back to false and the
//! workflow stays at `Confirming` so the transfer can be retried.
//!
//! Cancelling does not abort an in-flight call. When the call resolves after
//! its workflow was cancelled (or replaced by a new one), the result is
//! discarded and only a `TransferEvent::Discarded` is emitted.

use crate::error::{Result, WorkflowError};
use crate::executor::TransferExecutor;
use crate::notifications::NotificationCenter;
use crate::paged_view::{PageSelection, PageSnapshot, PagedView};
use crate::picker::CollectionPicker;
use crate::selection::SelectionSet;
use crate::stage::WorkflowStage;
use bridge_traits::{
    Collection, CollectionSource, Record, RecordId, TransferRequest, TransferResult,
    TransferService,
};
use core_runtime::events::{
    CloseReason, CoreEvent, EventBus, NotificationKind, TransferEvent, WorkflowEvent,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Identifies one workflow invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(Uuid);

impl WorkflowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Successful transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub workflow_id: WorkflowId,
    pub destination: Collection,
    pub result: TransferResult,
    pub message: String,
}

/// What an `advance` call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to this stage
    Stage(WorkflowStage),
    /// The transfer succeeded and the workflow closed
    Transferred(TransferReport),
    /// The transfer resolved after its workflow was torn down
    Discarded,
}

/// Read-only view of the controller state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowState {
    pub workflow_id: Option<WorkflowId>,
    pub origin: Option<Collection>,
    pub stage: WorkflowStage,
    pub selection: Vec<Record>,
    pub destination: Option<Collection>,
    pub is_submitting: bool,
    pub last_error: Option<String>,
    pub last_success_message: Option<String>,
}

impl WorkflowState {
    pub fn is_open(&self) -> bool {
        self.workflow_id.is_some()
    }
}

/// Success message for a completed transfer.
///
/// Zero added records means everything was already at the destination and
/// gets its own phrasing without a count.
pub fn success_message(result: &TransferResult, destination: &Collection) -> String {
    if result.records_added == 0 {
        return format!(
            "All selected records are already present in {}",
            destination.name
        );
    }

    let noun = if result.records_added == 1 {
        "record"
    } else {
        "records"
    };
    let mut message = format!(
        "Moved {} {} to {}",
        result.records_added, noun, destination.name
    );
    if result.records_already_present > 0 {
        message.push_str(&format!(
            " ({} already present)",
            result.records_already_present
        ));
    }
    message
}

#[derive(Debug)]
struct Session {
    id: WorkflowId,
    origin: Collection,
    stage: WorkflowStage,
    destination: Option<Collection>,
    is_submitting: bool,
    last_error: Option<String>,
}

#[derive(Debug, Default)]
struct ControllerState {
    session: Option<Session>,
    selection: SelectionSet,
    last_success_message: Option<String>,
}

impl ControllerState {
    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(WorkflowError::NotOpen)
    }

    /// Open session that is not submitting
    fn idle_session_mut(&mut self) -> Result<&mut Session> {
        let session = self.session.as_mut().ok_or(WorkflowError::NotOpen)?;
        if session.is_submitting {
            return Err(WorkflowError::SubmissionInProgress);
        }
        Ok(session)
    }
}

/// Releases the submission when the submitting future is dropped before
/// the transfer resolves
struct SubmissionGuard {
    state: Arc<Mutex<ControllerState>>,
    workflow_id: WorkflowId,
    armed: bool,
}

impl SubmissionGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let workflow_id = self.workflow_id;
        warn!(workflow_id = %workflow_id, "Transfer abandoned before it resolved");

        match self.state.try_lock() {
            Ok(mut state) => release_submission(&mut state, workflow_id),
            Err(_) => {
                let state = Arc::clone(&self.state);
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        release_submission(&mut *state.lock().await, workflow_id);
                    });
                }
            }
        }
    }
}

fn release_submission(state: &mut ControllerState, workflow_id: WorkflowId) {
    if let Some(session) = state.session.as_mut().filter(|s| s.id == workflow_id) {
        session.is_submitting = false;
        session.last_error = Some("transfer was interrupted before it resolved".to_string());
    }
}

pub struct WorkflowController {
    collections: Arc<dyn CollectionSource>,
    executor: TransferExecutor,
    notifications: Arc<NotificationCenter>,
    event_bus: EventBus,
    state: Arc<Mutex<ControllerState>>,
}

impl WorkflowController {
    pub fn new(
        collections: Arc<dyn CollectionSource>,
        transfer_service: Arc<dyn TransferService>,
        notifications: Arc<NotificationCenter>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            collections,
            executor: TransferExecutor::new(transfer_service),
            notifications,
            event_bus,
            state: Arc::new(Mutex::new(ControllerState::default())),
        }
    }

    /// Open a workflow over records of `origin`, at `Reviewing` with an
    /// empty selection
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::AlreadyOpen` if a workflow is open
    #[instrument(skip(self), fields(origin = %origin.id))]
    pub async fn open(&self, origin: Collection) -> Result<WorkflowId> {
        let mut state = self.state.lock().await;
        if state.session.is_some() {
            return Err(WorkflowError::AlreadyOpen);
        }

        let id = WorkflowId::new();
        state.selection.clear();
        state.session = Some(Session {
            id,
            origin: origin.clone(),
            stage: WorkflowStage::Reviewing,
            destination: None,
            is_submitting: false,
            last_error: None,
        });

        info!(workflow_id = %id, "Workflow opened");
        self.event_bus
            .emit(CoreEvent::Workflow(WorkflowEvent::Opened {
                workflow_id: id.as_str(),
                origin_collection_id: origin.id.to_string(),
            }))
            .ok();

        Ok(id)
    }

    /// Apply the checked rows of the loaded page.
    ///
    /// Rows on the page replace their previous selection state; selections
    /// from other pages are kept. Returns the new selection size.
    ///
    /// # Errors
    ///
    /// Fails outside `Reviewing`, while submitting, or when the page was not
    /// loaded from the origin collection
    pub async fn apply_page_selection(&self, page: &PageSelection) -> Result<usize> {
        let mut state = self.state.lock().await;
        let session = state.idle_session_mut()?;
        ensure_editable(session)?;
        if page.collection_id.as_ref() != Some(&session.origin.id) {
            return Err(WorkflowError::Validation {
                stage: session.stage,
                reason: format!(
                    "page does not belong to the origin collection {}",
                    session.origin.id
                ),
            });
        }
        let workflow_id = session.id;

        let mut next: Vec<Record> = state
            .selection
            .list()
            .iter()
            .filter(|record| !page.is_on_page(record.id))
            .cloned()
            .collect();
        next.extend(page.checked.iter().cloned());
        state.selection.add(next);

        let size = state.selection.len();
        self.emit_selection_changed(workflow_id, size);
        Ok(size)
    }

    /// Remove one record from the selection (review listing)
    pub async fn remove_record(&self, id: RecordId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let session = state.idle_session_mut()?;
        ensure_editable(session)?;
        let workflow_id = session.id;

        let removed = state.selection.remove(id);
        if removed {
            let size = state.selection.len();
            self.emit_selection_changed(workflow_id, size);
        }
        Ok(removed)
    }

    /// Current selection rendered as the unpaginated review listing
    pub async fn review_page(&self) -> PageSnapshot {
        let state = self.state.lock().await;
        PagedView::review_snapshot(&state.selection)
    }

    /// Destination options: every collection except the origin, with the
    /// current destination preselected
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Fetch` if the collection list cannot be loaded
    pub async fn destination_picker(&self) -> Result<CollectionPicker> {
        let (origin_id, destination) = {
            let state = self.state.lock().await;
            let session = state.session()?;
            (session.origin.id.clone(), session.destination.clone())
        };

        let collections = self
            .collections
            .list_collections()
            .await
            .map_err(|e| WorkflowError::Fetch(e.to_string()))?;

        Ok(CollectionPicker::new(collections)
            .excluding(&origin_id)
            .with_chosen(destination.as_ref()))
    }

    /// Store the destination resolved by a `CollectionPicker`
    ///
    /// # Errors
    ///
    /// Fails outside `PickingDestination`, while submitting, or when the
    /// destination is the origin
    pub async fn set_destination(&self, destination: Collection) -> Result<()> {
        let mut state = self.state.lock().await;
        let session = state.idle_session_mut()?;

        if session.stage != WorkflowStage::PickingDestination {
            return Err(WorkflowError::Validation {
                stage: session.stage,
                reason: "destination can only be chosen while picking a destination"
                    .to_string(),
            });
        }
        if destination.id == session.origin.id {
            return Err(WorkflowError::Validation {
                stage: session.stage,
                reason: "destination must differ from the origin collection".to_string(),
            });
        }

        debug!(workflow_id = %session.id, destination = %destination.id, "Destination chosen");
        self.event_bus
            .emit(CoreEvent::Workflow(WorkflowEvent::DestinationChosen {
                workflow_id: session.id.as_str(),
                destination_collection_id: destination.id.to_string(),
            }))
            .ok();
        session.destination = Some(destination);
        Ok(())
    }

    /// Whether `advance` would pass the current stage's guard
    pub async fn can_advance(&self) -> bool {
        let state = self.state.lock().await;
        match &state.session {
            Some(session) if !session.is_submitting => {
                stage_guard(session, &state.selection).is_ok()
            }
            _ => false,
        }
    }

    /// Watch the selection size
    pub async fn subscribe_selection(&self) -> watch::Receiver<usize> {
        self.state.lock().await.selection.subscribe()
    }

    /// Move one stage forward, or submit the transfer from `Confirming`
    ///
    /// # Errors
    ///
    /// - `WorkflowError::Validation` when the stage guard fails
    /// - `WorkflowError::SubmissionInProgress` while a transfer is in flight
    /// - `WorkflowError::Transfer` when the transfer fails; the workflow stays
    ///   open at `Confirming`
    pub async fn advance(&self) -> Result<AdvanceOutcome> {
        let (workflow_id, request, destination) = {
            let mut guard = self.state.lock().await;
            let ControllerState {
                session, selection, ..
            } = &mut *guard;
            let session = session.as_mut().ok_or(WorkflowError::NotOpen)?;
            if session.is_submitting {
                return Err(WorkflowError::SubmissionInProgress);
            }
            stage_guard(session, selection)?;

            if let Some(next) = session.stage.next() {
                session.stage.validate_transition(next)?;
                let from = session.stage;
                session.stage = next;
                self.emit_stage_changed(session.id, from, next);
                return Ok(AdvanceOutcome::Stage(next));
            }

            let Some(destination) = session.destination.clone() else {
                return Err(missing_destination(session.stage));
            };
            let request = TransferRequest::new(
                selection.ids(),
                session.origin.id.clone(),
                destination.id.clone(),
            );
            session.is_submitting = true;
            session.last_error = None;
            (session.id, request, destination)
        };

        let guard = SubmissionGuard {
            state: Arc::clone(&self.state),
            workflow_id,
            armed: true,
        };
        self.submit(workflow_id, request, destination, guard).await
    }

    /// Move exactly one stage backward
    pub async fn back(&self) -> Result<WorkflowStage> {
        let mut state = self.state.lock().await;
        let session = state.idle_session_mut()?;

        let previous = session.stage.previous().ok_or_else(|| WorkflowError::Validation {
            stage: session.stage,
            reason: "already at the first stage".to_string(),
        })?;
        session.stage.validate_transition(previous)?;

        let from = session.stage;
        session.stage = previous;
        self.emit_stage_changed(session.id, from, previous);
        Ok(previous)
    }

    /// Close the workflow without transferring.
    ///
    /// Clears the selection and discards the destination. An in-flight
    /// transfer keeps running; its result will be discarded.
    #[instrument(skip(self))]
    pub async fn cancel(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let session = state.session.take().ok_or(WorkflowError::NotOpen)?;
        state.selection.clear();

        if session.is_submitting {
            warn!(workflow_id = %session.id, "Workflow cancelled with a transfer in flight");
        } else {
            info!(workflow_id = %session.id, "Workflow cancelled");
        }
        self.emit_closed(session.id, CloseReason::Cancelled);
        Ok(())
    }

    pub async fn state(&self) -> WorkflowState {
        let state = self.state.lock().await;
        let session = state.session.as_ref();
        WorkflowState {
            workflow_id: session.map(|s| s.id),
            origin: session.map(|s| s.origin.clone()),
            stage: session.map(|s| s.stage).unwrap_or_default(),
            selection: state.selection.list().to_vec(),
            destination: session.and_then(|s| s.destination.clone()),
            is_submitting: session.map(|s| s.is_submitting).unwrap_or(false),
            last_error: session.and_then(|s| s.last_error.clone()),
            last_success_message: state.last_success_message.clone(),
        }
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.session.is_some()
    }

    #[instrument(skip(self, request, destination, guard), fields(workflow_id = %workflow_id))]
    async fn submit(
        &self,
        workflow_id: WorkflowId,
        request: TransferRequest,
        destination: Collection,
        mut guard: SubmissionGuard,
    ) -> Result<AdvanceOutcome> {
        self.event_bus
            .emit(CoreEvent::Transfer(TransferEvent::Started {
                workflow_id: workflow_id.as_str(),
                record_count: request.record_ids.len(),
                destination_collection_id: destination.id.to_string(),
            }))
            .ok();

        let outcome = self.executor.execute(&request).await;

        let mut state = self.state.lock().await;
        guard.disarm();
        let current = state.session.as_ref().map(|s| s.id);
        if current != Some(workflow_id) {
            info!("Transfer resolved after its workflow closed; discarding result");
            self.event_bus
                .emit(CoreEvent::Transfer(TransferEvent::Discarded {
                    workflow_id: workflow_id.as_str(),
                    succeeded: outcome.is_ok(),
                }))
                .ok();
            return Ok(AdvanceOutcome::Discarded);
        }

        match outcome {
            Ok(result) => {
                let message = success_message(&result, &destination);
                state.selection.clear();
                state.session = None;
                state.last_success_message = Some(message.clone());
                drop(state);

                info!(
                    records_added = result.records_added,
                    already_present = result.records_already_present,
                    "Transfer completed"
                );
                self.event_bus
                    .emit(CoreEvent::Transfer(TransferEvent::Completed {
                        workflow_id: workflow_id.as_str(),
                        records_added: result.records_added,
                        records_already_present: result.records_already_present,
                    }))
                    .ok();
                self.emit_closed(workflow_id, CloseReason::Completed);
                self.notifications
                    .notify(NotificationKind::Success, message.clone())
                    .await;

                Ok(AdvanceOutcome::Transferred(TransferReport {
                    workflow_id,
                    destination,
                    result,
                    message,
                }))
            }
            Err(error) => {
                if let Some(session) = state.session.as_mut() {
                    session.is_submitting = false;
                    session.last_error = Some(error.to_string());
                }
                drop(state);

                self.event_bus
                    .emit(CoreEvent::Transfer(TransferEvent::Failed {
                        workflow_id: workflow_id.as_str(),
                        message: error.to_string(),
                        retryable: error.is_retryable(),
                    }))
                    .ok();
                self.notifications
                    .notify(NotificationKind::Error, error.to_string())
                    .await;

                Err(WorkflowError::Transfer(error))
            }
        }
    }

    fn emit_selection_changed(&self, workflow_id: WorkflowId, size: usize) {
        self.event_bus
            .emit(CoreEvent::Workflow(WorkflowEvent::SelectionChanged {
                workflow_id: workflow_id.as_str(),
                size,
            }))
            .ok();
    }

    fn emit_stage_changed(&self, workflow_id: WorkflowId, from: WorkflowStage, to: WorkflowStage) {
        debug!(workflow_id = %workflow_id, %from, %to, "Stage changed");
        self.event_bus
            .emit(CoreEvent::Workflow(WorkflowEvent::StageChanged {
                workflow_id: workflow_id.as_str(),
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            }))
            .ok();
    }

    fn emit_closed(&self, workflow_id: WorkflowId, reason: CloseReason) {
        self.event_bus
            .emit(CoreEvent::Workflow(WorkflowEvent::Closed {
                workflow_id: workflow_id.as_str(),
                reason,
            }))
            .ok();
    }
}

fn ensure_editable(session: &Session) -> Result<()> {
    if session.stage != WorkflowStage::Reviewing {
        return Err(WorkflowError::Validation {
            stage: session.stage,
            reason: "the selection can only be edited while reviewing".to_string(),
        });
    }
    Ok(())
}

fn missing_destination(stage: WorkflowStage) -> WorkflowError {
    WorkflowError::Validation {
        stage,
        reason: "choose a destination collection".to_string(),
    }
}

/// Guard for leaving the session's current stage
fn stage_guard(session: &Session, selection: &SelectionSet) -> Result<()> {
    if selection.is_empty() {
        return Err(WorkflowError::Validation {
            stage: session.stage,
            reason: "select at least one record".to_string(),
        });
    }
    match session.stage {
        WorkflowStage::Reviewing => Ok(()),
        WorkflowStage::PickingDestination | WorkflowStage::Confirming => {
            if session.destination.is_none() {
                Err(missing_destination(session.stage))
            } else {
                Ok(())
            }
        }
    }
}
