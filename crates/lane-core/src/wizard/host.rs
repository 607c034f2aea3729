//! The stateful host around the pure transition function.

use std::time::Duration;

use crate::record::{CommitConfig, CommittedResult};
use crate::types::{DraftId, ResultId};

use super::schedule::{Scheduler, TimerToken};
use super::{Effect, Stage, Transition, WizardError, WizardEvent, WizardState, transition};

/// Persistence collaborator for drafts and committed results.
///
/// The wizard never retries a failed call; retry policy belongs to the
/// implementation or to the caller.
pub trait ResultStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save_draft(&mut self, snapshot: &WizardState) -> Result<(), Self::Error>;

    fn commit(&mut self, result: &CommittedResult) -> Result<ResultId, Self::Error>;
}

impl<T: ResultStore + ?Sized> ResultStore for &mut T {
    type Error = T::Error;

    fn save_draft(&mut self, snapshot: &WizardState) -> Result<(), Self::Error> {
        (**self).save_draft(snapshot)
    }

    fn commit(&mut self, result: &CommittedResult) -> Result<ResultId, Self::Error> {
        (**self).commit(result)
    }
}

/// An autosave that the store rejected. Edits stay in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub draft_id: DraftId,
    pub stage: Stage,
    pub message: String,
}

/// Owns one capture for its whole lifetime.
///
/// Edits re-arm a debounced autosave; call [`poll`](Self::poll) from the
/// event loop to run it once due. Stage changes, [`close`](Self::close) and
/// drop write the latest state synchronously.
pub struct CaptureWizard<S: ResultStore, C: Scheduler> {
    state: WizardState,
    store: S,
    scheduler: C,
    config: CommitConfig,
    debounce: Duration,
    pending: Option<TimerToken>,
    result_id: Option<ResultId>,
    failures: Vec<SaveFailure>,
    closed: bool,
}

impl<S: ResultStore, C: Scheduler> CaptureWizard<S, C> {
    /// Starts a blank capture.
    pub fn new(
        draft_id: DraftId,
        store: S,
        scheduler: C,
        debounce: Duration,
        config: CommitConfig,
    ) -> Self {
        Self::resume(WizardState::new(draft_id), store, scheduler, debounce, config)
    }

    /// Continues a capture from a saved snapshot.
    pub fn resume(
        state: WizardState,
        store: S,
        scheduler: C,
        debounce: Duration,
        config: CommitConfig,
    ) -> Self {
        tracing::debug!(draft_id = %state.draft_id, stage = %state.stage, "capture opened");
        Self {
            state,
            store,
            scheduler,
            config,
            debounce,
            pending: None,
            result_id: None,
            failures: Vec::new(),
            closed: false,
        }
    }

    pub const fn state(&self) -> &WizardState {
        &self.state
    }

    pub const fn stage(&self) -> Stage {
        self.state.stage
    }

    /// Identifier assigned by the store once committed.
    pub const fn result_id(&self) -> Option<ResultId> {
        self.result_id
    }

    pub fn committed(&self) -> Option<&CommittedResult> {
        self.state.committed.as_deref()
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn scheduler_mut(&mut self) -> &mut C {
        &mut self.scheduler
    }

    /// Whether an autosave is armed but has not run yet.
    pub const fn has_pending_save(&self) -> bool {
        self.pending.is_some()
    }

    /// Applies one event. Rejected events leave the wizard unchanged.
    ///
    /// A commit the store rejects keeps the wizard in the segments stage so
    /// the caller may retry.
    pub fn dispatch(&mut self, event: WizardEvent) -> Result<Stage, WizardError> {
        let Transition { state, effects } = transition(&self.state, event, &self.config)?;
        for effect in effects {
            match effect {
                Effect::ScheduleAutosave => self.schedule_autosave(),
                Effect::FlushAutosave(snapshot) => {
                    self.cancel_pending();
                    self.save(&snapshot);
                }
                Effect::Commit(result) => {
                    let id = self
                        .store
                        .commit(&result)
                        .map_err(|err| WizardError::Store(Box::new(err)))?;
                    tracing::info!(
                        draft_id = %result.draft_id,
                        result_id = id,
                        status = result.status.as_str(),
                        "result committed"
                    );
                    self.result_id = Some(id);
                }
            }
        }
        self.state = state;
        Ok(self.state.stage)
    }

    /// Runs the autosave if its debounce window has elapsed. Returns whether
    /// a save was attempted.
    pub fn poll(&mut self) -> bool {
        let expired = self.scheduler.take_expired();
        match self.pending {
            Some(token) if expired.contains(&token) => {
                self.pending = None;
                let snapshot = self.state.clone();
                self.save(&snapshot);
                true
            }
            _ => false,
        }
    }

    /// Writes any pending autosave now.
    pub fn flush(&mut self) {
        if self.cancel_pending() {
            let snapshot = self.state.clone();
            self.save(&snapshot);
        }
    }

    /// Autosave failures since the last call.
    pub fn take_save_failures(&mut self) -> Vec<SaveFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Flushes and disposes of the wizard, returning unreported save failures.
    pub fn close(mut self) -> Vec<SaveFailure> {
        self.flush();
        self.closed = true;
        self.take_save_failures()
    }

    fn schedule_autosave(&mut self) {
        self.cancel_pending();
        self.pending = Some(self.scheduler.schedule(self.debounce));
    }

    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(token) => {
                self.scheduler.cancel(token);
                true
            }
            None => false,
        }
    }

    fn save(&mut self, snapshot: &WizardState) {
        match self.store.save_draft(snapshot) {
            Ok(()) => {
                tracing::debug!(draft_id = %snapshot.draft_id, stage = %snapshot.stage, "draft saved");
            }
            Err(err) => {
                tracing::warn!(draft_id = %snapshot.draft_id, error = %err, "autosave failed");
                self.failures.push(SaveFailure {
                    draft_id: snapshot.draft_id.clone(),
                    stage: snapshot.stage,
                    message: err.to_string(),
                });
            }
        }
    }
}

impl<S: ResultStore, C: Scheduler> Drop for CaptureWizard<S, C> {
    fn drop(&mut self) {
        if !self.closed {
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use thiserror::Error;

    use super::*;
    use crate::types::Style;
    use crate::wizard::VirtualScheduler;
    use crate::wizard::tests::{at_segments, competition, segment};

    #[derive(Debug, Error)]
    #[error("store unavailable")]
    struct Unavailable;

    #[derive(Default)]
    struct MemoryStore {
        saves: Vec<WizardState>,
        commits: Vec<CommittedResult>,
        fail_saves: bool,
        fail_commits: bool,
    }

    impl ResultStore for MemoryStore {
        type Error = Unavailable;

        fn save_draft(&mut self, snapshot: &WizardState) -> Result<(), Unavailable> {
            if self.fail_saves {
                return Err(Unavailable);
            }
            self.saves.push(snapshot.clone());
            Ok(())
        }

        fn commit(&mut self, result: &CommittedResult) -> Result<ResultId, Unavailable> {
            if self.fail_commits {
                return Err(Unavailable);
            }
            self.commits.push(result.clone());
            Ok(i64::try_from(self.commits.len()).unwrap())
        }
    }

    const DEBOUNCE: Duration = Duration::from_millis(1000);

    fn wizard(store: &mut MemoryStore) -> CaptureWizard<&mut MemoryStore, VirtualScheduler> {
        CaptureWizard::new(
            DraftId::new("draft-1").unwrap(),
            store,
            VirtualScheduler::new(),
            DEBOUNCE,
            CommitConfig::default(),
        )
    }

    fn at_segments_wizard(store: &mut MemoryStore) -> CaptureWizard<&mut MemoryStore, VirtualScheduler> {
        CaptureWizard::resume(
            at_segments(),
            store,
            VirtualScheduler::new(),
            DEBOUNCE,
            CommitConfig::default(),
        )
    }

    fn fill_segments(wizard: &mut CaptureWizard<&mut MemoryStore, VirtualScheduler>) {
        wizard
            .dispatch(WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")))
            .unwrap();
        wizard
            .dispatch(WizardEvent::UpsertSegment(segment(2, Style::Free, "00:31.00")))
            .unwrap();
        wizard
            .dispatch(WizardEvent::SetGlobalTime("01:00.00".into()))
            .unwrap();
    }

    #[test]
    fn rapid_edits_coalesce_into_one_save() {
        let mut store = MemoryStore::default();
        let mut wizard = at_segments_wizard(&mut store);

        wizard
            .dispatch(WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")))
            .unwrap();
        wizard.scheduler_mut().advance(Duration::from_millis(600));
        assert!(!wizard.poll());

        wizard
            .dispatch(WizardEvent::UpsertSegment(segment(2, Style::Free, "00:31.00")))
            .unwrap();
        wizard.scheduler_mut().advance(Duration::from_millis(600));
        assert!(!wizard.poll(), "second edit restarts the window");

        wizard.scheduler_mut().advance(Duration::from_millis(400));
        assert!(wizard.poll());
        assert!(!wizard.has_pending_save());
        assert_eq!(wizard.scheduler_mut().pending(), 0);
        drop(wizard);

        assert_eq!(store.saves.len(), 1);
        assert_eq!(store.saves[0].form.as_ref().unwrap().segments.len(), 2);
    }

    #[test]
    fn stage_change_flushes_synchronously() {
        let mut store = MemoryStore::default();
        let mut wizard = wizard(&mut store);

        wizard
            .dispatch(WizardEvent::SelectCompetition(competition()))
            .unwrap();
        assert!(wizard.has_pending_save());
        assert_eq!(wizard.dispatch(WizardEvent::Advance).unwrap(), Stage::Subject);
        assert!(!wizard.has_pending_save());
        assert_eq!(wizard.scheduler_mut().pending(), 0);
        assert_eq!(wizard.store().saves.len(), 1);
        assert_eq!(wizard.store().saves[0].stage, Stage::Subject);
    }

    #[test]
    fn drop_flushes_pending_edit_and_cancels_timer() {
        let mut store = MemoryStore::default();
        {
            let mut wizard = wizard(&mut store);
            wizard
                .dispatch(WizardEvent::SelectCompetition(competition()))
                .unwrap();
        }
        assert_eq!(store.saves.len(), 1);
        assert!(store.saves[0].competition.is_some());
    }

    #[test]
    fn close_without_pending_edit_writes_nothing() {
        let mut store = MemoryStore::default();
        let wizard = wizard(&mut store);
        assert!(wizard.close().is_empty());
        assert!(store.saves.is_empty());
    }

    #[test]
    fn save_failures_are_reported_not_thrown() {
        let mut store = MemoryStore {
            fail_saves: true,
            ..MemoryStore::default()
        };
        let mut wizard = wizard(&mut store);
        wizard
            .dispatch(WizardEvent::SelectCompetition(competition()))
            .unwrap();
        assert_eq!(wizard.dispatch(WizardEvent::Advance).unwrap(), Stage::Subject);
        assert!(wizard.state().competition.is_some());

        let failures = wizard.take_save_failures();
        assert_eq!(
            failures,
            vec![SaveFailure {
                draft_id: DraftId::new("draft-1").unwrap(),
                stage: Stage::Subject,
                message: "store unavailable".into(),
            }]
        );
        assert!(wizard.take_save_failures().is_empty());
    }

    #[test]
    fn commit_hands_result_to_store() {
        let mut store = MemoryStore::default();
        let mut wizard = at_segments_wizard(&mut store);
        fill_segments(&mut wizard);

        assert_eq!(wizard.dispatch(WizardEvent::Advance).unwrap(), Stage::Committed);
        assert_eq!(wizard.result_id(), Some(1));
        assert!(wizard.committed().is_some());
        assert!(matches!(
            wizard.dispatch(WizardEvent::Advance),
            Err(WizardError::Committed(_))
        ));
        assert!(wizard.close().is_empty());

        assert_eq!(store.commits.len(), 1);
        // The pre-commit flush is the only save; nothing is written after commit.
        assert_eq!(store.saves.len(), 1);
        assert_eq!(store.saves[0].stage, Stage::Segments);
    }

    #[test]
    fn failed_commit_keeps_segments_stage_for_retry() {
        let mut store = MemoryStore {
            fail_commits: true,
            ..MemoryStore::default()
        };
        {
            let mut wizard = at_segments_wizard(&mut store);
            fill_segments(&mut wizard);
            let err = wizard.dispatch(WizardEvent::Advance).unwrap_err();
            assert!(matches!(err, WizardError::Store(_)));
            assert_eq!(wizard.stage(), Stage::Segments);
            assert!(wizard.state().committed.is_none());
            assert_eq!(wizard.result_id(), None);
        }
        store.fail_commits = false;

        let mut wizard = at_segments_wizard(&mut store);
        fill_segments(&mut wizard);
        assert_eq!(wizard.dispatch(WizardEvent::Advance).unwrap(), Stage::Committed);
    }

    #[test]
    fn blocked_advance_keeps_state_and_pending_save() {
        let mut store = MemoryStore::default();
        let mut wizard = at_segments_wizard(&mut store);
        wizard
            .dispatch(WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")))
            .unwrap();
        let err = wizard.dispatch(WizardEvent::Advance).unwrap_err();
        assert!(!err.validation_errors().is_empty());
        assert_eq!(wizard.stage(), Stage::Segments);
        assert!(wizard.has_pending_save());
    }
}
