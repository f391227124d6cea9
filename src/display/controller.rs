/*
 *  display/controller.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display mode controller - owns the current mode and pushes every
 *  change to the registered observers
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use super::mode::{
    ConnectionPayload, MessagePayload, Mode, ModePayload, ProgressPayload, Severity, Snapshot,
};
use log::{debug, error, info};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Failure reported by an observer while handling a snapshot
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("observer channel closed")]
    Disconnected,
    #[error("{0}")]
    Other(String),
}

/// Receives every (mode, payload) change of a [`Controller`].
///
/// Called synchronously on the thread of whoever switched the mode, so an
/// implementation must only store the snapshot and return.
pub trait Observer: Send + Sync {
    fn update(&self, snapshot: &Snapshot) -> Result<(), ObserverError>;
}

struct ControllerState {
    current: Snapshot,
    observers: Vec<Arc<dyn Observer>>,
}

/// Single source of truth for what the display should show.
///
/// All mutators take `&self`; wrap the controller in an `Arc` to share it
/// between the orchestrating tasks.
pub struct Controller {
    state: Mutex<ControllerState>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Create a controller in `Clear` mode with no observers
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ControllerState {
                current: Snapshot::default(),
                observers: Vec::new(),
            }),
        }
    }

    // The state holds plain data, a poisoned lock is still consistent
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an observer, ignored when already attached
    pub fn attach(&self, observer: Arc<dyn Observer>) {
        let mut state = self.lock();
        if !state.observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            state.observers.push(observer);
        }
    }

    /// Remove an observer, ignored when not attached
    pub fn detach(&self, observer: &Arc<dyn Observer>) {
        self.lock().observers.retain(|o| !Arc::ptr_eq(o, observer));
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.lock().current.mode()
    }

    /// Copy of the current (mode, payload) pair
    pub fn snapshot(&self) -> Snapshot {
        self.lock().current.clone()
    }

    pub fn clear(&self) -> bool {
        self.switch_plain(ModePayload::Clear)
    }

    pub fn intro(&self) -> bool {
        self.switch_plain(ModePayload::Intro)
    }

    pub fn cycle(&self) -> bool {
        self.switch_plain(ModePayload::Cycle)
    }

    pub fn warning(&self) -> bool {
        self.switch_plain(ModePayload::Warning)
    }

    /// Show a banner; every call replaces the banner and notifies
    pub fn message(&self, severity: Severity, lines: Vec<String>) -> bool {
        let mut state = self.lock();
        Self::replace(&mut state, ModePayload::Message(MessagePayload { severity, lines }));
        Self::notify(&state);
        true
    }

    /// Show or update a progress task.
    ///
    /// Repeated calls while in `Progress` merge the fields into the current
    /// payload; every call notifies.
    pub fn progress(
        &self,
        name: &str,
        detail: &str,
        percentage: f32,
        name_on_finish: &str,
        detail_on_finish: &str,
    ) -> bool {
        let mut state = self.lock();
        if let Some(current) = state.current.progress() {
            let mut payload = current.clone();
            payload.name = name.to_string();
            payload.detail = detail.to_string();
            payload.name_on_finish = name_on_finish.to_string();
            payload.detail_on_finish = detail_on_finish.to_string();
            payload.percentage = percentage;
            state.current = Snapshot::new(ModePayload::Progress(payload));
        } else {
            let payload = ProgressPayload {
                name: name.to_string(),
                detail: detail.to_string(),
                name_on_finish: name_on_finish.to_string(),
                detail_on_finish: detail_on_finish.to_string(),
                percentage,
            };
            Self::replace(&mut state, ModePayload::Progress(payload));
        }
        Self::notify(&state);
        true
    }

    /// Show or update the pairing status, same contract as [`Controller::progress`]
    pub fn connection(&self, established: bool, attempt: u32, lines: Vec<String>) -> bool {
        let mut state = self.lock();
        let payload = ModePayload::Connection(ConnectionPayload::new(established, attempt, lines));
        if state.current.mode() == Mode::Connection {
            state.current = Snapshot::new(payload);
        } else {
            Self::replace(&mut state, payload);
        }
        Self::notify(&state);
        true
    }

    /// No-payload transition, skipped when the mode is unchanged
    fn switch_plain(&self, payload: ModePayload) -> bool {
        let mut state = self.lock();
        if state.current.mode() == payload.mode() {
            debug!("Display mode already {}, nothing to do", payload.mode());
            return false;
        }
        Self::replace(&mut state, payload);
        Self::notify(&state);
        true
    }

    fn replace(state: &mut ControllerState, payload: ModePayload) {
        let previous = state.current.mode();
        state.current = Snapshot::new(payload);
        info!("Display mode changed: {} -> {}", previous, state.current.mode());
    }

    /// Push the current snapshot to every observer in registration order.
    ///
    /// A failing or panicking observer is logged and skipped.
    fn notify(state: &ControllerState) {
        for (index, observer) in state.observers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| observer.update(&state.current))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Observer {} failed to take {} snapshot: {}", index, state.current.mode(), e);
                }
                Err(_) => {
                    error!("Observer {} panicked on {} snapshot", index, state.current.mode());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every snapshot it is handed
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Snapshot>>,
    }

    impl Recorder {
        fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn last(&self) -> Snapshot {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Observer for Recorder {
        fn update(&self, snapshot: &Snapshot) -> Result<(), ObserverError> {
            self.seen.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    struct Failing;

    impl Observer for Failing {
        fn update(&self, _snapshot: &Snapshot) -> Result<(), ObserverError> {
            Err(ObserverError::Other("boom".to_string()))
        }
    }

    struct Panicking;

    impl Observer for Panicking {
        fn update(&self, _snapshot: &Snapshot) -> Result<(), ObserverError> {
            panic!("observer blew up");
        }
    }

    fn attached() -> (Controller, Arc<Recorder>) {
        let controller = Controller::new();
        let recorder = Arc::new(Recorder::default());
        controller.attach(recorder.clone());
        (controller, recorder)
    }

    #[test]
    fn test_starts_clear() {
        let controller = Controller::new();
        assert_eq!(controller.mode(), Mode::Clear);
        assert_eq!(controller.snapshot(), Snapshot::default());
    }

    #[test]
    fn test_redundant_plain_switch_is_noop() {
        let (controller, recorder) = attached();

        // Already clear at construction
        assert!(!controller.clear());
        assert_eq!(recorder.count(), 0);

        assert!(controller.cycle());
        assert!(controller.clear());
        assert!(!controller.clear());
        assert_eq!(recorder.count(), 2);
        assert_eq!(recorder.last().mode(), Mode::Clear);
    }

    #[test]
    fn test_progress_always_notifies_and_merges() {
        let (controller, recorder) = attached();

        for (i, pct) in [0.1_f32, 0.2, 0.3].iter().enumerate() {
            assert!(controller.progress("UPDATING", "FIRMWARE", *pct, "UPDATE", "FINISHED"));
            assert_eq!(recorder.count(), i + 1);
            assert_eq!(recorder.last().progress().unwrap().percentage, *pct);
        }

        controller.progress("FLASHING", "ROM", 0.4, "FLASHED", "OK");
        let payload = recorder.last().progress().cloned().unwrap();
        assert_eq!(payload.name, "FLASHING");
        assert_eq!(payload.detail_on_finish, "OK");
    }

    #[test]
    fn test_message_always_notifies() {
        let (controller, recorder) = attached();
        controller.message(Severity::Error, vec!["one".into()]);
        controller.message(Severity::Error, vec!["one".into()]);
        assert_eq!(recorder.count(), 2);
        assert_eq!(recorder.last().message().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_connection_updates_in_place() {
        let (controller, recorder) = attached();
        controller.connection(false, 1, vec!["Pairing".into(), "WPS".into()]);
        controller.connection(false, 2, vec!["Pairing".into(), "WPS".into()]);
        controller.connection(true, 2, vec!["Connected".into()]);
        assert_eq!(recorder.count(), 3);
        let payload = recorder.last().connection().cloned().unwrap();
        assert!(payload.established);
        assert_eq!(payload.attempt, 2);
    }

    #[test]
    fn test_switch_replaces_payload() {
        let (controller, recorder) = attached();
        controller.progress("A", "B", 0.5, "C", "D");
        controller.cycle();
        let last = recorder.last();
        assert_eq!(last.mode(), Mode::Cycle);
        assert!(last.progress().is_none());
    }

    #[test]
    fn test_attach_detach_idempotent() {
        let controller = Controller::new();
        let recorder: Arc<dyn Observer> = Arc::new(Recorder::default());
        controller.attach(recorder.clone());
        controller.attach(recorder.clone());
        assert_eq!(controller.observer_count(), 1);
        controller.detach(&recorder);
        controller.detach(&recorder);
        assert_eq!(controller.observer_count(), 0);
    }

    #[test]
    fn test_failing_observer_is_isolated() {
        let controller = Controller::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        controller.attach(first.clone());
        controller.attach(Arc::new(Failing));
        controller.attach(second.clone());

        assert!(controller.intro());
        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let controller = Controller::new();
        let recorder = Arc::new(Recorder::default());
        controller.attach(Arc::new(Panicking));
        controller.attach(recorder.clone());

        assert!(controller.warning());
        assert_eq!(recorder.count(), 1);
        // lock must still be usable afterwards
        assert_eq!(controller.mode(), Mode::Warning);
    }
}
