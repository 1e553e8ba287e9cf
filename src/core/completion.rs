//! Completion handles for scripted warps
//!
//! A scripted warp is requested by external game logic (cutscenes, scripted
//! events) that needs to know when the transition finished or failed. The
//! handle is settled exactly once; the watcher half is polled by the caller.
//! Single-threaded, like the rest of the core.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use super::errors::WarpError;

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionState {
    Pending,
    Resolved,
    Rejected(WarpError),
}

/// Settler half, held by the orchestrator
#[derive(Debug)]
pub struct WarpCompletion {
    shared: Rc<RefCell<CompletionState>>,
}

/// Observer half, held by the requesting game logic
#[derive(Debug, Clone)]
pub struct CompletionWatcher {
    shared: Rc<RefCell<CompletionState>>,
}

impl WarpCompletion {
    pub fn new() -> (WarpCompletion, CompletionWatcher) {
        let shared = Rc::new(RefCell::new(CompletionState::Pending));
        (
            WarpCompletion {
                shared: Rc::clone(&shared),
            },
            CompletionWatcher { shared },
        )
    }

    pub fn resolve(self) {
        self.settle(CompletionState::Resolved);
    }

    pub fn reject(self, error: WarpError) {
        self.settle(CompletionState::Rejected(error));
    }

    fn settle(self, state: CompletionState) {
        let mut current = self.shared.borrow_mut();
        if *current != CompletionState::Pending {
            warn!("[warp] completion settled twice, ignoring");
            return;
        }
        *current = state;
    }
}

impl CompletionWatcher {
    pub fn state(&self) -> CompletionState {
        self.shared.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state() == CompletionState::Pending
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == CompletionState::Resolved
    }

    pub fn rejection(&self) -> Option<WarpError> {
        match self.state() {
            CompletionState::Rejected(err) => Some(err),
            _ => None,
        }
    }
}
