// Navigation history with a leave-confirmation guard.
// While a route is guarded, navigation attempts are held until they are
// confirmed or dropped; otherwise the stack behaves like plain history.

/// Guard status driving a leave-confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockerState {
    /// No attempt is being held.
    #[default]
    Unblocked,
    /// An attempt is held and awaits `proceed` or `reset`.
    Blocked,
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavResult {
    /// The attempt was applied to the stack.
    Completed,
    /// The guard held the attempt; the stack is unchanged.
    Blocked,
}

/// A navigation attempt deferred by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending<R> {
    Push(R),
    Back,
}

/// Route history with guard support, generic over the caller's route type.
#[derive(Debug)]
pub struct History<R> {
    /// Stack of routes (bottom = root, top = current)
    stack: Vec<R>,
    guarded: bool,
    pending: Option<Pending<R>>,
}

impl<R> History<R> {
    /// Create a history rooted at the given route.
    pub fn new(root: R) -> Self {
        Self {
            stack: vec![root],
            guarded: false,
            pending: None,
        }
    }

    /// Get the current route.
    pub fn current(&self) -> &R {
        self.stack.last().expect("Stack should never be empty")
    }

    /// Get the depth of the history stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Check if we can go back (not at root).
    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    /// Arm or disarm the leave guard for the current route. Disarming also
    /// drops any held attempt.
    pub fn set_guard(&mut self, guarded: bool) {
        self.guarded = guarded;
        if !guarded {
            self.pending = None;
        }
    }

    pub fn is_guarded(&self) -> bool {
        self.guarded
    }

    /// Guard status; blocked while an attempt awaits confirmation.
    pub fn blocker_state(&self) -> BlockerState {
        if self.pending.is_some() {
            BlockerState::Blocked
        } else {
            BlockerState::Unblocked
        }
    }

    /// Attempt to navigate to `route`. A guarded current route holds the
    /// attempt instead; a newer attempt replaces a held one.
    pub fn try_push(&mut self, route: R) -> NavResult {
        if self.guarded {
            self.pending = Some(Pending::Push(route));
            return NavResult::Blocked;
        }
        self.stack.push(route);
        NavResult::Completed
    }

    /// Attempt to go back one route. A no-op at the root.
    pub fn try_back(&mut self) -> NavResult {
        if self.guarded && self.can_go_back() {
            self.pending = Some(Pending::Back);
            return NavResult::Blocked;
        }
        if self.can_go_back() {
            self.stack.pop();
        }
        NavResult::Completed
    }

    /// Confirm the held attempt and apply it. Leaving the guarded route
    /// disarms the guard. Returns false when nothing was held.
    pub fn proceed(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.guarded = false;
        match pending {
            Pending::Push(route) => self.stack.push(route),
            Pending::Back => {
                if self.can_go_back() {
                    self.stack.pop();
                }
            }
        }
        true
    }

    /// Drop the held attempt and stay on the current route. The guard
    /// stays armed.
    pub fn reset(&mut self) {
        self.pending = None;
    }
}
