//! Compilation state machine

use std::fmt;
use tracing::debug;

/// State of one compilation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileState {
    /// Accepted, nothing done yet
    Pending,
    /// Rule text → structured rules
    Extracting,
    /// Looking up exemplars
    Retrieving,
    /// Filling the template
    Generating,
    /// Checking the candidate
    Validating,
    /// Every document validated
    Succeeded,
    /// Terminal failure
    Failed,
}

impl CompileState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileState::Pending => "pending",
            CompileState::Extracting => "extracting",
            CompileState::Retrieving => "retrieving",
            CompileState::Generating => "generating",
            CompileState::Validating => "validating",
            CompileState::Succeeded => "succeeded",
            CompileState::Failed => "failed",
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, CompileState::Succeeded | CompileState::Failed)
    }

    /// Whether `next` may follow this state
    ///
    /// Extracting and Generating may repeat (timeout retries); Validating
    /// returns to Generating on rejection, or to Retrieving when the next
    /// table of a request starts. Any live state may fail.
    pub fn can_transition_to(&self, next: CompileState) -> bool {
        use CompileState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Pending, Extracting) => true,
            (Extracting, Extracting | Retrieving) => true,
            (Retrieving, Generating) => true,
            (Generating, Generating | Validating) => true,
            (Validating, Generating | Retrieving | Succeeded) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CompileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Visited states of one request, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTrace {
    states: Vec<CompileState>,
}

impl StateTrace {
    /// A trace positioned at Pending
    pub fn new() -> Self {
        Self {
            states: vec![CompileState::Pending],
        }
    }

    /// Current state
    pub fn current(&self) -> CompileState {
        self.states.last().copied().unwrap_or(CompileState::Pending)
    }

    /// Move to `next`
    ///
    /// Returns false, leaving the trace unchanged, if the transition is not
    /// allowed.
    pub fn advance(&mut self, next: CompileState) -> bool {
        let current = self.current();
        if !current.can_transition_to(next) {
            debug!(from = %current, to = %next, "Rejected state transition");
            return false;
        }
        debug!(from = %current, to = %next, "State transition");
        self.states.push(next);
        true
    }

    /// Visited states
    pub fn states(&self) -> &[CompileState] {
        &self.states
    }

    /// Consume and return the visited states
    pub fn into_states(self) -> Vec<CompileState> {
        self.states
    }
}

impl Default for StateTrace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CompileState::*;

    #[test]
    fn test_happy_path() {
        let mut trace = StateTrace::new();
        for next in [Extracting, Retrieving, Generating, Validating, Succeeded] {
            assert!(trace.advance(next));
        }
        assert_eq!(
            trace.states(),
            &[Pending, Extracting, Retrieving, Generating, Validating, Succeeded]
        );
        assert!(trace.current().is_terminal());
    }

    #[test]
    fn test_validation_failure_regenerates() {
        let mut trace = StateTrace::new();
        for next in [Extracting, Retrieving, Generating, Validating, Generating, Validating] {
            assert!(trace.advance(next));
        }
        assert!(trace.advance(Failed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Pending.can_transition_to(Generating));
        assert!(!Retrieving.can_transition_to(Validating));
        assert!(!Extracting.can_transition_to(Succeeded));
        assert!(!Succeeded.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Extracting));
    }

    #[test]
    fn test_rejected_transition_leaves_trace() {
        let mut trace = StateTrace::new();
        assert!(!trace.advance(Validating));
        assert_eq!(trace.states(), &[Pending]);
    }

    #[test]
    fn test_every_live_state_can_fail() {
        for state in [Pending, Extracting, Retrieving, Generating, Validating] {
            assert!(state.can_transition_to(Failed));
        }
    }
}
