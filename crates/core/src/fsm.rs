//! Generic transition-table state machine.
//!
//! A reusable primitive with no knowledge of the reverse-logistics domain;
//! the storefront UI layer drives widget lifecycles with it and the job
//! crates are free to do the same. Note that the queue's event processor
//! dispatches events directly (one handler per event kind) rather than
//! through an FSM instance.
//!
//! The current state is a single mutable field. The machine is `Send` but
//! performs no synchronization; callers sharing one across tasks must wrap
//! it themselves.

use thiserror::Error;

/// One row of the transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S, E> {
    pub from: S,
    pub event: E,
    pub to: S,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FsmError {
    /// No transition matched the event in the current state.
    #[error("no transition for event `{event}` in state `{state}`")]
    NoTransition { event: String, state: String },
}

/// Transition-table state machine.
///
/// Transitions are matched **in order**: the first row whose `from` equals
/// the current state and whose `event` equals the sent event wins.
#[derive(Debug, Clone)]
pub struct StateMachine<S, E> {
    state: S,
    transitions: Vec<Transition<S, E>>,
}

impl<S, E> StateMachine<S, E>
where
    S: Clone + PartialEq + core::fmt::Debug,
    E: PartialEq + core::fmt::Debug,
{
    pub fn new(initial: S, transitions: Vec<Transition<S, E>>) -> Self {
        Self {
            state: initial,
            transitions,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Send an event, advancing to the matching transition's target state.
    ///
    /// Returns the new state, or [`FsmError::NoTransition`] when no row
    /// matches.
    pub fn send(&mut self, event: E) -> Result<&S, FsmError> {
        match self.find_target(&event) {
            Some(to) => {
                self.state = to;
                Ok(&self.state)
            }
            None => Err(FsmError::NoTransition {
                event: format!("{event:?}"),
                state: format!("{:?}", self.state),
            }),
        }
    }

    /// Send an event; when no transition matches, adopt the state produced
    /// by `fallback(event, current_state)` instead of failing.
    pub fn send_with_fallback(&mut self, event: E, fallback: impl FnOnce(&E, &S) -> S) -> &S {
        let next = match self.find_target(&event) {
            Some(to) => to,
            None => fallback(&event, &self.state),
        };
        self.state = next;
        &self.state
    }

    fn find_target(&self, event: &E) -> Option<S> {
        self.transitions
            .iter()
            .find(|t| t.from == self.state && t.event == *event)
            .map(|t| t.to.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> StateMachine<&'static str, &'static str> {
        StateMachine::new(
            "idle",
            vec![
                Transition {
                    from: "idle",
                    event: "open",
                    to: "open",
                },
                Transition {
                    from: "open",
                    event: "close",
                    to: "idle",
                },
            ],
        )
    }

    #[test]
    fn matching_transition_advances_state() {
        let mut fsm = machine();
        assert_eq!(fsm.send("open").unwrap(), &"open");
        assert_eq!(fsm.state(), &"open");
        assert_eq!(fsm.send("close").unwrap(), &"idle");
    }

    #[test]
    fn unmatched_event_without_fallback_fails() {
        let mut fsm = machine();
        let err = fsm.send("close").unwrap_err();
        assert_eq!(
            err,
            FsmError::NoTransition {
                event: "\"close\"".to_string(),
                state: "\"idle\"".to_string(),
            }
        );
        // State is unchanged after a failed send.
        assert_eq!(fsm.state(), &"idle");
    }

    #[test]
    fn fallback_decides_the_next_state() {
        let mut fsm = machine();
        let next = fsm.send_with_fallback("explode", |event, state| {
            assert_eq!(event, &"explode");
            assert_eq!(state, &"idle");
            "error"
        });
        assert_eq!(next, &"error");
        assert_eq!(fsm.state(), &"error");
    }

    #[test]
    fn fallback_is_not_invoked_when_a_transition_matches() {
        let mut fsm = machine();
        let next = fsm.send_with_fallback("open", |_, _| panic!("fallback must not run"));
        assert_eq!(next, &"open");
    }

    #[test]
    fn first_matching_row_wins() {
        let mut fsm = StateMachine::new(
            "a",
            vec![
                Transition {
                    from: "a",
                    event: "go",
                    to: "b",
                },
                Transition {
                    from: "a",
                    event: "go",
                    to: "c",
                },
            ],
        );
        assert_eq!(fsm.send("go").unwrap(), &"b");
    }
}
