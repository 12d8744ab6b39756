use crate::error::EngineError;

/// Engine lifecycle.
///
/// ```text
///   Uninitialized ─▶ ProgramReady ─▶ TexturesLoading ─▶ Active
///         │               │                 │             │
///         └───────────────┴────────┬────────┴─────────────┘
///                                  ▼
///                               Disposed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    ProgramReady,
    TexturesLoading,
    Active,
    Disposed,
}

impl EngineState {
    fn can_advance_to(self, next: EngineState) -> bool {
        use EngineState::*;
        matches!(
            (self, next),
            (Uninitialized, ProgramReady)
                | (ProgramReady, TexturesLoading)
                | (TexturesLoading, Active)
                | (Uninitialized | ProgramReady | TexturesLoading | Active, Disposed)
        )
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: EngineState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: EngineState::Uninitialized,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn advance(&mut self, next: EngineState) -> Result<(), EngineError> {
        if !self.state.can_advance_to(next) {
            return Err(EngineError::Lifecycle {
                from: self.state,
                to: next,
            });
        }
        tracing::info!(from = ?self.state, to = ?next, "engine state changed");
        self.state = next;
        Ok(())
    }

    /// True once a program exists; input and resize are tracked from here on.
    pub fn accepts_events(&self) -> bool {
        matches!(
            self.state,
            EngineState::ProgramReady | EngineState::TexturesLoading | EngineState::Active
        )
    }

    pub fn is_active(&self) -> bool {
        self.state == EngineState::Active
    }

    pub fn is_disposed(&self) -> bool {
        self.state == EngineState::Disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_happy_path() {
        let mut lifecycle = Lifecycle::new();
        assert!(!lifecycle.accepts_events());
        lifecycle.advance(EngineState::ProgramReady).unwrap();
        assert!(lifecycle.accepts_events());
        lifecycle.advance(EngineState::TexturesLoading).unwrap();
        assert!(!lifecycle.is_active());
        lifecycle.advance(EngineState::Active).unwrap();
        assert!(lifecycle.is_active());
        lifecycle.advance(EngineState::Disposed).unwrap();
        assert!(lifecycle.is_disposed());
        assert!(!lifecycle.accepts_events());
    }

    #[test]
    fn rejects_skipping_texture_load() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(EngineState::ProgramReady).unwrap();
        let err = lifecycle.advance(EngineState::Active).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Lifecycle {
                from: EngineState::ProgramReady,
                to: EngineState::Active
            }
        ));
        assert_eq!(lifecycle.state(), EngineState::ProgramReady);
    }

    #[test]
    fn disposed_is_terminal() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(EngineState::Disposed).unwrap();
        assert!(lifecycle.advance(EngineState::ProgramReady).is_err());
        assert!(lifecycle.advance(EngineState::Disposed).is_err());
    }
}
