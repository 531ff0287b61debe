//! Pipeline states and the observer trait that reports them.
//!
//! A request walks a fixed state machine:
//!
//! ```text
//! Idle → InputCaptured → Extracting → Extracted → Prompting
//!      → Generating → Parsing → Ready | NeedsInput | Failed(kind)
//! ```
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::config::FlashgenConfigBuilder::observer`] to receive every
//! transition, e.g. to drive a spinner.
//!
//! # Example
//!
//! ```rust
//! use anki_flashgen::{FlashgenConfig, PipelineObserver, PipelineState};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PipelineObserver for Printer {
//!     fn on_transition(&self, _from: &PipelineState, to: &PipelineState) {
//!         eprintln!("→ {}", to.label());
//!     }
//! }
//!
//! let config = FlashgenConfig::builder()
//!     .observer(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::FailureKind;
use crate::pipeline::input::SourceKind;
use std::sync::Arc;

/// Where a request currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    InputCaptured(SourceKind),
    Extracting,
    /// Extraction finished with `chars` characters of text.
    Extracted { chars: usize },
    Prompting,
    Generating,
    Parsing,
    /// Parsing produced `cards` flashcards.
    Ready { cards: usize },
    /// No usable text; the user should supply content. A warning, not a fault.
    NeedsInput,
    Failed(FailureKind),
}

impl PipelineState {
    /// `true` once the request can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Ready { .. } | PipelineState::NeedsInput | PipelineState::Failed(_)
        )
    }

    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::InputCaptured(_) => "input captured",
            PipelineState::Extracting => "extracting text",
            PipelineState::Extracted { .. } => "text extracted",
            PipelineState::Prompting => "building prompt",
            PipelineState::Generating => "generating flashcards",
            PipelineState::Parsing => "parsing reply",
            PipelineState::Ready { .. } => "ready",
            PipelineState::NeedsInput => "needs input",
            PipelineState::Failed(_) => "failed",
        }
    }
}

/// Called by the pipeline on every state transition.
///
/// Implementations must be `Send + Sync`; one configuration may serve
/// several concurrent requests.
pub trait PipelineObserver: Send + Sync {
    fn on_transition(&self, from: &PipelineState, to: &PipelineState) {
        let _ = (from, to);
    }
}

/// Observer that ignores every event. Used when none is configured.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias matching the type stored in
/// [`crate::config::FlashgenConfig`].
pub type Observer = Arc<dyn PipelineObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<(PipelineState, PipelineState)>>);

    impl PipelineObserver for Recorder {
        fn on_transition(&self, from: &PipelineState, to: &PipelineState) {
            self.0.lock().unwrap().push((from.clone(), to.clone()));
        }
    }

    #[test]
    fn terminal_states() {
        assert!(PipelineState::Ready { cards: 3 }.is_terminal());
        assert!(PipelineState::NeedsInput.is_terminal());
        assert!(PipelineState::Failed(FailureKind::Parse).is_terminal());
        assert!(!PipelineState::Generating.is_terminal());
        assert!(!PipelineState::Idle.is_terminal());
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o: Observer = Arc::new(NoopObserver);
        o.on_transition(&PipelineState::Idle, &PipelineState::Extracting);
    }

    #[test]
    fn recorder_receives_events() {
        let r = Recorder(Mutex::new(Vec::new()));
        r.on_transition(&PipelineState::Idle, &PipelineState::InputCaptured(SourceKind::Pdf));
        r.on_transition(
            &PipelineState::InputCaptured(SourceKind::Pdf),
            &PipelineState::Extracting,
        );
        let events = r.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].1, PipelineState::Extracting);
    }
}
