//! StreamPhase - the role of one streamed activity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::activity::ActivityType;
use crate::domain::foundation::StateMachine;

/// Phase of a streamed response, carried on the wire as `streamType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamPhase {
    /// Placeholder shown before any content arrives.
    Informative,
    /// Partial content.
    Streaming,
    /// Complete text; nothing follows it.
    Final,
}

impl StreamPhase {
    /// Activity type used on the wire for this phase.
    ///
    /// Only the final send is a real message; everything before it renders
    /// as a typing indicator.
    pub fn activity_type(&self) -> ActivityType {
        match self {
            StreamPhase::Final => ActivityType::Message,
            StreamPhase::Informative | StreamPhase::Streaming => ActivityType::Typing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamPhase::Informative => "informative",
            StreamPhase::Streaming => "streaming",
            StreamPhase::Final => "final",
        }
    }
}

impl StateMachine for StreamPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use StreamPhase::*;
        matches!(
            (self, target),
            (Informative, Streaming) | (Informative, Final) | (Streaming, Streaming) | (Streaming, Final)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use StreamPhase::*;
        match self {
            Informative | Streaming => vec![Streaming, Final],
            Final => vec![],
        }
    }
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod transitions {
        use super::*;

        #[test]
        fn informative_can_skip_straight_to_final() {
            assert!(StreamPhase::Informative.can_transition_to(&StreamPhase::Final));
        }

        #[test]
        fn streaming_can_repeat() {
            assert!(StreamPhase::Streaming.can_transition_to(&StreamPhase::Streaming));
        }

        #[test]
        fn nothing_returns_to_informative() {
            for from in [StreamPhase::Informative, StreamPhase::Streaming, StreamPhase::Final] {
                assert!(!from.can_transition_to(&StreamPhase::Informative));
            }
        }

        #[test]
        fn final_is_terminal() {
            assert!(StreamPhase::Final.is_terminal());
            assert!(StreamPhase::Final.transition_to(StreamPhase::Streaming).is_err());
        }
    }

    mod wire {
        use super::*;

        #[test]
        fn serializes_lowercase() {
            assert_eq!(serde_json::to_string(&StreamPhase::Informative).unwrap(), "\"informative\"");
            assert_eq!(serde_json::to_string(&StreamPhase::Final).unwrap(), "\"final\"");
        }

        #[test]
        fn only_final_is_a_message() {
            assert_eq!(StreamPhase::Final.activity_type(), ActivityType::Message);
            assert_eq!(StreamPhase::Streaming.activity_type(), ActivityType::Typing);
            assert_eq!(StreamPhase::Informative.activity_type(), ActivityType::Typing);
        }
    }
}
