//! Immutable per-send values built from session state.

use crate::domain::activity::{Activity, ActivityId, Entity, StreamInfo};

use super::StreamPhase;

/// One outbound streaming send.
///
/// Built fresh from the session for every send and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdate {
    stream_id: Option<ActivityId>,
    phase: StreamPhase,
    sequence: u32,
    text: String,
}

impl StreamUpdate {
    pub fn new(
        stream_id: Option<ActivityId>,
        phase: StreamPhase,
        sequence: u32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            stream_id,
            phase,
            sequence,
            text: text.into(),
        }
    }

    pub fn stream_id(&self) -> Option<&ActivityId> {
        self.stream_id.as_ref()
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Renders the wire activity.
    ///
    /// The activity id is the stream id, so every send after the first
    /// targets the same message. Final sends always carry text, even empty.
    pub fn to_activity(&self) -> Activity {
        let mut activity = Activity::new(self.phase.activity_type());
        activity.id = self.stream_id.clone();
        if self.phase == StreamPhase::Final || !self.text.is_empty() {
            activity.text = Some(self.text.clone());
        }
        activity.with_entity(Entity::StreamInfo(StreamInfo {
            stream_id: self.stream_id.clone(),
            stream_type: self.phase,
            stream_sequence: self.sequence,
        }))
    }
}

/// Snapshot of a session that ended without a terminal marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCheckpoint {
    pub stream_id: Option<ActivityId>,
    pub phase: StreamPhase,
    pub sequence: u32,
    pub accumulated_text: String,
}

impl StreamCheckpoint {
    pub fn has_text(&self) -> bool {
        !self.accumulated_text.is_empty()
    }

    /// Final send that closes the stream with whatever was accumulated.
    ///
    /// Uses the next sequence number. `None` if the stream never got an id.
    pub fn final_update(&self) -> Option<StreamUpdate> {
        let stream_id = self.stream_id.clone()?;
        Some(StreamUpdate::new(
            Some(stream_id),
            StreamPhase::Final,
            self.sequence.saturating_add(1),
            self.accumulated_text.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activity::ActivityType;
    use serde_json::json;

    #[test]
    fn informative_activity_matches_wire_shape() {
        let update = StreamUpdate::new(None, StreamPhase::Informative, 1, "Getting the information...");

        assert_eq!(
            serde_json::to_value(update.to_activity()).unwrap(),
            json!({
                "type": "typing",
                "text": "Getting the information...",
                "entities": [{
                    "type": "streaminfo",
                    "streamType": "informative",
                    "streamSequence": 1
                }]
            })
        );
    }

    #[test]
    fn final_activity_is_a_message_targeting_the_stream() {
        let update = StreamUpdate::new(Some(ActivityId::new("a-1")), StreamPhase::Final, 5, "Hello, world");
        let activity = update.to_activity();

        assert_eq!(activity.activity_type, ActivityType::Message);
        assert_eq!(activity.id, Some(ActivityId::new("a-1")));
        assert_eq!(activity.text.as_deref(), Some("Hello, world"));
        let info = activity.entities[0].as_stream_info().unwrap();
        assert_eq!(info.stream_id, Some(ActivityId::new("a-1")));
        assert_eq!(info.stream_sequence, 5);
    }

    #[test]
    fn empty_final_still_carries_text_field() {
        let update = StreamUpdate::new(Some(ActivityId::new("a-1")), StreamPhase::Final, 2, "");
        assert_eq!(update.to_activity().text.as_deref(), Some(""));
    }

    #[test]
    fn checkpoint_final_update_uses_next_sequence() {
        let checkpoint = StreamCheckpoint {
            stream_id: Some(ActivityId::new("a-1")),
            phase: StreamPhase::Streaming,
            sequence: 7,
            accumulated_text: "partial".to_string(),
        };

        let update = checkpoint.final_update().unwrap();
        assert_eq!(update.sequence(), 8);
        assert_eq!(update.phase(), StreamPhase::Final);
        assert_eq!(update.text(), "partial");
    }

    #[test]
    fn checkpoint_without_stream_id_cannot_finish() {
        let checkpoint = StreamCheckpoint {
            stream_id: None,
            phase: StreamPhase::Informative,
            sequence: 1,
            accumulated_text: String::new(),
        };
        assert!(checkpoint.final_update().is_none());
        assert!(!checkpoint.has_text());
    }
}
