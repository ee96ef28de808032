//! Queue record wire shape.

use serde::{Deserialize, Serialize};

use loopwear_returns::{ReturnStage, UnknownStage};

/// One queued return event as written to disk.
///
/// Field names are camelCase on the wire (the storefront producers are
/// JS-shaped). `status` stays a raw string so records carrying a kind this
/// version does not know about still parse; the processor decides what to do
/// with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedReturnEvent {
    pub session_id: String,
    pub status: String,
}

impl QueuedReturnEvent {
    pub fn new(session_id: impl Into<String>, stage: ReturnStage) -> Self {
        Self {
            session_id: session_id.into(),
            status: stage.as_str().to_string(),
        }
    }

    pub fn stage(&self) -> Result<ReturnStage, UnknownStage> {
        self.status.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_camel_case() {
        let record = QueuedReturnEvent::new("cs_123", ReturnStage::Cleaning);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"sessionId":"cs_123","status":"cleaning"}"#);
    }

    #[test]
    fn unknown_status_still_parses_as_a_record() {
        let record: QueuedReturnEvent =
            serde_json::from_str(r#"{"sessionId":"cs_1","status":"vaporized"}"#).unwrap();
        assert!(record.stage().is_err());
    }
}
