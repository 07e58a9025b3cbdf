use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// The stream breaks with an error at this point.
    #[serde(rename = "stream_error")]
    StreamError,
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request itself is rejected before any event.
    #[serde(default)]
    pub rejected: bool,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            rejected: false,
        }
    }

    /// Creates a `PresetResponse` that streams `text` as a single delta.
    #[inline]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Creates a `PresetResponse` whose request fails outright.
    #[inline]
    pub fn rejected() -> Self {
        Self {
            events: vec![],
            rejected: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_script() {
        let script = r#"[
            {"events": [{"type": "message_delta", "data": "Cats purr."}]},
            {"events": [], "rejected": true},
            {"events": [
                {"type": "message_delta", "data": "Dogs"},
                {"type": "stream_error"}
            ]}
        ]"#;
        let script: Vec<PresetResponse> = serde_json::from_str(script).unwrap();
        assert_eq!(script[0], PresetResponse::with_text("Cats purr."));
        assert_eq!(script[1], PresetResponse::rejected());
        assert_eq!(script[2].events.last(), Some(&PresetEvent::StreamError));
    }
}
