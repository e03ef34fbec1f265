//! Persisted document envelope used for file import and export.

use crate::slides::Slide;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written into exported envelopes.
pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Envelope errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid document: no slides")]
    NoSlides,
}

/// On-disk shape of a presentation.
///
/// Any `version` is accepted on import; there is no migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEnvelope {
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub version: String,
    /// ISO-8601 timestamp.
    #[serde(default)]
    pub created_at: String,
}

impl DocumentEnvelope {
    /// Wrap slides for export, stamped with the current time.
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            slides,
            version: ENVELOPE_VERSION.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Serialize as indented JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse an envelope. A missing or empty slide list is rejected.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let envelope: Self = serde_json::from_str(json)?;
        if envelope.slides.is_empty() {
            return Err(DocumentError::NoSlides);
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::{Blob, EMPTY_SCENE};

    #[test]
    fn test_export_shape() {
        let mut slide = Slide::new("Slide 1");
        slide.thumbnail = Some("data:image/png;base64,AA==".to_string());
        let json = DocumentEnvelope::new(vec![slide]).to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], ENVELOPE_VERSION);
        assert!(value["createdAt"].as_str().unwrap().ends_with('Z'));
        assert_eq!(value["slides"][0]["name"], "Slide 1");
        assert_eq!(value["slides"][0]["content"], EMPTY_SCENE);
        assert!(json.contains("\n  \"slides\""));
    }

    #[test]
    fn test_unknown_version_accepted() {
        let json = r#"{
            "slides": [{"id": "1", "name": "Intro", "content": "{\"objects\":[]}"}],
            "version": "0.0.1-legacy",
            "createdAt": "not even a date"
        }"#;
        let envelope = DocumentEnvelope::from_json(json).unwrap();
        assert_eq!(envelope.version, "0.0.1-legacy");
        assert_eq!(envelope.slides[0].id.as_str(), "1");
        assert_eq!(envelope.slides[0].content, Blob::from(r#"{"objects":[]}"#));
        assert!(envelope.slides[0].thumbnail.is_none());
    }

    #[test]
    fn test_missing_version_accepted() {
        let json = r#"{"slides": [{"id": "a", "name": "A", "content": ""}]}"#;
        let envelope = DocumentEnvelope::from_json(json).unwrap();
        assert_eq!(envelope.version, "");
    }

    #[test]
    fn test_missing_slides_rejected() {
        assert!(matches!(
            DocumentEnvelope::from_json(r#"{"version": "1.0.0"}"#),
            Err(DocumentError::Parse(_))
        ));
        assert!(matches!(
            DocumentEnvelope::from_json(r#"{"slides": []}"#),
            Err(DocumentError::NoSlides)
        ));
    }

    #[test]
    fn test_round_trip() {
        let envelope = DocumentEnvelope::new(vec![Slide::new("Slide 1"), Slide::new("Slide 2")]);
        let parsed = DocumentEnvelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(parsed, envelope);
    }
}
