//! Line protocol for classifier events on stdin.
//!
//! One event per line, either a bare label or a JSON object:
//!
//! ```text
//! 0 Jeff_bezos
//! {"label": "3 Antonella_sgobba", "confidence": 0.93}
//! {"observations": [{"label": "1 Steve_jobs", "confidence": 0.4}, ...]}
//! {"error": "model failed to load"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Leading
//! whitespace is ignored for that check and for spotting JSON, so a label
//! whose first non-blank character is `#` or `{` must be sent in the JSON
//! form, e.g. `{"label": "#3 guest"}`.

use gatepass_core::classifier::best_of;
use gatepass_core::{Classification, ClassifierError};
use gatepass_net::ClassifierEvent;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireEvent {
    Label {
        label: String,
        #[serde(default)]
        confidence: Option<f32>,
    },
    Observations {
        observations: Vec<Classification>,
    },
    Error {
        error: String,
    },
}

/// Parse one stdin line. `None` means the line carries no event.
pub fn parse_line(line: &str) -> Option<Result<ClassifierEvent, serde_json::Error>> {
    // Labels match exactly, so only the line terminator is stripped.
    let line = line.strip_suffix('\r').unwrap_or(line);
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() || trimmed.starts_with('#') {
        return None;
    }

    if !trimmed.starts_with('{') {
        return Some(Ok(Ok(Classification::new(line))));
    }

    Some(serde_json::from_str::<WireEvent>(trimmed).map(|wire| match wire {
        WireEvent::Label { label, confidence } => Ok(Classification { label, confidence }),
        WireEvent::Observations { observations } => best_of(observations),
        WireEvent::Error { error } => Err(ClassifierError::ModelUnavailable(error)),
    }))
}
