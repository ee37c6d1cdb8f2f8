//! Completion detection for streamed HTML artifacts.
//!
//! Detection is deliberately lenient substring matching, not parsing:
//! it runs on every buffer growth so a live preview can render as soon
//! as a structurally plausible document exists. Markers appearing
//! inside string literals or comments can false-positive; callers rely
//! on the lenient behavior for partial-stream preview, and the strict
//! check happens only once at stream end via [`validate_artifact`].

use draftfun_types::error::SessionError;

const OPEN_MARKERS: [&str; 2] = ["<!DOCTYPE", "<html"];
const CLOSE_MARKER: &str = "</html>";

/// Whether the buffer so far plausibly contains a complete document:
/// a recognized open marker with the close marker occurring after it.
/// Case-sensitive substring search. False negatives while the stream
/// is still running are expected.
pub fn is_complete(buffer: &str) -> bool {
    let open = OPEN_MARKERS
        .iter()
        .filter_map(|marker| buffer.find(marker))
        .min();
    match open {
        Some(open_at) => buffer[open_at..].contains(CLOSE_MARKER),
        None => false,
    }
}

/// Authoritative check run at terminal `done` before a commit.
///
/// Beyond plausible completion, the artifact contract forbids any
/// wrapping around the document: leading prose or a markdown code
/// fence is a format violation, not a valid artifact.
pub fn validate_artifact(buffer: &str) -> Result<(), SessionError> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Err(SessionError::IncompleteArtifact(
            "stream produced no output".to_string(),
        ));
    }
    if trimmed.starts_with("```") {
        return Err(SessionError::IncompleteArtifact(
            "artifact is wrapped in a code fence".to_string(),
        ));
    }
    if !OPEN_MARKERS.iter().any(|marker| trimmed.starts_with(marker)) {
        return Err(SessionError::IncompleteArtifact(
            "output does not begin with a document declaration".to_string(),
        ));
    }
    if !trimmed.contains(CLOSE_MARKER) {
        return Err(SessionError::IncompleteArtifact(
            "output has no closing </html> tag".to_string(),
        ));
    }
    Ok(())
}
