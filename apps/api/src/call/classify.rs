//! Classification of gateway errors by their message text.

/// What the session should do with a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Empty payload emitted during call transitions.
    Empty,
    /// The provider reporting a meeting that ended normally.
    MeetingEnded,
    /// Browser clipboard permission denial surfaced by the transport.
    ClipboardDenied,
    /// Anything else: the session resets and the user is told.
    Unexpected(String),
}

/// Why a call could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartFailure {
    ClipboardDenied,
    /// Workflow id missing or otherwise not configured.
    Misconfigured(String),
    Other(String),
    /// No usable message; reset silently.
    Empty,
}

const MEETING_END_MARKERS: [&str; 3] = ["Meeting has ended", "Meeting ended", "ejection"];
const CLIPBOARD_MARKERS: [&str; 2] = ["Clipboard", "writeText"];
const MISCONFIGURED_MARKERS: [&str; 2] = ["workflow", "not configured"];

fn is_blank(message: &str) -> bool {
    let message = message.trim();
    message.is_empty() || message == "{}"
}

fn contains_any(message: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| message.contains(m))
}

pub fn classify_transport_error(message: Option<&str>) -> TransportError {
    let Some(message) = message.filter(|m| !is_blank(m)) else {
        return TransportError::Empty;
    };
    if contains_any(message, &MEETING_END_MARKERS) {
        TransportError::MeetingEnded
    } else if contains_any(message, &CLIPBOARD_MARKERS) {
        TransportError::ClipboardDenied
    } else {
        TransportError::Unexpected(message.to_string())
    }
}

pub fn classify_start_failure(message: &str) -> StartFailure {
    if contains_any(message, &CLIPBOARD_MARKERS) {
        StartFailure::ClipboardDenied
    } else if contains_any(message, &MISCONFIGURED_MARKERS) {
        StartFailure::Misconfigured(message.to_string())
    } else if is_blank(message) {
        StartFailure::Empty
    } else {
        StartFailure::Other(message.to_string())
    }
}

/// User-facing text for a start failure, or `None` when it should stay silent.
pub fn start_failure_alert(failure: &StartFailure) -> Option<String> {
    match failure {
        StartFailure::ClipboardDenied | StartFailure::Empty => None,
        StartFailure::Misconfigured(msg) => Some(format!(
            "Voice interview setup error: {msg}. Please use the interview form instead."
        )),
        StartFailure::Other(msg) => Some(format!(
            "Failed to start voice interview: {msg}. Please check your microphone permissions and try again."
        )),
    }
}

pub fn transport_error_alert(message: &str) -> String {
    format!("Voice interview error: {message}. Please try again.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payloads_are_noise() {
        assert_eq!(classify_transport_error(None), TransportError::Empty);
        assert_eq!(classify_transport_error(Some("")), TransportError::Empty);
        assert_eq!(classify_transport_error(Some("  {} ")), TransportError::Empty);
    }

    #[test]
    fn test_meeting_end_phrasings_are_noise() {
        for msg in [
            "Meeting has ended",
            "daily-error: Meeting ended due to ejection",
            "participant ejection",
        ] {
            let class = classify_transport_error(Some(msg));
            assert_eq!(class, TransportError::MeetingEnded, "{msg}");
        }
    }

    #[test]
    fn test_clipboard_denial_is_noise() {
        let class = classify_transport_error(Some("NotAllowedError: Clipboard write denied"));
        assert_eq!(class, TransportError::ClipboardDenied);
        assert_eq!(
            classify_transport_error(Some("writeText failed")),
            TransportError::ClipboardDenied
        );
    }

    #[test]
    fn test_other_errors_are_unexpected() {
        let class = classify_transport_error(Some("ICE connection failed"));
        assert_eq!(class, TransportError::Unexpected("ICE connection failed".to_string()));
    }

    #[test]
    fn test_start_failure_classes() {
        assert_eq!(
            classify_start_failure("Clipboard permission denied"),
            StartFailure::ClipboardDenied
        );
        assert!(matches!(
            classify_start_failure("Voice workflow id not configured"),
            StartFailure::Misconfigured(_)
        ));
        assert_eq!(classify_start_failure("{}"), StartFailure::Empty);
        assert!(matches!(
            classify_start_failure("microphone unavailable"),
            StartFailure::Other(_)
        ));
    }

    #[test]
    fn test_start_failure_alerts() {
        assert_eq!(start_failure_alert(&StartFailure::ClipboardDenied), None);
        let alert = start_failure_alert(&StartFailure::Misconfigured("workflow missing".into())).unwrap();
        assert!(alert.contains("interview form"));
        let alert = start_failure_alert(&StartFailure::Other("boom".into())).unwrap();
        assert!(alert.contains("boom"));
        assert!(alert.contains("microphone"));
    }
}
