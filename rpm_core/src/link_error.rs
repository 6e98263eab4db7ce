//! Maps `Box<dyn Error>` from trait boundaries to typed `ControlError`.
//!
//! The traits in `rpm_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `rpm_link::LinkError` downcasting.

use crate::error::ControlError;

/// Map a send-side trait-boundary error to a typed `ControlError`.
///
/// Attempts to downcast known link error types first, then falls back
/// to string-based heuristics.
pub fn map_link_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    #[cfg(feature = "link-errors")]
    {
        if let Some(link) = e.downcast_ref::<rpm_link::LinkError>() {
            return match link {
                rpm_link::LinkError::Closed => ControlError::LinkDown(link.to_string()),
                rpm_link::LinkError::Io(io) if is_disconnect(io.kind()) => {
                    ControlError::LinkDown(io.to_string())
                }
                other => ControlError::Transport(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>()
        && is_disconnect(io.kind())
    {
        return ControlError::LinkDown(io.to_string());
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_ascii_lowercase();
    if lower.contains("closed") || lower.contains("broken pipe") || lower.contains("not connected")
    {
        ControlError::LinkDown(s)
    } else {
        ControlError::Transport(s)
    }
}

fn is_disconnect(kind: std::io::ErrorKind) -> bool {
    use std::io::ErrorKind::*;
    matches!(
        kind,
        BrokenPipe | ConnectionReset | ConnectionAborted | NotConnected | UnexpectedEof
    )
}
