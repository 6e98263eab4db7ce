//! Human-readable error descriptions and structured JSON error formatting.

use rpm_core::error::{BuildError, ControlError};
use rpm_link::LinkError;

use crate::replay::ScriptError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        let BuildError::InvalidConfig(msg) = be;
        return format!(
            "What happened: Invalid controller settings ({msg}).\nLikely causes: Out-of-range values in [controller] or on the command line.\nHow to fix: Edit the config file or the override flags, then rerun."
        );
    }

    if let Some(se) = err.downcast_ref::<ScriptError>() {
        return format!(
            "What happened: Replay script is malformed ({se}).\nLikely causes: Unknown @directive or a bad argument.\nHow to fix: Use telemetry lines and @speed/@dir/@wait/@connect/@disconnect only."
        );
    }

    if let Some(le) = err.downcast_ref::<LinkError>() {
        return match le {
            LinkError::Address(a) => format!(
                "What happened: Could not resolve the link address ({a}).\nLikely causes: Typo in --tcp or link.tcp, or DNS unavailable.\nHow to fix: Use host:port, e.g. 127.0.0.1:7000."
            ),
            LinkError::Io(io) => format!(
                "What happened: Could not open the link ({io}).\nLikely causes: Device not paired/bound, wrong path, missing permissions, or bridge not listening.\nHow to fix: Check the device node or bridge, and that this user may open it (e.g. dialout group).\nDetail: {err}"
            ),
            LinkError::Closed | LinkError::Timeout => format!(
                "What happened: The link failed ({le}).\nLikely causes: Peripheral powered off or out of range.\nHow to fix: Reconnect the peripheral and rerun."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ControlError>() {
        return match ce {
            ControlError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file, then rerun. See etc/rpm_config.toml for a sample."
            ),
            ControlError::LinkDown(msg) => format!(
                "What happened: The peripheral link went down ({msg}).\nLikely causes: Peripheral reset, cable or radio dropout, or the bridge closed.\nHow to fix: Reconnect and start a new session."
            ),
            ControlError::SetpointOutOfRange(v) => format!(
                "What happened: Speed {v} is outside 0..=100.\nHow to fix: Pass a percent between 0 and 100."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 for usage/config problems, 3 for link failures, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() || err.downcast_ref::<ScriptError>().is_some() {
        return 2;
    }
    if err.downcast_ref::<LinkError>().is_some() {
        return 3;
    }
    match err.downcast_ref::<ControlError>() {
        Some(ControlError::Config(_) | ControlError::SetpointOutOfRange(_)) => 2,
        Some(ControlError::LinkDown(_) | ControlError::Transport(_)) => 3,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    if err.downcast_ref::<ScriptError>().is_some() {
        return "Script";
    }
    if err.downcast_ref::<LinkError>().is_some() {
        return "Link";
    }
    match err.downcast_ref::<ControlError>() {
        Some(ControlError::Config(_)) => "InvalidConfig",
        Some(ControlError::LinkDown(_) | ControlError::Transport(_)) => "LinkDown",
        Some(ControlError::SetpointOutOfRange(_)) => "SetpointOutOfRange",
        Some(_) => "Control",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "kind": "error",
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_2() {
        let e = eyre::Report::new(ControlError::Config("telemetry.prefix must not be empty".into()));
        assert_eq!(exit_code_for_error(&e), 2);
        assert!(humanize(&e).contains("telemetry.prefix"));
    }

    #[test]
    fn wrapped_link_errors_exit_3() {
        let e = eyre::Report::new(LinkError::Closed).wrap_err("open tcp 127.0.0.1:9");
        assert_eq!(exit_code_for_error(&e), 3);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "Link");
        assert_eq!(v["exit_code"], 3);
    }

    #[test]
    fn unknown_errors_exit_1() {
        let e = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&e), 1);
        assert!(humanize(&e).contains("Original: boom"));
    }
}
