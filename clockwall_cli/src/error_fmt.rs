//! Human-readable error descriptions and structured JSON error formatting.

use clockwall_core::error::{BuildError, ClockError};

/// Exit code for configuration problems (bad TOML, bad flags).
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when the display could not be written.
pub const EXIT_DISPLAY: i32 = 3;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDisplay => {
                "What happened: No display was provided to the clock runner.\nLikely causes: The display target failed to initialize or was not wired into the builder.\nHow to fix: Pass a display via with_display(...) before build().".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in [calibration].\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ClockError>() {
        return match ce {
            ClockError::SourceUnavailable { source_id, kind, detail } => format!(
                "What happened: Time source {source_id} failed ({kind}: {detail}).\nLikely causes: No network, a proxy or firewall, or the endpoint changed.\nHow to fix: Check [sources] in the config, or run with --offline."
            ),
            ClockError::CalibrationDegraded => {
                "What happened: No time source answered; the clock offset was left unchanged.\nLikely causes: No network access or every endpoint is unreachable.\nHow to fix: Check connectivity and [sources], raise calibration.request_timeout_ms, or use --offline.".to_string()
            }
            ClockError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: A typo in the TOML or an out-of-range flag.\nHow to fix: Edit the config or flags and try again."
            ),
            ClockError::Display(msg) => format!(
                "What happened: Could not write to the display ({msg}).\nLikely causes: The output pipe was closed or the terminal went away.\nHow to fix: Keep the reader attached, or redirect output to a file."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("ctrl-c") {
        return "What happened: Could not install the Ctrl-C handler.\nLikely causes: Another handler is already registered in this process.\nHow to fix: Run clockwall directly rather than embedded in another tool.".to_string();
    }

    if lower.contains("no such file") || lower.contains("permission denied") {
        return format!(
            "What happened: A file could not be accessed ({msg}).\nLikely causes: Wrong path or insufficient permissions.\nHow to fix: Check the --config / --settings paths."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 for configuration, 3 for display I/O, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(BuildError::InvalidConfig(_)) = err.downcast_ref::<BuildError>() {
        return EXIT_CONFIG;
    }
    match err.downcast_ref::<ClockError>() {
        Some(ClockError::Config(_)) => EXIT_CONFIG,
        Some(ClockError::Display(_)) => EXIT_DISPLAY,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDisplay => "MissingDisplay",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    match err.downcast_ref::<ClockError>() {
        Some(ClockError::SourceUnavailable { .. }) => "SourceUnavailable",
        Some(ClockError::CalibrationDegraded) => "CalibrationDegraded",
        Some(ClockError::Config(_)) => "Config",
        Some(ClockError::Display(_)) => "Display",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "exit_code": exit_code_for_error(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clockwall_core::SourceFailureKind;
    use rstest::rstest;

    #[rstest]
    #[case(ClockError::Config("x".into()), 2)]
    #[case(ClockError::Display("broken pipe".into()), 3)]
    #[case(ClockError::CalibrationDegraded, 1)]
    fn exit_codes(#[case] e: ClockError, #[case] code: i32) {
        assert_eq!(exit_code_for_error(&eyre::Report::new(e)), code);
    }

    #[test]
    fn invalid_build_config_is_a_config_exit() {
        let err = eyre::Report::new(BuildError::InvalidConfig("bad"));
        assert_eq!(exit_code_for_error(&err), EXIT_CONFIG);
        assert!(humanize(&err).contains("Invalid configuration (bad)"));
    }

    #[test]
    fn source_failures_name_the_source() {
        let err = eyre::Report::new(ClockError::SourceUnavailable {
            source_id: "origin:https://example.test".into(),
            kind: SourceFailureKind::Timeout,
            detail: "5s elapsed".into(),
        });
        let text = humanize(&err);
        assert!(text.contains("origin:https://example.test"));
        assert!(text.contains("timeout"));
    }

    #[test]
    fn json_errors_carry_reason_and_code() {
        let err = eyre::Report::new(ClockError::CalibrationDegraded);
        let v: serde_json::Value =
            serde_json::from_str(&format_error_json(&err)).expect("json");
        assert_eq!(v["reason"], "CalibrationDegraded");
        assert_eq!(v["exit_code"], 1);
        assert!(v["message"].as_str().is_some_and(|m| m.starts_with("What happened")));
    }

    #[test]
    fn plain_errors_fall_back_to_generic_text() {
        let err = eyre::eyre!("boom");
        assert!(humanize(&err).starts_with("Something went wrong."));
        assert_eq!(exit_code_for_error(&err), 1);
    }
}
