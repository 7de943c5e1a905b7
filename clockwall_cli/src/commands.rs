//! Line commands read from stdin while the clock runs.

use clockwall_core::ControlEvent;

pub const HELP: &str = "commands: hide | show | h12 [on|off] | gmt <hours> | ui [hide|show] | theme <name> | cal | quit";

/// Parse one input line. `None` for blank or unknown input.
pub fn parse_command(line: &str) -> Option<ControlEvent> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?.to_ascii_lowercase();
    let arg = parts.next();

    match (head.as_str(), arg) {
        ("hide", None) => Some(ControlEvent::Visibility(false)),
        ("show", None) => Some(ControlEvent::Visibility(true)),
        ("h12" | "12h", None) => Some(ControlEvent::ToggleTwelveHour),
        ("h12" | "12h", Some(v)) => parse_switch(v).map(ControlEvent::SetTwelveHour),
        ("h24" | "24h", None) => Some(ControlEvent::SetTwelveHour(false)),
        ("gmt" | "utc", Some(v)) => v
            .trim_start_matches('+')
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite())
            .map(ControlEvent::SetUtcOffset),
        ("ui", None) => None,
        ("ui", Some(v)) => match v.to_ascii_lowercase().as_str() {
            "hide" | "off" => Some(ControlEvent::SetUiHidden(true)),
            "show" | "on" => Some(ControlEvent::SetUiHidden(false)),
            _ => None,
        },
        ("theme", Some(_)) => {
            // Theme names may contain spaces
            let name = line.trim_start()[head.len()..].trim();
            Some(ControlEvent::SetTheme(name.to_string()))
        }
        ("cal" | "calibrate", None) => Some(ControlEvent::Recalibrate),
        ("quit" | "q" | "exit", None) => Some(ControlEvent::Shutdown),
        _ => None,
    }
}

fn parse_switch(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "on" | "1" | "true" | "yes" => Some(true),
        "off" | "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hide", Some(ControlEvent::Visibility(false)))]
    #[case("  SHOW ", Some(ControlEvent::Visibility(true)))]
    #[case("h12", Some(ControlEvent::ToggleTwelveHour))]
    #[case("h12 off", Some(ControlEvent::SetTwelveHour(false)))]
    #[case("gmt -3.5", Some(ControlEvent::SetUtcOffset(-3.5)))]
    #[case("gmt +9", Some(ControlEvent::SetUtcOffset(9.0)))]
    #[case("gmt nope", None)]
    #[case("ui hide", Some(ControlEvent::SetUiHidden(true)))]
    #[case("theme Dark Blue", Some(ControlEvent::SetTheme("Dark Blue".into())))]
    #[case("cal", Some(ControlEvent::Recalibrate))]
    #[case("quit", Some(ControlEvent::Shutdown))]
    #[case("", None)]
    #[case("dance", None)]
    fn parses_commands(#[case] line: &str, #[case] expected: Option<ControlEvent>) {
        assert_eq!(parse_command(line), expected);
    }
}
