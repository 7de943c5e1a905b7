//! Share-link encoding: settings mirrored into `gmt`, `h12` and `theme`
//! query parameters, e.g. `?gmt=7&h12=1&theme=Black`.

use url::Url;
use url::form_urlencoded;

use crate::settings::{MAX_UTC_OFFSET_HOURS, MIN_UTC_OFFSET_HOURS, Settings};

const KEYS: [&str; 3] = ["gmt", "h12", "theme"];

/// Encode the shareable subset of `settings` as a query string (no leading `?`).
pub fn to_query(settings: &Settings) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("gmt", &settings.utc_offset_hours.to_string())
        .append_pair("h12", if settings.twelve_hour { "1" } else { "0" })
        .append_pair("theme", &settings.theme)
        .finish()
}

/// Rewrite `base` so its query carries the current settings, keeping any
/// unrelated parameters.
pub fn share_url(base: &str, settings: &Settings) -> eyre::Result<String> {
    let mut url = Url::parse(base).map_err(|e| eyre::eyre!("invalid share base URL: {e}"))?;
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !KEYS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut q = url.query_pairs_mut();
        q.clear();
        for (k, v) in &others {
            q.append_pair(k, v);
        }
        q.append_pair("gmt", &settings.utc_offset_hours.to_string())
            .append_pair("h12", if settings.twelve_hour { "1" } else { "0" })
            .append_pair("theme", &settings.theme);
    }
    Ok(url.into())
}

fn query_pairs(input: &str) -> Vec<(String, String)> {
    let trimmed = input.trim();
    if trimmed.contains("://")
        && let Ok(url) = Url::parse(trimmed)
    {
        return url.query_pairs().into_owned().collect();
    }
    let raw = trimmed.strip_prefix('?').unwrap_or(trimmed);
    form_urlencoded::parse(raw.as_bytes()).into_owned().collect()
}

/// Apply overrides from a share link (full URL or bare query) onto `settings`.
///
/// - `gmt` is taken only when it parses as a finite number in [-12, 14].
/// - `h12` is true for `1` or a case-insensitive `true`, false otherwise.
/// - `theme` is taken verbatim when non-empty.
///
/// Returns true when any setting changed.
pub fn apply_query(settings: &mut Settings, input: &str) -> bool {
    let before = settings.clone();
    for (key, value) in query_pairs(input) {
        match key.as_str() {
            "gmt" => {
                if let Ok(v) = value.trim().parse::<f64>()
                    && v.is_finite()
                    && (MIN_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&v)
                {
                    settings.utc_offset_hours = v;
                }
            }
            "h12" => {
                settings.twelve_hour = value == "1" || value.eq_ignore_ascii_case("true");
            }
            "theme" => {
                if !value.trim().is_empty() {
                    settings.theme = value;
                }
            }
            _ => {}
        }
    }
    let changed = *settings != before;
    if changed {
        *settings = settings.clone().sanitized();
    }
    changed
}
