use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

static DURATION_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h)").unwrap());

/// Parse a Go-style duration such as `30m`, `1h30m`, `1.5h` or `500ms`.
/// A leading `+` is accepted; negative windows are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.starts_with('-') {
        return Err(format!("invalid duration \"{}\": must not be negative", input));
    }
    let s = input.strip_prefix('+').unwrap_or(input);
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let invalid = || format!("invalid duration \"{}\"", input);

    let mut nanos = 0f64;
    let mut consumed = 0;
    for caps in DURATION_PART.captures_iter(s) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();

        let value: f64 = caps[1].parse().map_err(|_| invalid())?;
        let unit = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            _ => 3600e9,
        };
        nanos += value * unit;
    }

    if consumed == 0 || consumed != s.len() {
        return Err(invalid());
    }
    if nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Cloud Logging exports pod label `app.kubernetes.io/name` as `k8s-pod/app_kubernetes_io/name`.
pub fn pod_label_key(key: &str) -> String {
    format!("k8s-pod/{}", key.replace('.', "_"))
}

/// Turn a selector's match labels into one Cloud Logging clause, AND-ing every pair.
pub fn match_labels_to_filter(match_labels: &BTreeMap<String, String>) -> Option<String> {
    let clauses: Vec<String> = match_labels
        .iter()
        .map(|(k, v)| format!("labels.{}=\"{}\"", pod_label_key(k), v))
        .collect();
    match clauses.len() {
        0 => None,
        1 => clauses.into_iter().next(),
        _ => Some(format!("({})", clauses.join(" AND "))),
    }
}

/// Percent-encode a value for use inside a URL path segment or query value.
pub fn escape_url_component(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}
