//! Robots advisory check.
//!
//! The pipeline only honors the broadest signal: a wildcard group that
//! disallows everything. Anything narrower (or an unavailable robots.txt) is
//! treated as allowed; this is an advisory check, not a crawler.

/// True when the robots body carries a universal wildcard disallow: a
/// `User-agent: *` group containing `Disallow: /`.
pub fn disallows_all(robots: &str) -> bool {
    let mut in_wildcard_group = false;
    for line in robots.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match field.trim().to_ascii_lowercase().as_str() {
            "user-agent" => in_wildcard_group = value == "*",
            "disallow" if in_wildcard_group && value == "/" => return true,
            _ => {}
        }
    }
    false
}
