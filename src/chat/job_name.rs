//! Job-name extraction from free text

use regex::Regex;
use std::sync::OnceLock;

fn job_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"for\s+the\s+job\s+named\s+"([^"]+)""#).expect("job name pattern is valid")
    })
}

/// Return the quoted value following `for the job named`, if any.
///
/// The literal words are case-sensitive; the first match wins.
pub fn extract_job_name(input: &str) -> Option<String> {
    job_name_pattern()
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
