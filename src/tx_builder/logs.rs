//! Human-readable messages from program logs
//!
//! Order of preference: a structured Anchor error, then token-program
//! transfer heuristics, then any line the runtime did not emit itself,
//! then the caller's fallback.

use once_cell::sync::Lazy;
use regex::Regex;

static ANCHOR_ERROR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^Program log: AnchorError.*?Error Code: (\w+)\. Error Number: (\d+)\. Error Message:\s*(.*)$",
    )
    .ok()
});

/// Structured error decoded from an Anchor program log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorErrorLog {
    pub code: String,
    pub number: u32,
    pub message: String,
}

/// First Anchor error found in `logs`.
pub fn parse_anchor_error(logs: &[String]) -> Option<AnchorErrorLog> {
    let re = ANCHOR_ERROR.as_ref()?;
    logs.iter().find_map(|line| {
        let caps = re.captures(line.trim_end())?;
        Some(AnchorErrorLog {
            code: caps.get(1)?.as_str().to_string(),
            number: caps.get(2)?.as_str().parse().ok()?,
            message: caps.get(3)?.as_str().to_string(),
        })
    })
}

fn clean_program_log(line: &str) -> &str {
    let line = line
        .strip_prefix("Program log:")
        .map(str::trim_start)
        .unwrap_or(line);
    line.strip_prefix("Error:").map(str::trim_start).unwrap_or(line)
}

/// Best-effort message for a failed transaction.
pub fn error_message_from_logs(logs: &[String], fallback: &str) -> String {
    if logs.is_empty() {
        return fallback.to_string();
    }

    if let Some(anchor) = parse_anchor_error(logs) {
        return anchor.message;
    }

    let token_errors: Vec<&str> = logs
        .iter()
        .filter(|l| l.starts_with("Transfer:") || l.contains("Error: insufficient funds"))
        .map(|l| clean_program_log(l))
        .collect();
    if !token_errors.is_empty() {
        return token_errors.join("\n");
    }

    let generic: Vec<&str> = logs
        .iter()
        .filter(|l| !l.starts_with("Program "))
        .map(String::as_str)
        .collect();
    if !generic.is_empty() {
        return generic.join("\n");
    }

    fallback.to_string()
}
