//! Fixed-point amount helpers
//!
//! Quote amounts are integers in the smallest unit of a 6-decimal stablecoin.
//! They are compared and formatted with integer arithmetic only; amounts can
//! exceed the range a double represents exactly.

/// Smallest units per whole quote unit (6 decimals).
pub const QUOTE_UNIT: i128 = 1_000_000;

/// Goals below this are almost certainly test launches.
pub const MIN_GOAL_THRESHOLD: i128 = 1_000 * QUOTE_UNIT;

/// Raises below this are almost certainly test launches.
pub const MIN_RAISED_THRESHOLD: i128 = 100 * QUOTE_UNIT;

/// Smallest units per displayed cent.
const UNITS_PER_CENT: i128 = QUOTE_UNIT / 100;

/// Placeholder shown for absent or unreadable amounts.
pub const MISSING_AMOUNT: &str = "—";

/// Parse an integer amount string. Empty or malformed input is `None`.
pub fn parse_raw_amount(raw: &str) -> Option<i128> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i128>().ok()
}

/// Heuristic flag for launches that look like test deployments.
///
/// True when a known goal is below [`MIN_GOAL_THRESHOLD`] or a known raised
/// amount is below [`MIN_RAISED_THRESHOLD`]. Unknown amounts never trigger it.
pub fn is_likely_test(goal: Option<&str>, raised: Option<&str>) -> bool {
    let goal_low = goal
        .and_then(parse_raw_amount)
        .is_some_and(|g| g < MIN_GOAL_THRESHOLD);
    let raised_low = raised
        .and_then(parse_raw_amount)
        .is_some_and(|r| r < MIN_RAISED_THRESHOLD);
    goal_low || raised_low
}

/// Format a raw amount as US dollars with cents, e.g. `$1,234.56`.
///
/// Rounds half away from zero to the cent.
pub fn format_usd(raw: Option<&str>) -> String {
    let Some(value) = raw.and_then(parse_raw_amount) else {
        return MISSING_AMOUNT.to_string();
    };

    let negative = value < 0;
    let magnitude = value.unsigned_abs();
    let per_cent = UNITS_PER_CENT as u128;
    let cents = (magnitude + per_cent / 2) / per_cent;
    let dollars = cents / 100;
    let remainder = cents % 100;

    let sign = if negative && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, group_thousands(dollars), remainder)
}

/// Inverse of [`format_usd`]: `$1,234.56` back to raw units.
pub fn parse_usd(text: &str) -> Option<i128> {
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let digits: String = rest
        .strip_prefix('$')
        .unwrap_or(rest)
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits.as_str(), ""),
    };
    if whole.is_empty() || frac.len() > 6 {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole_units = whole.parse::<i128>().ok()?.checked_mul(QUOTE_UNIT)?;
    let frac_units = if frac.is_empty() {
        0
    } else {
        format!("{:0<6}", frac).parse::<i128>().ok()?
    };
    let value = whole_units.checked_add(frac_units)?;
    Some(if negative { -value } else { value })
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Human readable countdown: `Ended`, `2d 3h left`, `4h 10m left`, `7m left`.
pub fn format_time_remaining(seconds: u64) -> String {
    if seconds == 0 {
        return "Ended".to_string();
    }
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let mins = (seconds % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h left", days, hours)
    } else if hours > 0 {
        format!("{}h {}m left", hours, mins)
    } else {
        format!("{}m left", mins)
    }
}

/// `abcd...wxyz` for anything longer than 10 characters.
pub fn short_address(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 10 {
        return value.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
