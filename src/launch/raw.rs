//! Version-specific launch account schemas
//!
//! Launch accounts arrive as decoded JSON whose shape depends on the
//! launchpad program version. Each version gets its own schema struct and
//! an adapter into [`LaunchFields`], the version-independent view the
//! normalizer works from. Every field is optional: a missing or oddly typed
//! field degrades to "absent" instead of rejecting the whole account.

use serde::Deserialize;
use serde_json::{Map, Number, Value};
use tracing::debug;

use super::state::{LaunchState, LaunchVersion};

/// Largest integer a JSON consumer can hold without precision loss.
const MAX_SAFE_JSON_INTEGER: u64 = 9_007_199_254_740_991;

/// One `(address, account)` pair as listed by an account source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LaunchAccountEntry {
    #[serde(rename = "publicKey")]
    pub address: String,
    #[serde(default)]
    pub account: Value,
}

impl LaunchAccountEntry {
    pub fn new(address: impl Into<String>, account: Value) -> Self {
        Self {
            address: address.into(),
            account,
        }
    }
}

/// Integer-like field: a plain number, a decimal string, or an
/// `Option<u64>` encoded as `{ "some": .. }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumeric {
    Optional { some: Value },
    Number(Number),
    Text(String),
    Other(Value),
}

impl RawNumeric {
    /// Strip one `{ "some": .. }` layer.
    ///
    /// Non-wrapped values are returned as they are; a wrapper around `null`
    /// is treated as absent.
    pub fn unwrap_optional(&self) -> Option<RawNumeric> {
        match self {
            RawNumeric::Optional { some } => {
                if some.is_null() {
                    return None;
                }
                serde_json::from_value(some.clone()).ok()
            }
            other => Some(other.clone()),
        }
    }

    /// Decimal string in the smallest unit, or `None` when the value
    /// cannot be expressed as one.
    pub fn to_amount_string(&self) -> Option<String> {
        match self.unwrap_optional()? {
            RawNumeric::Number(n) => Some(n.to_string()),
            RawNumeric::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            // only one wrapper layer is unwrapped
            RawNumeric::Optional { .. } | RawNumeric::Other(_) => None,
        }
    }

    /// Native integer (timestamps, durations).
    pub fn to_i64(&self) -> Option<i64> {
        match self.unwrap_optional()? {
            RawNumeric::Number(n) => n
                .as_i64()
                .or_else(|| n.as_u64().and_then(|v| i64::try_from(v).ok()))
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            RawNumeric::Text(s) => s.trim().parse::<i64>().ok(),
            RawNumeric::Optional { .. } | RawNumeric::Other(_) => None,
        }
    }
}

/// Address field: base58 text or a raw 32-byte array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAddress {
    Text(String),
    Bytes(Vec<u8>),
    Other(Value),
}

impl RawAddress {
    pub fn to_display(&self) -> Option<String> {
        match self {
            RawAddress::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            RawAddress::Bytes(bytes) if bytes.len() == 32 => {
                Some(bs58::encode(bytes).into_string())
            }
            _ => None,
        }
    }
}

/// v0.5 layout: mints are named after the token and USDC.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchV05 {
    pub state: Option<Value>,
    pub token_mint: Option<RawAddress>,
    pub usdc_mint: Option<RawAddress>,
    pub base_mint: Option<RawAddress>,
    pub quote_mint: Option<RawAddress>,
    pub total_committed_amount: Option<RawNumeric>,
    pub minimum_raise_amount: Option<RawNumeric>,
    pub final_raise_amount: Option<RawNumeric>,
    pub unix_timestamp_started: Option<RawNumeric>,
    pub seconds_for_launch: Option<RawNumeric>,
    pub token_name: Option<Value>,
    pub token_symbol: Option<Value>,
}

/// v0.6 layout, also read for v0.7: base/quote mint naming.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchV06 {
    pub state: Option<Value>,
    pub base_mint: Option<RawAddress>,
    pub quote_mint: Option<RawAddress>,
    pub token_mint: Option<RawAddress>,
    pub usdc_mint: Option<RawAddress>,
    pub total_committed_amount: Option<RawNumeric>,
    pub minimum_raise_amount: Option<RawNumeric>,
    pub final_raise_amount: Option<RawNumeric>,
    pub unix_timestamp_started: Option<RawNumeric>,
    pub seconds_for_launch: Option<RawNumeric>,
    pub token_name: Option<Value>,
    pub token_symbol: Option<Value>,
}

/// A decoded launch account tagged with the schema it was read with.
#[derive(Debug, Clone)]
pub enum RawLaunch {
    V05(LaunchV05),
    V06(LaunchV06),
    V07(LaunchV06),
}

/// Version-independent fields extracted from a [`RawLaunch`].
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchFields {
    /// Empty when no mint field could be read
    pub base_mint: String,
    /// Empty when no mint field could be read
    pub quote_mint: String,
    pub state: LaunchState,
    pub total_committed: Option<String>,
    pub minimum_raise: Option<String>,
    pub final_raise: Option<String>,
    pub started_at: Option<i64>,
    pub duration_secs: Option<i64>,
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
}

impl RawLaunch {
    /// Decode `account` with the schema for `version`.
    ///
    /// Anything that is not a JSON object decodes to an empty schema.
    pub fn from_value(version: LaunchVersion, account: &Value) -> Self {
        match version {
            LaunchVersion::V05 => RawLaunch::V05(decode_or_default(version, account)),
            LaunchVersion::V06 => RawLaunch::V06(decode_or_default(version, account)),
            LaunchVersion::V07 => RawLaunch::V07(decode_or_default(version, account)),
        }
    }

    pub fn version(&self) -> LaunchVersion {
        match self {
            RawLaunch::V05(_) => LaunchVersion::V05,
            RawLaunch::V06(_) => LaunchVersion::V06,
            RawLaunch::V07(_) => LaunchVersion::V07,
        }
    }

    pub fn fields(&self) -> LaunchFields {
        match self {
            RawLaunch::V05(raw) => LaunchFields {
                base_mint: first_address(&[&raw.base_mint, &raw.token_mint]),
                quote_mint: first_address(&[&raw.quote_mint, &raw.usdc_mint]),
                state: derive_state(raw.state.as_ref()),
                total_committed: amount(&raw.total_committed_amount),
                minimum_raise: amount(&raw.minimum_raise_amount),
                final_raise: amount(&raw.final_raise_amount),
                started_at: integer(&raw.unix_timestamp_started),
                duration_secs: integer(&raw.seconds_for_launch),
                token_name: text(&raw.token_name),
                token_symbol: text(&raw.token_symbol),
            },
            RawLaunch::V06(raw) | RawLaunch::V07(raw) => LaunchFields {
                base_mint: first_address(&[&raw.base_mint, &raw.token_mint]),
                quote_mint: first_address(&[&raw.quote_mint, &raw.usdc_mint]),
                state: derive_state(raw.state.as_ref()),
                total_committed: amount(&raw.total_committed_amount),
                minimum_raise: amount(&raw.minimum_raise_amount),
                final_raise: amount(&raw.final_raise_amount),
                started_at: integer(&raw.unix_timestamp_started),
                duration_secs: integer(&raw.seconds_for_launch),
                token_name: text(&raw.token_name),
                token_symbol: text(&raw.token_symbol),
            },
        }
    }
}

fn decode_or_default<T>(version: LaunchVersion, account: &Value) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    match serde_json::from_value(account.clone()) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!(version = %version, error = %e, "Launch account did not match schema, using empty fields");
            T::default()
        }
    }
}

fn first_address(candidates: &[&Option<RawAddress>]) -> String {
    candidates
        .iter()
        .filter_map(|c| c.as_ref().and_then(RawAddress::to_display))
        .next()
        .unwrap_or_default()
}

fn amount(field: &Option<RawNumeric>) -> Option<String> {
    field.as_ref().and_then(RawNumeric::to_amount_string)
}

fn integer(field: &Option<RawNumeric>) -> Option<i64> {
    field.as_ref().and_then(RawNumeric::to_i64)
}

fn text(field: &Option<Value>) -> Option<String> {
    field
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Derive the lifecycle state from the on-chain state enum.
///
/// The enum is either an object keyed by variant (`{ "live": {} }`) or a
/// bare variant name. Exactly one recognised variant must be present;
/// none, several, or only unrecognised keys yield [`LaunchState::Unknown`].
pub fn derive_state(state: Option<&Value>) -> LaunchState {
    let mut found: Option<LaunchState> = None;
    let keys: Vec<String> = match state {
        Some(Value::Object(map)) => map.keys().map(|k| k.to_ascii_lowercase()).collect(),
        Some(Value::String(s)) => vec![s.to_ascii_lowercase()],
        _ => return LaunchState::Unknown,
    };

    for key in &keys {
        if let Some(flag) = LaunchState::from_flag(key) {
            match found {
                None => found = Some(flag),
                // `complete` and `completed` name the same state
                Some(existing) if existing == flag => {}
                Some(_) => return LaunchState::Unknown,
            }
        }
    }

    found.unwrap_or(LaunchState::Unknown)
}

/// Display copy of an account for diagnostics.
///
/// 32-byte arrays become base58 addresses and integers beyond the safe
/// JSON range become decimal strings; everything else keeps its shape.
pub fn stringify_snapshot(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            if let Some(address) = as_address_bytes(items) {
                return Value::String(address);
            }
            Value::Array(items.iter().map(stringify_snapshot).collect())
        }
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                out.insert(key.clone(), stringify_snapshot(val));
            }
            Value::Object(out)
        }
        Value::Number(n) => match n.as_u64() {
            Some(v) if v > MAX_SAFE_JSON_INTEGER => Value::String(v.to_string()),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

fn as_address_bytes(items: &[Value]) -> Option<String> {
    if items.len() != 32 {
        return None;
    }
    let bytes: Option<Vec<u8>> = items
        .iter()
        .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect();
    bytes.map(|b| bs58::encode(b).into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_optional_strips_one_layer() {
        let wrapped: RawNumeric = serde_json::from_value(json!({ "some": "1500" })).unwrap();
        assert_eq!(wrapped.unwrap_optional(), Some(RawNumeric::Text("1500".to_string())));
        assert_eq!(wrapped.to_amount_string().as_deref(), Some("1500"));

        let none: RawNumeric = serde_json::from_value(json!({ "some": null })).unwrap();
        assert_eq!(none.unwrap_optional(), None);
        assert_eq!(none.to_amount_string(), None);
    }

    #[test]
    fn test_nested_wrappers_are_not_unwrapped() {
        let nested: RawNumeric =
            serde_json::from_value(json!({ "some": { "some": 5 } })).unwrap();
        assert_eq!(nested.to_amount_string(), None);
    }

    #[test]
    fn test_numeric_forms() {
        let n: RawNumeric = serde_json::from_value(json!(18446744073709551615u64)).unwrap();
        assert_eq!(n.to_amount_string().as_deref(), Some("18446744073709551615"));

        let s: RawNumeric = serde_json::from_value(json!(" 42 ")).unwrap();
        assert_eq!(s.to_amount_string().as_deref(), Some("42"));
        assert_eq!(s.to_i64(), Some(42));

        let obj: RawNumeric = serde_json::from_value(json!({ "words": [1, 2] })).unwrap();
        assert_eq!(obj.to_amount_string(), None);
        assert_eq!(obj.to_i64(), None);
    }

    #[test]
    fn test_address_forms() {
        let bytes: RawAddress = serde_json::from_value(json!(vec![0u8; 32])).unwrap();
        assert_eq!(bytes.to_display().as_deref(), Some("11111111111111111111111111111111"));

        let short: RawAddress = serde_json::from_value(json!([1, 2, 3])).unwrap();
        assert_eq!(short.to_display(), None);

        let empty: RawAddress = serde_json::from_value(json!("")).unwrap();
        assert_eq!(empty.to_display(), None);
    }

    #[test]
    fn test_derive_state_single_flag() {
        assert_eq!(derive_state(Some(&json!({ "live": {} }))), LaunchState::Live);
        assert_eq!(derive_state(Some(&json!({ "complete": {} }))), LaunchState::Completed);
        assert_eq!(derive_state(Some(&json!("Refunding"))), LaunchState::Refunding);
        assert_eq!(
            derive_state(Some(&json!({ "initialized": {} }))),
            LaunchState::Uninitialized
        );
    }

    #[test]
    fn test_derive_state_ambiguous_or_missing_is_unknown() {
        assert_eq!(
            derive_state(Some(&json!({ "live": {}, "closed": {} }))),
            LaunchState::Unknown
        );
        assert_eq!(derive_state(Some(&json!({}))), LaunchState::Unknown);
        assert_eq!(derive_state(Some(&json!({ "paused": {} }))), LaunchState::Unknown);
        assert_eq!(derive_state(Some(&json!(7))), LaunchState::Unknown);
        assert_eq!(derive_state(None), LaunchState::Unknown);
    }

    #[test]
    fn test_derive_state_complete_aliases_do_not_conflict() {
        assert_eq!(
            derive_state(Some(&json!({ "complete": {}, "completed": {} }))),
            LaunchState::Completed
        );
    }

    #[test]
    fn test_fields_prefer_first_mint_name() {
        let account = json!({
            "baseMint": "Base1111111111111111111111111111111111111",
            "tokenMint": "Token111111111111111111111111111111111111",
            "usdcMint": "Usdc1111111111111111111111111111111111111",
        });
        let fields = RawLaunch::from_value(LaunchVersion::V06, &account).fields();
        assert_eq!(fields.base_mint, "Base1111111111111111111111111111111111111");
        assert_eq!(fields.quote_mint, "Usdc1111111111111111111111111111111111111");
    }

    #[test]
    fn test_fields_mint_preference_is_the_same_for_every_version() {
        let account = json!({
            "baseMint": "Base1111111111111111111111111111111111111",
            "tokenMint": "Token111111111111111111111111111111111111",
            "quoteMint": "Quote111111111111111111111111111111111111",
            "usdcMint": "Usdc1111111111111111111111111111111111111",
        });
        for version in [LaunchVersion::V05, LaunchVersion::V06, LaunchVersion::V07] {
            let fields = RawLaunch::from_value(version, &account).fields();
            assert_eq!(fields.base_mint, "Base1111111111111111111111111111111111111");
            assert_eq!(fields.quote_mint, "Quote111111111111111111111111111111111111");
        }

        let legacy_names = json!({
            "tokenMint": "Token111111111111111111111111111111111111",
            "usdcMint": "Usdc1111111111111111111111111111111111111",
        });
        let fields = RawLaunch::from_value(LaunchVersion::V05, &legacy_names).fields();
        assert_eq!(fields.base_mint, "Token111111111111111111111111111111111111");
        assert_eq!(fields.quote_mint, "Usdc1111111111111111111111111111111111111");
    }

    #[test]
    fn test_fields_missing_mints_are_empty() {
        let fields = RawLaunch::from_value(LaunchVersion::V05, &json!({})).fields();
        assert_eq!(fields.base_mint, "");
        assert_eq!(fields.quote_mint, "");
        assert_eq!(fields.state, LaunchState::Unknown);
    }

    #[test]
    fn test_non_object_account_decodes_empty() {
        let raw = RawLaunch::from_value(LaunchVersion::V07, &json!("garbage"));
        assert_eq!(raw.version(), LaunchVersion::V07);
        assert_eq!(raw.fields().total_committed, None);
    }

    #[test]
    fn test_stringify_snapshot() {
        let snapshot = stringify_snapshot(&json!({
            "authority": vec![0u8; 32],
            "totalCommittedAmount": 18446744073709551615u64,
            "secondsForLaunch": 3600,
            "nested": { "some": [1, 2] },
        }));
        assert_eq!(snapshot["authority"], json!("11111111111111111111111111111111"));
        assert_eq!(snapshot["totalCommittedAmount"], json!("18446744073709551615"));
        assert_eq!(snapshot["secondsForLaunch"], json!(3600));
        assert_eq!(snapshot["nested"]["some"], json!([1, 2]));
    }
}
