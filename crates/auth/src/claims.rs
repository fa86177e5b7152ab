//! Bearer-token claim extraction.
//!
//! Only the payload segment of a compact `header.payload.signature` token is
//! read. The signature is NOT verified here; tokens are assumed to have been
//! validated by the issuer before they reach this layer.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::Value;

/// Untyped claim payload.
pub type ClaimMap = serde_json::Map<String, Value>;

/// Base64url that accepts both padded and unpadded input.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub const SUBJECT_KEYS: &[&str] = &[
    "sub",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
    "nameid",
];

pub const EMAIL_KEYS: &[&str] = &[
    "email",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
];

pub const ROLE_KEYS: &[&str] = &[
    "role",
    "roles",
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
];

pub const FIRST_NAME_KEYS: &[&str] = &[
    "given_name",
    "firstName",
    "first_name",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname",
];

pub const LAST_NAME_KEYS: &[&str] = &[
    "family_name",
    "lastName",
    "last_name",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/surname",
];

pub const PERMISSION_KEYS: &[&str] = &["permissions", "permission"];

pub const EXPIRY_KEY: &str = "exp";

/// Decode the payload segment of `token` into a claim map.
///
/// Returns `None` when the token does not have exactly three segments, the
/// payload is not base64url, or it is not a JSON object.
pub fn decode(token: &str) -> Option<ClaimMap> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        tracing::debug!("token rejected: expected three dot-separated segments");
        return None;
    };

    let bytes = match PAYLOAD_ENGINE.decode(payload) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, "token rejected: payload is not base64url");
            return None;
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Some(claims),
        Ok(_) => {
            tracing::debug!("token rejected: payload is not a JSON object");
            None
        }
        Err(err) => {
            tracing::debug!(error = %err, "token rejected: payload is not JSON");
            None
        }
    }
}

/// Gather raw role strings from every role claim key.
///
/// Array claims are flattened and scalars stringified. The result is the
/// union of all keys, deduplicated in first-seen order.
pub fn extract_raw_roles(claims: Option<&ClaimMap>) -> Vec<String> {
    let Some(claims) = claims else {
        return Vec::new();
    };
    let mut roles: Vec<String> = Vec::new();
    for key in ROLE_KEYS {
        for role in claim_strings(claims, key) {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
    }
    roles
}

/// First non-blank string found under any of `keys`, in key order.
pub fn first_string(claims: &ClaimMap, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| claims.get(*key).and_then(scalar_to_string))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// All strings under `key`: an array is flattened, a scalar becomes one entry.
///
/// Nulls, blanks and nested containers are skipped.
pub fn claim_strings(claims: &ClaimMap, key: &str) -> Vec<String> {
    match claims.get(key) {
        Some(Value::Array(values)) => values.iter().filter_map(scalar_to_string).collect(),
        Some(value) => scalar_to_string(value).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Integer seconds under `key`, accepting JSON numbers or numeric strings.
pub fn numeric_date(claims: &ClaimMap, key: &str) -> Option<i64> {
    match claims.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if s.trim().is_empty() { None } else { Some(s) }
}

/// Encode `claims` as an unsigned compact token (`header.payload.`).
///
/// Handy for fixtures and local tooling; the result carries no signature.
pub fn encode_unsigned(claims: &Value) -> String {
    let header = PAYLOAD_ENGINE.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = PAYLOAD_ENGINE.encode(claims.to_string());
    format!("{header}.{payload}.")
}
