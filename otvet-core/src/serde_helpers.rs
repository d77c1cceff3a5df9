//! Custom serde deserializers for the service's loosely-typed JSON.
//!
//! The API encodes the same field as a number in one response and a string
//! in another, and boolean flags arrive as `true`, `1`, or `"1"` depending
//! on the endpoint. These helpers accept every observed encoding so wire
//! structs can declare the type they mean.

use serde::{Deserialize, Deserializer, de};

/// Deserialize an unsigned integer that may arrive as a JSON number
/// (`42`) or a numeric string (`"42"`).
///
/// Works for any integer type convertible from `u64` (`u64`, `u32`, ...).
pub fn uint_from_any<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        String(String),
    }

    let n = match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("invalid integer string: {s:?}")))?,
    };
    T::try_from(n).map_err(|_| de::Error::custom(format!("integer out of range: {n}")))
}

/// Optional variant of [`uint_from_any`]; `null` and absent both map to
/// `None` when combined with `#[serde(default)]`.
pub fn opt_uint_from_any<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        String(String),
    }

    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    let n = match raw {
        None => return Ok(None),
        Some(Raw::Number(n)) => n,
        Some(Raw::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("invalid integer string: {s:?}")))?,
    };
    T::try_from(n)
        .map(Some)
        .map_err(|_| de::Error::custom(format!("integer out of range: {n}")))
}

/// Signed variant of [`uint_from_any`] for fields that can go negative,
/// such as reaction codes and timestamps.
pub fn int_from_any<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        String(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("invalid integer string: {s:?}"))),
    }
}

/// Optional variant of [`int_from_any`].
pub fn opt_int_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        String(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid integer string: {s:?}"))),
    }
}

/// Deserialize a float that may arrive as a JSON number or a numeric
/// string (the service serializes `kpd` both ways).
pub fn f64_from_any<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        String(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid float string: {s:?}"))),
    }
}

/// Deserialize a flag that may arrive as a JSON boolean, an integer
/// (`0` false, anything else true), or a string holding an integer or
/// `"true"`/`"false"`.
pub fn bool_from_any<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Number(i64),
        String(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Number(n) => Ok(n != 0),
        Raw::String(s) => parse_bool_str(&s).map_err(de::Error::custom),
    }
}

/// Optional variant of [`bool_from_any`] for flags the service omits.
pub fn opt_bool_from_any<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Number(i64),
        String(String),
    }

    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(Raw::Bool(b)) => Ok(Some(b)),
        Some(Raw::Number(n)) => Ok(Some(n != 0)),
        Some(Raw::String(s)) => parse_bool_str(&s).map(Some).map_err(de::Error::custom),
    }
}

fn parse_bool_str(s: &str) -> Result<bool, String> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n != 0);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("invalid boolean string: {s:?}")),
    }
}
