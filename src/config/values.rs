//! Lenient field readers for hand-edited config files.
//!
//! Older configs spell switches as `"yes"`/`"no"` strings and sometimes quote
//! numbers, so these accept bools, numbers and strings alike.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// `yes`, `true`, `on`, `y` and `1` (any case) are true; everything else is false.
pub fn parse_bool_like(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "on" | "1"
    )
}

pub fn bool_like<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => false,
        Some(Loose::Bool(b)) => b,
        Some(Loose::Int(n)) => n != 0,
        Some(Loose::Float(f)) => f != 0.0,
        Some(Loose::Text(s)) => parse_bool_like(&s),
    })
}

pub fn count_like<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Int(n)) => Ok(Some(n)),
        #[allow(clippy::cast_possible_truncation)]
        Some(Loose::Float(f)) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Loose::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a whole number, got {:?}", s))),
        Some(_) => Err(D::Error::custom("expected a whole number")),
    }
}

pub fn text_like<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Text(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(Loose::Int(n)) => Ok(Some(n.to_string())),
        Some(Loose::Float(f)) => Ok(Some(f.to_string())),
        Some(Loose::Bool(_)) => Err(D::Error::custom("expected text or a number")),
    }
}
