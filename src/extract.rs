//! Numeric readings from cell text
//!
//! Each measured field has a unit-anchored pattern and a fallback policy. The
//! power column always carries its unit, so a power cell without `W` is
//! treated as unreadable. Voltage and temperature cells sometimes lose their
//! unit rendering, so those fall back to the first number in the cell.

use crate::error::Result;
use regex::Regex;

// Whole numbers only: the numeral may not continue a decimal like `1.5`.
const POWER_PATTERN: &str = r"(?i)(?:^|[^\d.])([+-]?\d+)\s*W\b";
const VOLTAGE_PATTERN: &str = r"(?i)([+-]?\d+(?:\.\d+)?)\s*V\b";
// Degree marker variants: U+00B0, U+00BA, a literal `&deg;`/`&#176;` left by
// double escaping, and the `<sup>o</sup>` rendering that flattens to `o`.
const TEMPERATURE_PATTERN: &str = r"(?i)([+-]?\d+(?:\.\d+)?)\s*(?:°|º|&deg;|&#176;|o)?\s*C\b";
const NUMBER_PATTERN: &str = r"[+-]?\d+(?:\.\d+)?";

/// Measured field of an inverter row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Power,
    Voltage,
    Temperature,
}

/// What to do when the unit-anchored pattern does not match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Report the value as absent
    None,
    /// Take the first signed decimal anywhere in the cell
    FirstNumber,
}

/// Outcome of extracting one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extracted {
    /// Number found next to its unit
    WithUnit(f64),
    /// Unit missing; number recovered by the fallback
    Fallback(f64),
    Absent,
}

impl Extracted {
    pub fn value(self) -> Option<f64> {
        match self {
            Extracted::WithUnit(v) | Extracted::Fallback(v) => Some(v),
            Extracted::Absent => None,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Extracted::Fallback(_))
    }
}

/// Unit pattern plus fallback policy for one field
#[derive(Debug, Clone)]
pub struct FieldRule {
    unit: Regex,
    fallback: Fallback,
}

impl FieldRule {
    pub fn new(unit_pattern: &str, fallback: Fallback) -> Result<Self> {
        Ok(Self {
            unit: Regex::new(unit_pattern)?,
            fallback,
        })
    }

    /// Captured numeral text, and whether the fallback produced it.
    fn find<'t>(&self, text: &'t str, number: &Regex) -> Option<(&'t str, bool)> {
        if let Some(caps) = self.unit.captures(text) {
            return caps.get(1).map(|m| (m.as_str(), false));
        }
        match self.fallback {
            Fallback::None => None,
            Fallback::FirstNumber => number.find(text).map(|m| (m.as_str(), true)),
        }
    }
}

/// Compiled extraction rules for every field, built once per run.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    power: FieldRule,
    voltage: FieldRule,
    temperature: FieldRule,
    number: Regex,
}

impl FieldExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            power: FieldRule::new(POWER_PATTERN, Fallback::None)?,
            voltage: FieldRule::new(VOLTAGE_PATTERN, Fallback::FirstNumber)?,
            temperature: FieldRule::new(TEMPERATURE_PATTERN, Fallback::FirstNumber)?,
            number: Regex::new(NUMBER_PATTERN)?,
        })
    }

    fn rule(&self, field: Field) -> &FieldRule {
        match field {
            Field::Power => &self.power,
            Field::Voltage => &self.voltage,
            Field::Temperature => &self.temperature,
        }
    }

    /// Extract `field` from one cell.
    pub fn extract(&self, field: Field, text: &str) -> Extracted {
        match self.rule(field).find(text, &self.number) {
            Some((numeral, fallback)) => match numeral.parse::<f64>() {
                Ok(v) if v.is_finite() && fallback => Extracted::Fallback(v),
                Ok(v) if v.is_finite() => Extracted::WithUnit(v),
                _ => Extracted::Absent,
            },
            None => Extracted::Absent,
        }
    }

    /// Whole watts, e.g. `"153 W"` → `153`. Cells without a `W` unit are absent.
    pub fn power(&self, text: &str) -> Option<i64> {
        // Parse the captured integer text directly so large values keep precision.
        self.power
            .find(text, &self.number)
            .and_then(|(numeral, _)| numeral.parse::<i64>().ok())
    }

    pub fn voltage(&self, text: &str) -> Option<f64> {
        self.extract(Field::Voltage, text).value()
    }

    pub fn temperature(&self, text: &str) -> Option<f64> {
        self.extract(Field::Temperature, text).value()
    }
}
