//! Totals and averages over one run's readings
//!
//! When some inverters are offline (night-time dropouts, ZigBee gaps) the raw
//! sum under-reports the array. With scaling enabled and an expected panel
//! count configured, the total is extrapolated from the panels that did
//! report, assuming they are representative of the missing ones.

use crate::error::{HeliosError, Result};
use crate::logging::get_logger;
use crate::reading::Reading;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;

/// Validated missing-panel scaling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingPolicy {
    Disabled,
    Enabled { expected_count: NonZeroU32 },
}

impl ScalingPolicy {
    /// Validate the raw settings. Scaling without a positive expected count is
    /// a configuration error.
    pub fn from_settings(scale_missing: bool, expected_count: Option<i64>) -> Result<Self> {
        if !scale_missing {
            return Ok(ScalingPolicy::Disabled);
        }
        let count = expected_count.ok_or_else(|| {
            HeliosError::config("scale_missing is enabled but expected_count is not set")
        })?;
        u32::try_from(count)
            .ok()
            .and_then(NonZeroU32::new)
            .map(|expected_count| ScalingPolicy::Enabled { expected_count })
            .ok_or_else(|| {
                HeliosError::config(format!(
                    "expected_count must be a positive integer when scale_missing is enabled, got {}",
                    count
                ))
            })
    }
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Readings that carried a wattage
    pub received_count: u32,
    pub expected_count: Option<u32>,
    pub total_raw: i64,
    /// `estimated_total` when scaling applied, otherwise `total_raw`
    pub total_for_output: i64,
    pub estimated_total: Option<i64>,
    pub avg_volt: Option<f64>,
    pub avg_temp: Option<f64>,
    pub panels: BTreeMap<String, Option<i64>>,
}

impl Aggregate {
    pub fn scaled(&self) -> bool {
        self.estimated_total.is_some()
    }
}

/// Mean of the present values; `None` when nothing is present.
pub fn average<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0_f64, 0_u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}

/// `round(total * expected / received)`, or `None` when scaling does not apply.
///
/// Ties round to even.
pub fn scaled_total(total_raw: i64, received_count: u32, policy: ScalingPolicy) -> Option<i64> {
    let ScalingPolicy::Enabled { expected_count } = policy else {
        return None;
    };
    let expected = expected_count.get();
    if received_count == 0 || expected <= received_count {
        return None;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let estimate =
        (total_raw as f64 * f64::from(expected) / f64::from(received_count)).round_ties_even();
    #[allow(clippy::cast_possible_truncation)]
    Some(estimate as i64)
}

/// Aggregate readings.
///
/// `expected_count` is reported as configured even when `policy` is
/// [`ScalingPolicy::Disabled`].
pub fn aggregate(
    readings: &[Reading],
    expected_count: Option<u32>,
    policy: ScalingPolicy,
) -> Aggregate {
    let watts: Vec<i64> = readings.iter().filter_map(|r| r.watts).collect();
    let received_count = u32::try_from(watts.len()).unwrap_or(u32::MAX);
    let total_raw = watts
        .iter()
        .try_fold(0_i64, |acc, w| acc.checked_add(*w))
        .unwrap_or_else(|| {
            get_logger("aggregate").warn("Power total is out of range; saturating");
            watts.iter().fold(0_i64, |acc, w| acc.saturating_add(*w))
        });

    let estimated_total = scaled_total(total_raw, received_count, policy);
    let expected_count = match policy {
        ScalingPolicy::Enabled { expected_count } => Some(expected_count.get()),
        ScalingPolicy::Disabled => expected_count,
    };

    Aggregate {
        received_count,
        expected_count,
        total_raw,
        total_for_output: estimated_total.unwrap_or(total_raw),
        estimated_total,
        avg_volt: average(readings.iter().map(|r| r.volt)),
        avg_temp: average(readings.iter().map(|r| r.temp)),
        panels: readings
            .iter()
            .map(|r| (r.id.clone(), r.watts))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(id: &str, watts: Option<i64>) -> Reading {
        Reading {
            id: id.to_string(),
            watts,
            volt: None,
            temp: None,
        }
    }

    fn enabled(n: u32) -> ScalingPolicy {
        ScalingPolicy::Enabled {
            expected_count: NonZeroU32::new(n).unwrap(),
        }
    }

    #[test]
    fn totals_skip_absent_watts() {
        let readings = [
            reading("a", Some(100)),
            reading("b", Some(200)),
            reading("c", None),
        ];
        let agg = aggregate(&readings, None, ScalingPolicy::Disabled);
        assert_eq!(agg.total_raw, 300);
        assert_eq!(agg.received_count, 2);
        assert_eq!(agg.total_for_output, 300);
        assert_eq!(agg.estimated_total, None);
        assert_eq!(agg.panels.len(), 3);
        assert_eq!(agg.panels["c"], None);
    }

    #[test]
    fn scales_up_when_panels_are_missing() {
        let readings = [reading("a", Some(100)), reading("b", Some(200))];
        let agg = aggregate(&readings, Some(4), enabled(4));
        assert_eq!(agg.estimated_total, Some(600));
        assert_eq!(agg.total_for_output, 600);
        assert_eq!(agg.total_raw, 300);
        assert!(agg.scaled());
    }

    #[test]
    fn no_scaling_without_shortfall_or_when_disabled() {
        let readings = [reading("a", Some(100)), reading("b", Some(200))];
        let agg = aggregate(&readings, Some(2), enabled(2));
        assert_eq!(agg.estimated_total, None);
        assert_eq!(agg.total_for_output, 300);

        let agg = aggregate(&readings, Some(1), enabled(1));
        assert_eq!(agg.estimated_total, None);

        let agg = aggregate(&readings, Some(4), ScalingPolicy::Disabled);
        assert_eq!(agg.estimated_total, None);
        assert_eq!(agg.expected_count, Some(4));
        assert_eq!(agg.total_for_output, 300);
    }

    #[test]
    fn zero_received_never_scales() {
        let readings = [reading("a", None), reading("b", None)];
        let agg = aggregate(&readings, Some(8), enabled(8));
        assert_eq!(agg.received_count, 0);
        assert_eq!(agg.total_raw, 0);
        assert_eq!(agg.total_for_output, 0);
        assert_eq!(agg.estimated_total, None);

        let agg = aggregate(&[], Some(8), enabled(8));
        assert_eq!(agg.total_for_output, 0);
    }

    #[test]
    fn scaled_total_rounds_half_to_even() {
        // 5 * 3 / 2 = 7.5 -> 8, 3 * 3 / 2 = 4.5 -> 4
        assert_eq!(scaled_total(5, 2, enabled(3)), Some(8));
        assert_eq!(scaled_total(3, 2, enabled(3)), Some(4));
        assert_eq!(scaled_total(100, 3, enabled(4)), Some(133));
    }

    #[test]
    fn huge_cells_saturate_instead_of_overflowing() {
        let readings = [reading("a", Some(i64::MAX)), reading("b", Some(1))];
        let agg = aggregate(&readings, Some(4), enabled(4));
        assert_eq!(agg.total_raw, i64::MAX);
        assert_eq!(agg.received_count, 2);
        assert_eq!(agg.estimated_total, Some(i64::MAX));

        let readings = [reading("a", Some(i64::MIN)), reading("b", Some(-1))];
        let agg = aggregate(&readings, None, ScalingPolicy::Disabled);
        assert_eq!(agg.total_raw, i64::MIN);
        assert_eq!(agg.total_for_output, i64::MIN);
    }

    #[test]
    fn averages_ignore_absent_values() {
        assert_eq!(average([Some(230.0), None, Some(240.0)]), Some(235.0));
        assert_eq!(average([None, None]), None);
        assert_eq!(average(std::iter::empty::<Option<f64>>()), None);

        let readings = [
            Reading {
                id: "a".into(),
                watts: Some(1),
                volt: Some(230.0),
                temp: None,
            },
            Reading {
                id: "b".into(),
                watts: Some(1),
                volt: None,
                temp: None,
            },
        ];
        let agg = aggregate(&readings, None, ScalingPolicy::Disabled);
        assert_eq!(agg.avg_volt, Some(230.0));
        assert_eq!(agg.avg_temp, None);
    }

    #[test]
    fn policy_requires_positive_expected_count() {
        assert_eq!(
            ScalingPolicy::from_settings(false, None).unwrap(),
            ScalingPolicy::Disabled
        );
        assert_eq!(ScalingPolicy::from_settings(true, Some(4)).unwrap(), enabled(4));
        for bad in [None, Some(0), Some(-3)] {
            let err = ScalingPolicy::from_settings(true, bad).unwrap_err();
            assert!(matches!(err, HeliosError::Config { .. }), "{bad:?}");
        }
    }
}
