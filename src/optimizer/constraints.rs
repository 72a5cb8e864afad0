use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ramp limits of a unit, MW per period.
///
/// Expected ordering (not enforced):
/// `ramp_up_limit >= startup_limit >= minimum_opt_limit > 0` and
/// `ramp_down_limit >= shutdown_limit >= minimum_opt_limit > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampingLimits {
    pub startup_limit: f64,
    pub shutdown_limit: f64,
    pub ramp_up_limit: f64,
    pub ramp_down_limit: f64,
    pub minimum_opt_limit: f64,
}

impl Default for RampingLimits {
    fn default() -> Self {
        Self {
            startup_limit: 100.0,
            shutdown_limit: 100.0,
            ramp_up_limit: 110.0,
            ramp_down_limit: 110.0,
            minimum_opt_limit: 0.0,
        }
    }
}

impl RampingLimits {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("startup_limit", self.startup_limit),
            ("shutdown_limit", self.shutdown_limit),
            ("ramp_up_limit", self.ramp_up_limit),
            ("ramp_down_limit", self.ramp_down_limit),
            ("minimum_opt_limit", self.minimum_opt_limit),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::config(format!(
                    "{} must be finite and >= 0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Broken ordering relations, one message each
    pub fn ordering_violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut check = |ok: bool, msg: String| {
            if !ok {
                out.push(msg);
            }
        };
        check(
            self.ramp_up_limit >= self.startup_limit,
            format!("ramp_up_limit ({}) < startup_limit ({})", self.ramp_up_limit, self.startup_limit),
        );
        check(
            self.ramp_down_limit >= self.shutdown_limit,
            format!("ramp_down_limit ({}) < shutdown_limit ({})", self.ramp_down_limit, self.shutdown_limit),
        );
        check(
            self.startup_limit >= self.minimum_opt_limit,
            format!("startup_limit ({}) < minimum_opt_limit ({})", self.startup_limit, self.minimum_opt_limit),
        );
        check(
            self.shutdown_limit >= self.minimum_opt_limit,
            format!("shutdown_limit ({}) < minimum_opt_limit ({})", self.shutdown_limit, self.minimum_opt_limit),
        );
        out
    }
}

/// Minimum up/down times, in periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpDownTimes {
    /// `UT`: periods needed to start up fully
    pub up_time: usize,
    /// `DT`: periods needed to shut down fully
    pub down_time: usize,
}

impl Default for UpDownTimes {
    fn default() -> Self {
        Self {
            up_time: 4,
            down_time: 4,
        }
    }
}

impl UpDownTimes {
    pub fn validate(&self) -> Result<()> {
        if self.up_time < 1 || self.down_time < 1 {
            return Err(Error::config(format!(
                "up_time and down_time must be >= 1, got UT={} DT={}",
                self.up_time, self.down_time
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let limits = RampingLimits::default();
        assert!(limits.validate().is_ok());
        assert!(limits.ordering_violations().is_empty());
        assert!(UpDownTimes::default().validate().is_ok());
    }

    #[rstest]
    #[case(RampingLimits { startup_limit: -1.0, ..Default::default() })]
    #[case(RampingLimits { ramp_down_limit: f64::INFINITY, ..Default::default() })]
    #[case(RampingLimits { minimum_opt_limit: f64::NAN, ..Default::default() })]
    fn test_invalid_limits(#[case] limits: RampingLimits) {
        assert!(matches!(limits.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_ordering_is_advisory() {
        let limits = RampingLimits {
            startup_limit: 150.0,
            minimum_opt_limit: 120.0,
            ..Default::default()
        };
        assert!(limits.validate().is_ok());
        let v = limits.ordering_violations();
        assert_eq!(v.len(), 2);
        assert!(v[0].starts_with("ramp_up_limit"));
    }

    #[rstest]
    #[case(0, 4)]
    #[case(4, 0)]
    fn test_zero_up_down_time(#[case] up_time: usize, #[case] down_time: usize) {
        let t = UpDownTimes { up_time, down_time };
        assert!(matches!(t.validate(), Err(Error::Configuration(_))));
    }
}
