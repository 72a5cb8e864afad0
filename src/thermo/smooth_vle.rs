//! Smooth vapor-liquid equilibrium temperature
//!
//! Burgard et al. (2018), "A Smooth, Square Flash Formulation for
//! Equation-Oriented Flowsheet Optimization", PSE 2018. The equilibrium
//! temperature `Teq` is pinned between the bubble and dew temperatures with
//! smooth max/min operators so the flash stays square across phase changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::{Error, Result};

/// `max(a, b)` smoothed by `eps`
pub fn smooth_max(a: f64, b: f64, eps: f64) -> f64 {
    0.5 * (a + b + ((a - b).powi(2) + eps * eps).sqrt())
}

/// `min(a, b)` smoothed by `eps`
pub fn smooth_min(a: f64, b: f64, eps: f64) -> f64 {
    0.5 * (a + b - ((a - b).powi(2) + eps * eps).sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PhaseType {
    Liquid,
    Vapor,
    Solid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub kind: PhaseType,
}

/// Phases of a property package and the components present in each
#[derive(Debug, Clone, Default)]
pub struct PhaseComponentSet {
    phases: Vec<Phase>,
    components: Vec<String>,
    members: BTreeSet<(String, String)>,
}

impl PhaseComponentSet {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self {
            phases,
            ..Default::default()
        }
    }

    /// Register `component` as present in each of `phases`
    pub fn with_component(mut self, component: &str, phases: &[&str]) -> Result<Self> {
        if self.components.iter().any(|c| c == component) {
            return Err(Error::config(format!("component '{}' declared twice", component)));
        }
        for p in phases {
            self.phase(p)?;
            self.members.insert((p.to_string(), component.to_string()));
        }
        self.components.push(component.to_string());
        Ok(self)
    }

    pub fn phase(&self, name: &str) -> Result<&Phase> {
        self.phases
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::unknown("phase", name))
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn contains(&self, phase: &str, component: &str) -> bool {
        self.members.contains(&(phase.to_string(), component.to_string()))
    }
}

/// Components of a vapor-liquid pair, split by the phases they appear in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlComponents {
    pub liquid_phase: String,
    pub vapor_phase: String,
    pub both: Vec<String>,
    pub liquid_only: Vec<String>,
    pub vapor_only: Vec<String>,
}

impl VlComponents {
    /// Classify components of `pair`; fails unless it is one liquid and one vapor phase
    pub fn classify(set: &PhaseComponentSet, pair: (&str, &str)) -> Result<Self> {
        let mut liquid = None;
        let mut vapor = None;
        for name in [pair.0, pair.1] {
            match set.phase(name)?.kind {
                PhaseType::Liquid => liquid = Some(name),
                PhaseType::Vapor => vapor = Some(name),
                PhaseType::Solid => {}
            }
        }
        let (Some(l), Some(v)) = (liquid, vapor) else {
            return Err(Error::config(format!(
                "phase pair {}-{} was set to use the smooth VLE formulation, but it is not a vapor-liquid pair",
                pair.0, pair.1
            )));
        };

        let mut out = Self {
            liquid_phase: l.to_string(),
            vapor_phase: v.to_string(),
            both: Vec::new(),
            liquid_only: Vec::new(),
            vapor_only: Vec::new(),
        };
        for c in set.components() {
            match (set.contains(l, c), set.contains(v, c)) {
                (true, true) => out.both.push(c.clone()),
                (true, false) => out.liquid_only.push(c.clone()),
                (false, true) => out.vapor_only.push(c.clone()),
                (false, false) => {}
            }
        }
        Ok(out)
    }
}

/// Temperatures of a state, K
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlashTemperatures {
    pub temperature: f64,
    pub bubble: f64,
    pub dew: f64,
}

/// Smoothing parameters of the equilibrium temperature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothVle {
    pub eps_1: f64,
    pub eps_2: f64,
}

impl Default for SmoothVle {
    fn default() -> Self {
        Self {
            eps_1: 0.01,
            eps_2: 0.0005,
        }
    }
}

impl SmoothVle {
    /// Intermediate temperature `T1`: `smooth_max(T, Tbub)` unless some
    /// component is vapor-only, in which case `T`
    pub fn t1(&self, comps: &VlComponents, t: &FlashTemperatures) -> f64 {
        if comps.vapor_only.is_empty() {
            smooth_max(t.temperature, t.bubble, self.eps_1)
        } else {
            t.temperature
        }
    }

    /// Equilibrium temperature `Teq`
    pub fn teq(&self, comps: &VlComponents, t: &FlashTemperatures) -> f64 {
        let teq = if comps.liquid_only.is_empty() {
            smooth_min(self.t1(comps, t), t.dew, self.eps_2)
        } else if comps.vapor_only.is_empty() {
            self.t1(comps, t)
        } else {
            t.temperature
        };
        debug!(teq, liquid = %comps.liquid_phase, vapor = %comps.vapor_phase, "equilibrium temperature");
        teq
    }

    /// Starting value for `Teq` using the hard max/min
    pub fn initial_teq(comps: &VlComponents, t: &FlashTemperatures) -> f64 {
        let t1 = if comps.vapor_only.is_empty() {
            t.temperature.max(t.bubble)
        } else {
            t.temperature
        };
        if comps.liquid_only.is_empty() {
            t1.min(t.dew)
        } else {
            t1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn set() -> PhaseComponentSet {
        PhaseComponentSet::new(vec![
            Phase {
                name: "Liq".into(),
                kind: PhaseType::Liquid,
            },
            Phase {
                name: "Vap".into(),
                kind: PhaseType::Vapor,
            },
            Phase {
                name: "Sol".into(),
                kind: PhaseType::Solid,
            },
        ])
    }

    fn temps(temperature: f64) -> FlashTemperatures {
        FlashTemperatures {
            temperature,
            bubble: 350.0,
            dew: 370.0,
        }
    }

    #[test]
    fn test_classify() {
        let s = set()
            .with_component("benzene", &["Liq", "Vap"])
            .unwrap()
            .with_component("salt", &["Liq"])
            .unwrap()
            .with_component("N2", &["Vap"])
            .unwrap()
            .with_component("ash", &["Sol"])
            .unwrap();
        let c = VlComponents::classify(&s, ("Vap", "Liq")).unwrap();
        assert_eq!(c.liquid_phase, "Liq");
        assert_eq!(c.both, vec!["benzene"]);
        assert_eq!(c.liquid_only, vec!["salt"]);
        assert_eq!(c.vapor_only, vec!["N2"]);
    }

    #[rstest]
    #[case(("Liq", "Sol"))]
    #[case(("Liq", "Liq"))]
    fn test_non_vl_pair(#[case] pair: (&str, &str)) {
        let s = set().with_component("benzene", &["Liq", "Vap"]).unwrap();
        assert!(matches!(VlComponents::classify(&s, pair), Err(Error::Configuration(_))));
    }

    #[rstest]
    #[case(300.0, 350.0)]
    #[case(360.0, 360.0)]
    #[case(400.0, 370.0)]
    fn test_teq_clamps_between_bubble_and_dew(#[case] t: f64, #[case] expected: f64) {
        let s = set().with_component("benzene", &["Liq", "Vap"]).unwrap();
        let c = VlComponents::classify(&s, ("Liq", "Vap")).unwrap();
        let vle = SmoothVle::default();
        assert!((vle.teq(&c, &temps(t)) - expected).abs() < 1e-3);
        assert_eq!(SmoothVle::initial_teq(&c, &temps(t)), expected);
    }

    #[test]
    fn test_teq_with_non_volatile_and_non_condensable() {
        let s = set()
            .with_component("salt", &["Liq"])
            .unwrap()
            .with_component("N2", &["Vap"])
            .unwrap();
        let c = VlComponents::classify(&s, ("Liq", "Vap")).unwrap();
        assert_eq!(SmoothVle::default().teq(&c, &temps(300.0)), 300.0);
    }

    #[test]
    fn test_teq_with_non_volatile_only() {
        let s = set()
            .with_component("water", &["Liq", "Vap"])
            .unwrap()
            .with_component("salt", &["Liq"])
            .unwrap();
        let c = VlComponents::classify(&s, ("Liq", "Vap")).unwrap();
        // No dew point bound
        assert!((SmoothVle::default().teq(&c, &temps(400.0)) - 400.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn smooth_max_bounds(a in -1e3f64..1e3, b in -1e3f64..1e3) {
            let eps = 0.01;
            let m = smooth_max(a, b, eps);
            prop_assert!(m >= a.max(b) - 1e-9);
            prop_assert!(m <= a.max(b) + eps);
            prop_assert!((smooth_min(a, b, eps) + smooth_max(-a, -b, eps)).abs() < 1e-9);
        }
    }
}
