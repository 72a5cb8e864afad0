//! Ramping and startup/shutdown constraints over the ordered period list.
//!
//! Constraint index `t` is a position in the realization order of the
//! periods, position 0 being the first period.

use tracing::{debug, warn};

use super::constraints::{RampingLimits, UpDownTimes};
use crate::error::Result;
use crate::model::{Constraint, Expression, Index, Relation};
use crate::multiperiod::MultiPeriodModel;

pub const RAMP_UP: &str = "ramp_up_con";
pub const RAMP_DOWN: &str = "ramp_down_con";
pub const STARTUP: &str = "startup_con";
pub const SHUTDOWN: &str = "shutdown_con";

type Member = (Index, Relation);

impl MultiPeriodModel {
    /// Add ramp-up and ramp-down limits for `t` in `2..=P-1`.
    ///
    /// Ramp up:
    /// `P[t] - P[t-1] <= SU*su[t] - MIN*su[t-1] + RU*om[t] + MIN*(om[t] - om[t-1])`
    ///
    /// Ramp down:
    /// `P[t-1] - P[t] <= SD*(su[t-1] + om[t-1] - om[t]) - MIN*su[t] + RD*om[t]`
    pub fn with_ramping(mut self, limits: &RampingLimits) -> Result<Self> {
        limits.validate()?;
        self.model().ensure_new_families(&[RAMP_UP, RAMP_DOWN])?;
        for msg in limits.ordering_violations() {
            warn!(%msg, "ramping limits break the expected ordering");
        }

        let (up, down) = self.ramp_members(limits);
        debug!(n = up.len(), "ramp constraints");
        let model = self.model_mut();
        model.add_constraint_family(RAMP_UP, up)?;
        model.add_constraint_family(RAMP_DOWN, down)?;
        Ok(self)
    }

    /// Add minimum up-time and down-time windows.
    ///
    /// Startup, `t` in `UT..=P-1`: `sum(su[t-UT+1..t]) <= om[t]`.
    ///
    /// Shutdown, `t` in `DT..=P-1`: `sum(su[t-DT..=t]) <= 1 - om[t-DT]`.
    pub fn with_startup_shutdown(mut self, times: &UpDownTimes) -> Result<Self> {
        times.validate()?;
        self.model().ensure_new_families(&[STARTUP, SHUTDOWN])?;

        let (startup, shutdown) = self.window_members(times);
        let model = self.model_mut();
        model.add_constraint_family(STARTUP, startup)?;
        model.add_constraint_family(SHUTDOWN, shutdown)?;
        Ok(self)
    }

    fn ramp_members(&self, l: &RampingLimits) -> (Vec<Member>, Vec<Member>) {
        let periods = self.periods();
        let mut up = Vec::new();
        let mut down = Vec::new();

        for t in 2..periods.len() {
            let (prev, cur) = (&periods[t - 1], &periods[t]);

            let rise = cur.opt_power().clone() - prev.opt_power();
            let mut up_bound = Expression::default();
            up_bound.add_mul(l.startup_limit, cur.startup());
            up_bound.add_mul(-l.minimum_opt_limit, prev.startup());
            up_bound.add_mul(l.ramp_up_limit + l.minimum_opt_limit, cur.op_mode());
            up_bound.add_mul(-l.minimum_opt_limit, prev.op_mode());
            up.push((Index::Position(t), Constraint::le(rise, up_bound)));

            let fall = prev.opt_power().clone() - cur.opt_power();
            let transition = prev.startup().clone() + prev.op_mode() - cur.op_mode();
            let mut down_bound = l.shutdown_limit * transition;
            down_bound.add_mul(-l.minimum_opt_limit, cur.startup());
            down_bound.add_mul(l.ramp_down_limit, cur.op_mode());
            down.push((Index::Position(t), Constraint::le(fall, down_bound)));
        }
        (up, down)
    }

    fn window_members(&self, times: &UpDownTimes) -> (Vec<Member>, Vec<Member>) {
        let periods = self.periods();
        let (ut, dt) = (times.up_time, times.down_time);

        let startup = (ut..periods.len())
            .map(|t| {
                let window: Expression = periods[t + 1 - ut..t].iter().map(|p| p.startup()).sum();
                (Index::Position(t), Constraint::le(window, periods[t].op_mode().clone()))
            })
            .collect();

        let shutdown = (dt..periods.len())
            .map(|t| {
                let window: Expression = periods[t - dt..=t].iter().map(|p| p.startup()).sum();
                let bound = 1.0 - periods[t - dt].op_mode().clone();
                (Index::Position(t), Constraint::le(window, bound))
            })
            .collect();

        (startup, shutdown)
    }
}
