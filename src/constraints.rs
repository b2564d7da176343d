//! The six inequality constraints, each returned as a violation magnitude.
//!
//! Every function returns a non-negative value where 0.0 means satisfied.
//! Constraints never reject a candidate here; the external search consumes
//! the magnitudes and applies its own feasibility handling.

use crate::config::SystemConfig;
use crate::decision::{Bounds, DecisionVector};

/// One candidate's constraint violations in the fixed matrix column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintVector {
    /// Box-bound overshoot summed across all four variables.
    pub bounds: f64,
    /// Land-area overshoot summed across the PV and wind zones (m²).
    pub area: f64,
    /// LPSP in excess of the reliability limit.
    pub lpsp: f64,
    /// Spinning-reserve shortfall (MW).
    pub spinning_reserve: f64,
    /// Grid import/export in excess of the interconnection limits (MW).
    pub grid_limits: f64,
    /// Installed renewables in excess of the policy cap (MW).
    pub renewable_cap: f64,
}

impl ConstraintVector {
    /// Returns the violations in the fixed matrix column order
    /// `[bounds, area, lpsp, spinning_reserve, grid_limits, renewable_cap]`.
    pub fn to_array(self) -> [f64; 6] {
        [
            self.bounds,
            self.area,
            self.lpsp,
            self.spinning_reserve,
            self.grid_limits,
            self.renewable_cap,
        ]
    }
}

/// Sum of positive violations across a constraint row.
pub fn total_violation(violations: &[f64]) -> f64 {
    violations.iter().map(|v| v.max(0.0)).sum()
}

/// True when the aggregate violation is within the given tolerance.
pub fn is_feasible(violations: &[f64], tolerance: f64) -> bool {
    total_violation(violations) <= tolerance
}

/// Box-bound violation: distance outside `[lower, upper]`, summed over all
/// four variables. Variables are in mixed units, so the sum is a penalty
/// signal rather than a physical quantity.
pub fn constraint_bounds(x: &DecisionVector, bounds: &Bounds) -> f64 {
    let values = x.to_array();
    let lower = bounds.lower();
    let upper = bounds.upper();
    let mut violation = 0.0;
    for i in 0..4 {
        if values[i] < lower[i] {
            violation += lower[i] - values[i];
        }
        if values[i] > upper[i] {
            violation += values[i] - upper[i];
        }
    }
    violation
}

/// Land-area violation with separated siting zones (m²).
///
/// PV and the battery bank share the near-town zone; wind has its own remote
/// zone. The two overshoots are summed so neither zone can subsidize the
/// other.
pub fn constraint_area(x: &DecisionVector, cfg: &SystemConfig) -> f64 {
    let pol = &cfg.policy;

    let area_pv = x.pv_kw * pol.area_pv_per_kw;
    let area_battery = x.battery_mwh * pol.area_battery_per_mwh;
    let area_wind = x.wind_mw * pol.area_wind_per_mw;

    let violation_pv = (area_pv + area_battery - pol.area_available_pv_m2).max(0.0);
    let violation_wind = (area_wind - pol.area_available_wind_m2).max(0.0);

    violation_pv + violation_wind
}

/// Reliability violation: LPSP in excess of the configured limit.
pub fn constraint_lpsp(lpsp: f64, lpsp_limit: f64) -> f64 {
    (lpsp - lpsp_limit).max(0.0)
}

/// Spinning-reserve shortfall (MW).
///
/// Dispatchable capacity above average load (diesel plus battery power at its
/// c-rate) must cover the reserve fraction of average load.
pub fn constraint_spinning_reserve(
    x: &DecisionVector,
    avg_load_mw: f64,
    cfg: &SystemConfig,
) -> f64 {
    let reserve_required = cfg.policy.reserve_fraction * avg_load_mw;
    let dispatchable = x.diesel_mw + x.battery_mwh * cfg.technology.battery_c_rate;
    let reserve_available = dispatchable - avg_load_mw;
    (reserve_required - reserve_available).max(0.0)
}

/// Grid exchange in excess of the interconnection limits (MW).
///
/// The islanded dispatch never imports or exports, so this is 0.0 unless the
/// configuration declares a grid connection with flows beyond its limits.
pub fn constraint_grid_limits(import_mw: f64, export_mw: f64, cfg: &SystemConfig) -> f64 {
    if !cfg.policy.grid_connected {
        return 0.0;
    }
    let over_import = (import_mw - cfg.policy.max_import_mw).max(0.0);
    let over_export = (export_mw - cfg.policy.max_export_mw).max(0.0);
    over_import + over_export
}

/// Installed renewables in excess of the policy cap (MW).
///
/// Inactive unless explicitly enabled; the cap is a multiple of average load.
pub fn constraint_renewable_cap(x: &DecisionVector, avg_load_mw: f64, cfg: &SystemConfig) -> f64 {
    if !cfg.policy.enable_renewable_cap {
        return 0.0;
    }
    let renewable_total_mw = x.pv_kw / 1000.0 + x.wind_mw;
    let cap_mw = cfg.policy.renewable_fraction_max * avg_load_mw;
    (renewable_total_mw - cap_mw).max(0.0)
}

/// Evaluates all six constraints for one simulated candidate.
///
/// `lpsp` and `avg_load_mw` come from the dispatch result; everything else
/// derives from the decision vector and configuration alone.
pub fn validate_solution(
    x: &DecisionVector,
    lpsp: f64,
    avg_load_mw: f64,
    cfg: &SystemConfig,
) -> ConstraintVector {
    ConstraintVector {
        bounds: constraint_bounds(x, &cfg.bounds),
        area: constraint_area(x, cfg),
        lpsp: constraint_lpsp(lpsp, cfg.policy.lpsp_limit),
        spinning_reserve: constraint_spinning_reserve(x, avg_load_mw, cfg),
        grid_limits: constraint_grid_limits(0.0, 0.0, cfg),
        renewable_cap: constraint_renewable_cap(x, avg_load_mw, cfg),
    }
}
