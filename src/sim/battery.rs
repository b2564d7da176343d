//! Battery state of charge, the only quantity carried across dispatch hours.

/// Mutable battery state for one simulation pass.
///
/// Created fresh at the start of every simulation (SOC 0.5), mutated
/// hour-by-hour, discarded at the end; never shared across evaluations.
/// A non-positive capacity models the no-battery case: the battery accepts
/// and delivers nothing. The search may propose capacities below the box
/// bounds; those rows still dispatch, and the bounds constraint reports the
/// undershoot.
///
/// All powers are MW over a one-hour step, so power and energy are
/// numerically interchangeable here.
#[derive(Debug, Clone)]
pub struct BatteryState {
    /// Energy capacity (MWh).
    capacity_mwh: f64,
    /// State of charge, held within `[1 - dod_max, 1.0]`.
    soc: f64,
    /// SOC floor, `1 - dod_max`.
    soc_min: f64,
    /// Charge/discharge power limit, `capacity * c_rate` (MW).
    power_limit_mw: f64,
    /// One-way charge/discharge efficiency.
    efficiency: f64,
}

impl BatteryState {
    /// Creates a battery at 50% state of charge.
    ///
    /// Any capacity at or below zero yields an inert battery.
    ///
    /// # Panics
    ///
    /// Panics if efficiency/DOD are outside (0, 1] or the c-rate is not
    /// positive. Those come from validated configuration, never from the
    /// search.
    pub fn new(capacity_mwh: f64, c_rate: f64, efficiency: f64, dod_max: f64) -> Self {
        assert!(c_rate > 0.0);
        assert!(efficiency > 0.0 && efficiency <= 1.0);
        assert!(dod_max > 0.0 && dod_max <= 1.0);

        Self {
            capacity_mwh,
            soc: 0.5,
            soc_min: 1.0 - dod_max,
            power_limit_mw: (capacity_mwh * c_rate).max(0.0),
            efficiency,
        }
    }

    /// Current state of charge.
    pub fn soc(&self) -> f64 {
        self.soc
    }

    /// SOC floor implied by the depth-of-discharge limit.
    pub fn soc_min(&self) -> f64 {
        self.soc_min
    }

    /// Charge/discharge power limit (MW).
    pub fn power_limit_mw(&self) -> f64 {
        self.power_limit_mw
    }

    /// Absorbs renewable surplus and returns the power actually accepted (MW).
    ///
    /// Accepted charge is capped by the c-rate power limit and by the
    /// remaining headroom grossed up for charge losses; SOC rises by the
    /// stored (post-loss) energy and is clamped at full.
    pub fn charge(&mut self, surplus_mw: f64) -> f64 {
        if self.capacity_mwh <= 0.0 || self.soc >= 1.0 || surplus_mw <= 0.0 {
            return 0.0;
        }
        let headroom_mw = (1.0 - self.soc) * self.capacity_mwh / self.efficiency;
        let accepted = surplus_mw.min(self.power_limit_mw).min(headroom_mw);
        self.soc += accepted * self.efficiency / self.capacity_mwh;
        self.soc = self.soc.min(1.0);
        accepted
    }

    /// Serves a shortfall and returns the power actually delivered (MW).
    ///
    /// Deliverable power is capped by the c-rate power limit and by the
    /// energy above the SOC floor net of discharge losses; SOC drops by the
    /// drawn (pre-loss) energy and is clamped at the floor.
    pub fn discharge(&mut self, shortfall_mw: f64) -> f64 {
        if self.capacity_mwh <= 0.0 || self.soc <= self.soc_min || shortfall_mw <= 0.0 {
            return 0.0;
        }
        let available_mw = (self.soc - self.soc_min) * self.capacity_mwh * self.efficiency;
        let delivered = shortfall_mw.min(self.power_limit_mw).min(available_mw);
        self.soc -= delivered / (self.capacity_mwh * self.efficiency);
        self.soc = self.soc.max(self.soc_min);
        delivered
    }
}
