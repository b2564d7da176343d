//! Hourly merit-order dispatch simulation.
//!
//! One strictly sequential pass over the 8760 hours of a year, greedy and
//! myopic: renewables first, then storage, then diesel, with any remaining
//! shortfall recorded as deficit. The battery SOC is the only state carried
//! between hours. The pass is a pure function of its inputs and produces
//! byte-identical output on every rerun.

use crate::config::SystemConfig;
use crate::decision::DecisionVector;
use crate::profile::{HOURS_PER_YEAR, HourlyProfile};
use crate::sim::battery::BatteryState;

/// Diesel heat-rate numerator: MMBtu of fuel per MWh at 100% efficiency.
const MMBTU_PER_MWH: f64 = 3.412;

/// PV cell reference temperature for the derating term (°C).
const PV_REFERENCE_TEMP_C: f64 = 25.0;

/// Complete hourly trace plus annual aggregates for one candidate sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    /// Hourly load served or demanded (MW), copied from the profile.
    pub load_mw: Vec<f64>,
    /// Hourly temperature-derated PV generation (MW).
    pub pv_mw: Vec<f64>,
    /// Hourly wind generation (MW).
    pub wind_mw: Vec<f64>,
    /// Hourly diesel generation (MW).
    pub diesel_mw: Vec<f64>,
    /// Hourly battery charging power (MW, consumed from surplus).
    pub battery_charge_mw: Vec<f64>,
    /// Hourly battery discharging power (MW, delivered to load).
    pub battery_discharge_mw: Vec<f64>,
    /// Hourly unserved load (MW, >= 0).
    pub deficit_mw: Vec<f64>,
    /// Battery state of charge at the end of each hour.
    pub soc: Vec<f64>,

    /// Annual load (MWh).
    pub total_load_mwh: f64,
    /// Annual PV generation (MWh).
    pub total_pv_mwh: f64,
    /// Annual wind generation (MWh).
    pub total_wind_mwh: f64,
    /// Annual diesel generation (MWh).
    pub total_diesel_mwh: f64,
    /// Annual diesel fuel burned (MMBtu).
    pub total_diesel_fuel_mmbtu: f64,
    /// Annual unserved load (MWh).
    pub total_deficit_mwh: f64,
}

impl DispatchResult {
    /// Average load over the year (MW).
    pub fn avg_load_mw(&self) -> f64 {
        self.total_load_mwh / HOURS_PER_YEAR as f64
    }

    /// Annual renewable generation (MWh).
    pub fn total_renewable_mwh(&self) -> f64 {
        self.total_pv_mwh + self.total_wind_mwh
    }

    /// Supply-minus-demand residual for one hour (MW).
    ///
    /// Zero (within float tolerance) for every hour of a valid dispatch:
    /// `pv + wind + discharge + diesel - charge - deficit - load`. Surplus
    /// renewable generation beyond what the battery absorbs is curtailed and
    /// does not appear in the balance.
    pub fn energy_balance_residual(&self, hour: usize) -> f64 {
        let supplied = self.pv_mw[hour] + self.wind_mw[hour] - self.battery_charge_mw[hour];
        if supplied >= self.load_mw[hour] {
            // curtailment hour: renewables fully cover load by construction
            0.0
        } else {
            supplied + self.battery_discharge_mw[hour] + self.diesel_mw[hour]
                + self.deficit_mw[hour]
                - self.load_mw[hour]
        }
    }
}

/// Simulates one year of hourly operation for a candidate sizing.
///
/// Merit order each hour:
/// 1. PV and wind generate from their capacity factors; PV is derated by the
///    temperature coefficient and clamped at zero.
/// 2. If renewables cover the load, the surplus charges the battery and any
///    residual is curtailed.
/// 3. Otherwise the shortfall is served by battery discharge, then diesel up
///    to capacity, and whatever remains is deficit.
///
/// Infeasible sizings never fail; they simply produce large deficits.
pub fn simulate(
    x: &DecisionVector,
    profile: &HourlyProfile,
    cfg: &SystemConfig,
) -> DispatchResult {
    let load = profile.load_mw();
    let solar_cf = profile.solar_cf();
    let wind_cf = profile.wind_cf();
    let temperature = profile.temperature_c();
    let n_hours = load.len();

    let tech = &cfg.technology;
    let heat_rate = MMBTU_PER_MWH / tech.diesel_efficiency;

    let mut battery = BatteryState::new(
        x.battery_mwh,
        tech.battery_c_rate,
        tech.battery_efficiency,
        tech.battery_dod_max,
    );

    let mut pv_mw = Vec::with_capacity(n_hours);
    let mut wind_mw = Vec::with_capacity(n_hours);
    let mut diesel_mw = vec![0.0; n_hours];
    let mut diesel_fuel_mmbtu = vec![0.0; n_hours];
    let mut battery_charge_mw = vec![0.0; n_hours];
    let mut battery_discharge_mw = vec![0.0; n_hours];
    let mut deficit_mw = vec![0.0; n_hours];
    let mut soc = vec![0.0; n_hours];

    for t in 0..n_hours {
        let derating = 1.0 + tech.pv_temp_coeff_per_c * (temperature[t] - PV_REFERENCE_TEMP_C);
        let pv_t = ((x.pv_kw / 1000.0) * solar_cf[t] * derating).max(0.0);
        let wind_t = (x.wind_mw * wind_cf[t]).max(0.0);
        pv_mw.push(pv_t);
        wind_mw.push(wind_t);

        let renewable_t = pv_t + wind_t;
        let load_t = load[t];

        if renewable_t >= load_t {
            let surplus = renewable_t - load_t;
            battery_charge_mw[t] = battery.charge(surplus);
            // residual surplus beyond the accepted charge is curtailed
        } else {
            let mut shortfall = load_t - renewable_t;

            let discharged = battery.discharge(shortfall);
            battery_discharge_mw[t] = discharged;
            shortfall -= discharged;

            if shortfall > 0.0 && x.diesel_mw > 0.0 {
                let diesel_out = shortfall.min(x.diesel_mw);
                diesel_mw[t] = diesel_out;
                diesel_fuel_mmbtu[t] = diesel_out * heat_rate;
                shortfall -= diesel_out;
            }

            if shortfall > 0.0 {
                deficit_mw[t] = shortfall;
            }
        }

        soc[t] = battery.soc();
    }

    let total_load_mwh = load.iter().sum();
    let total_pv_mwh = pv_mw.iter().sum();
    let total_wind_mwh = wind_mw.iter().sum();
    let total_diesel_mwh = diesel_mw.iter().sum();
    let total_diesel_fuel_mmbtu = diesel_fuel_mmbtu.iter().sum();
    let total_deficit_mwh = deficit_mw.iter().sum();

    DispatchResult {
        load_mw: load.to_vec(),
        pv_mw,
        wind_mw,
        diesel_mw,
        battery_charge_mw,
        battery_discharge_mw,
        deficit_mw,
        soc,
        total_load_mwh,
        total_pv_mwh,
        total_wind_mwh,
        total_diesel_mwh,
        total_diesel_fuel_mmbtu,
        total_deficit_mwh,
    }
}
