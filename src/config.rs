//! TOML-based system configuration: economics, technology, policy, equity.
//!
//! All fields default to the v8 Inuvik study parameters, so a partial TOML
//! file (or none at all) yields a runnable configuration. Validation reports
//! every violated field with a dotted path rather than stopping at the first.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::decision::Bounds;
use crate::error::ConfigError;

/// Top-level system configuration parsed from TOML.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    /// Paths to the CSV-backed hourly profiles.
    pub profiles: ProfilesConfig,
    /// Discounting, capital, O&M, fuel, and replacement costs.
    pub economics: EconomicsConfig,
    /// Component efficiencies and physical coefficients.
    pub technology: TechnologyConfig,
    /// Siting areas, reliability limits, reserve, and grid policy.
    pub policy: PolicyConfig,
    /// Household equity (Gini) parameters.
    pub equity: EquityConfig,
    /// Decision-variable box bounds.
    pub bounds: Bounds,
}

/// Paths to the three CSV profile files.
///
/// Empty paths are allowed when profiles are supplied in memory instead.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilesConfig {
    /// CSV with a `Load_MW` column, 8760 rows.
    pub load_path: String,
    /// CSV with `CF_pv` and `T_ambient_C` columns, 8760 rows.
    pub solar_path: String,
    /// CSV with a `CF_wind` column, 8760 rows.
    pub wind_path: String,
}

/// Discounting, capital, O&M, fuel, and replacement cost parameters (CAD).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicsConfig {
    /// Real discount rate (fraction per year).
    pub discount_rate: f64,
    /// Project lifetime (years).
    pub lifetime_years: u32,
    /// PV capital cost (CAD per kW).
    pub pv_capital_cost_per_kw: f64,
    /// Wind capital cost (CAD per kW).
    pub wind_capital_cost_per_kw: f64,
    /// Battery capital cost (CAD per kWh).
    pub battery_capital_cost_per_kwh: f64,
    /// Diesel capital cost (CAD per kW).
    pub diesel_capital_cost_per_kw: f64,
    /// PV O&M cost (CAD per kW per year).
    pub pv_om_cost_per_kw_yr: f64,
    /// Wind O&M cost (CAD per kW per year).
    pub wind_om_cost_per_kw_yr: f64,
    /// Battery O&M cost (CAD per kWh per year).
    pub battery_om_cost_per_kwh_yr: f64,
    /// Diesel fuel cost (CAD per MMBtu).
    pub diesel_fuel_cost_per_mmbtu: f64,
    /// Year the battery bank is replaced once.
    pub battery_replacement_years: u32,
    /// Fraction of battery capital spent at replacement.
    pub battery_replacement_fraction: f64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            discount_rate: 0.03,
            lifetime_years: 25,
            pv_capital_cost_per_kw: 3250.0,
            wind_capital_cost_per_kw: 5500.0,
            battery_capital_cost_per_kwh: 500.0,
            diesel_capital_cost_per_kw: 1000.0,
            pv_om_cost_per_kw_yr: 10.0,
            wind_om_cost_per_kw_yr: 75.0,
            battery_om_cost_per_kwh_yr: 8.8,
            diesel_fuel_cost_per_mmbtu: 20.0,
            battery_replacement_years: 10,
            battery_replacement_fraction: 1.0,
        }
    }
}

/// Component efficiencies and physical coefficients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TechnologyConfig {
    /// PV output derating per °C above the 25 °C reference (negative).
    pub pv_temp_coeff_per_c: f64,
    /// Diesel generator electrical efficiency (0..1].
    pub diesel_efficiency: f64,
    /// Diesel minimum stable load as a fraction of capacity.
    ///
    /// Carried for configuration completeness; the myopic dispatch does not
    /// gate on it.
    pub diesel_min_load_fraction: f64,
    /// Battery charge/discharge power limit relative to capacity (per hour).
    pub battery_c_rate: f64,
    /// Battery one-way charge/discharge efficiency (0..1].
    pub battery_efficiency: f64,
    /// Maximum battery depth of discharge (0..1].
    pub battery_dod_max: f64,
    /// Diesel CO2 emission factor (kg per MMBtu).
    pub co2_kg_per_mmbtu: f64,
}

impl Default for TechnologyConfig {
    fn default() -> Self {
        Self {
            pv_temp_coeff_per_c: -0.004,
            diesel_efficiency: 0.30,
            diesel_min_load_fraction: 0.30,
            battery_c_rate: 0.25,
            battery_efficiency: 0.90,
            battery_dod_max: 0.80,
            co2_kg_per_mmbtu: 72.22,
        }
    }
}

/// Siting areas, reliability limits, reserve, and grid policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// PV-zone footprint per installed kW (m²).
    pub area_pv_per_kw: f64,
    /// Wind-zone footprint per installed MW (m²).
    pub area_wind_per_mw: f64,
    /// Battery footprint per MWh, co-located in the PV zone (m²).
    pub area_battery_per_mwh: f64,
    /// Available PV-zone area (m²).
    pub area_available_pv_m2: f64,
    /// Available wind-zone area (m²).
    pub area_available_wind_m2: f64,
    /// Maximum acceptable loss-of-power-supply probability.
    pub lpsp_limit: f64,
    /// Spinning reserve requirement as a fraction of average load.
    pub reserve_fraction: f64,
    /// Installed-renewable cap as a multiple of average load.
    pub renewable_fraction_max: f64,
    /// Whether the renewable cap constraint is enforced.
    pub enable_renewable_cap: bool,
    /// Whether the community has a grid interconnection.
    pub grid_connected: bool,
    /// Grid import limit (MW), only meaningful when grid-connected.
    pub max_import_mw: f64,
    /// Grid export limit (MW), only meaningful when grid-connected.
    pub max_export_mw: f64,
    /// Feasibility tolerance on the aggregate constraint violation.
    pub constraint_tolerance: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            area_pv_per_kw: 2.0,
            area_wind_per_mw: 186_050.0,
            area_battery_per_mwh: 10.0,
            area_available_pv_m2: 500_000.0,
            area_available_wind_m2: 3_000_000.0,
            lpsp_limit: 0.05,
            reserve_fraction: 0.15,
            renewable_fraction_max: 1.0,
            enable_renewable_cap: false,
            grid_connected: false,
            max_import_mw: 0.0,
            max_export_mw: 0.0,
            constraint_tolerance: 1e-6,
        }
    }
}

/// Household equity (Gini) parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EquityConfig {
    /// Synthetic household count for the benefit allocation.
    pub n_households: usize,
    /// Seed for the capture-multiplier draw; the only stochastic source in
    /// the core.
    pub seed: u64,
}

impl Default for EquityConfig {
    fn default() -> Self {
        Self {
            n_households: 1220,
            seed: 42,
        }
    }
}

impl SystemConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let eco = &self.economics;
        if eco.discount_rate < 0.0 {
            errors.push(ConfigError::new("economics.discount_rate", "must be >= 0"));
        }
        if eco.lifetime_years == 0 || eco.lifetime_years > 1000 {
            errors.push(ConfigError::new(
                "economics.lifetime_years",
                "must be in [1, 1000]",
            ));
        }
        if eco.battery_replacement_years > eco.lifetime_years {
            errors.push(ConfigError::new(
                "economics.battery_replacement_years",
                "must be <= economics.lifetime_years",
            ));
        }
        if !(0.0..=1.0).contains(&eco.battery_replacement_fraction) {
            errors.push(ConfigError::new(
                "economics.battery_replacement_fraction",
                "must be in [0.0, 1.0]",
            ));
        }
        for (field, value) in [
            (
                "economics.pv_capital_cost_per_kw",
                eco.pv_capital_cost_per_kw,
            ),
            (
                "economics.wind_capital_cost_per_kw",
                eco.wind_capital_cost_per_kw,
            ),
            (
                "economics.battery_capital_cost_per_kwh",
                eco.battery_capital_cost_per_kwh,
            ),
            (
                "economics.diesel_capital_cost_per_kw",
                eco.diesel_capital_cost_per_kw,
            ),
            (
                "economics.diesel_fuel_cost_per_mmbtu",
                eco.diesel_fuel_cost_per_mmbtu,
            ),
        ] {
            if value < 0.0 {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        let tech = &self.technology;
        if tech.diesel_efficiency <= 0.0 || tech.diesel_efficiency > 1.0 {
            errors.push(ConfigError::new(
                "technology.diesel_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }
        if !(0.0..=1.0).contains(&tech.diesel_min_load_fraction) {
            errors.push(ConfigError::new(
                "technology.diesel_min_load_fraction",
                "must be in [0.0, 1.0]",
            ));
        }
        if tech.battery_efficiency <= 0.0 || tech.battery_efficiency > 1.0 {
            errors.push(ConfigError::new(
                "technology.battery_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }
        if tech.battery_dod_max <= 0.0 || tech.battery_dod_max > 1.0 {
            errors.push(ConfigError::new(
                "technology.battery_dod_max",
                "must be in (0.0, 1.0]",
            ));
        }
        if tech.battery_c_rate <= 0.0 {
            errors.push(ConfigError::new("technology.battery_c_rate", "must be > 0"));
        }
        if tech.co2_kg_per_mmbtu < 0.0 {
            errors.push(ConfigError::new(
                "technology.co2_kg_per_mmbtu",
                "must be >= 0",
            ));
        }

        let pol = &self.policy;
        if !(0.0..=1.0).contains(&pol.lpsp_limit) {
            errors.push(ConfigError::new(
                "policy.lpsp_limit",
                "must be in [0.0, 1.0]",
            ));
        }
        if pol.reserve_fraction < 0.0 {
            errors.push(ConfigError::new("policy.reserve_fraction", "must be >= 0"));
        }
        if pol.renewable_fraction_max < 0.0 {
            errors.push(ConfigError::new(
                "policy.renewable_fraction_max",
                "must be >= 0",
            ));
        }
        for (field, value) in [
            ("policy.area_pv_per_kw", pol.area_pv_per_kw),
            ("policy.area_wind_per_mw", pol.area_wind_per_mw),
            ("policy.area_battery_per_mwh", pol.area_battery_per_mwh),
            ("policy.area_available_pv_m2", pol.area_available_pv_m2),
            ("policy.area_available_wind_m2", pol.area_available_wind_m2),
        ] {
            if value < 0.0 {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }
        if pol.constraint_tolerance < 0.0 {
            errors.push(ConfigError::new(
                "policy.constraint_tolerance",
                "must be >= 0",
            ));
        }
        if !pol.grid_connected && (pol.max_import_mw != 0.0 || pol.max_export_mw != 0.0) {
            errors.push(ConfigError::new(
                "policy.max_import_mw",
                "grid limits must be 0 for islanded systems",
            ));
        }

        if self.equity.n_households < 2 {
            errors.push(ConfigError::new("equity.n_households", "must be >= 2"));
        }

        if !self.bounds.is_ordered() {
            errors.push(ConfigError::new(
                "bounds",
                "lower must be <= upper for every variable",
            ));
        }

        errors
    }
}
