//! Annual hourly input profiles and their shared read-only cache.
//!
//! Profiles are loaded once per configuration and never mutated afterwards;
//! every candidate evaluation in a run reads the same arrays. The cache is an
//! explicitly constructed object owned by the run driver, not a process-wide
//! singleton.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use crate::config::ProfilesConfig;
use crate::error::EvalError;

/// Hours in one simulated year; every profile array has exactly this length.
pub const HOURS_PER_YEAR: usize = 8760;

/// Immutable annual hourly profiles: load, solar CF, wind CF, temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyProfile {
    load_mw: Vec<f64>,
    solar_cf: Vec<f64>,
    wind_cf: Vec<f64>,
    temperature_c: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct LoadRow {
    #[serde(rename = "Load_MW")]
    load_mw: f64,
}

#[derive(Debug, Deserialize)]
struct SolarRow {
    #[serde(rename = "CF_pv")]
    cf_pv: f64,
    #[serde(rename = "T_ambient_C")]
    t_ambient_c: f64,
}

#[derive(Debug, Deserialize)]
struct WindRow {
    #[serde(rename = "CF_wind")]
    cf_wind: f64,
}

impl HourlyProfile {
    /// Builds a profile from in-memory arrays.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any array is not exactly 8760 long.
    pub fn from_arrays(
        load_mw: Vec<f64>,
        solar_cf: Vec<f64>,
        wind_cf: Vec<f64>,
        temperature_c: Vec<f64>,
    ) -> Result<Self, EvalError> {
        for (name, len) in [
            ("load_mw", load_mw.len()),
            ("solar_cf", solar_cf.len()),
            ("wind_cf", wind_cf.len()),
            ("temperature_c", temperature_c.len()),
        ] {
            if len != HOURS_PER_YEAR {
                return Err(EvalError::profile(
                    name,
                    format!("expected {HOURS_PER_YEAR} hours, got {len}"),
                ));
            }
        }
        Ok(Self {
            load_mw,
            solar_cf,
            wind_cf,
            temperature_c,
        })
    }

    /// Loads the three CSV profile files named in the configuration.
    ///
    /// Expected columns: `Load_MW` in the load file, `CF_pv` and `T_ambient_C`
    /// in the solar file, `CF_wind` in the wind file. Extra columns are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns a profile error if any file cannot be read, a row fails to
    /// parse, or the row count is not 8760.
    pub fn from_csv_files(paths: &ProfilesConfig) -> Result<Self, EvalError> {
        let mut load_mw = Vec::with_capacity(HOURS_PER_YEAR);
        for row in read_rows::<LoadRow>(Path::new(&paths.load_path))? {
            load_mw.push(row.load_mw);
        }

        let mut solar_cf = Vec::with_capacity(HOURS_PER_YEAR);
        let mut temperature_c = Vec::with_capacity(HOURS_PER_YEAR);
        for row in read_rows::<SolarRow>(Path::new(&paths.solar_path))? {
            solar_cf.push(row.cf_pv);
            temperature_c.push(row.t_ambient_c);
        }

        let mut wind_cf = Vec::with_capacity(HOURS_PER_YEAR);
        for row in read_rows::<WindRow>(Path::new(&paths.wind_path))? {
            wind_cf.push(row.cf_wind);
        }

        Self::from_arrays(load_mw, solar_cf, wind_cf, temperature_c)
    }

    /// Hourly community load (MW).
    pub fn load_mw(&self) -> &[f64] {
        &self.load_mw
    }

    /// Hourly solar capacity factor (0..1).
    pub fn solar_cf(&self) -> &[f64] {
        &self.solar_cf
    }

    /// Hourly wind capacity factor (0..1).
    pub fn wind_cf(&self) -> &[f64] {
        &self.wind_cf
    }

    /// Hourly ambient temperature (°C).
    pub fn temperature_c(&self) -> &[f64] {
        &self.temperature_c
    }

    /// Total annual load (MWh).
    pub fn total_load_mwh(&self) -> f64 {
        self.load_mw.iter().sum()
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, EvalError> {
    let display = path.display().to_string();
    let file =
        File::open(path).map_err(|e| EvalError::profile(&display, format!("cannot open: {e}")))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut rows = Vec::with_capacity(HOURS_PER_YEAR);
    for record in reader.deserialize() {
        let row: T =
            record.map_err(|e| EvalError::profile(&display, format!("bad row: {e}")))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Memoizing store for loaded profiles, keyed by their source paths.
///
/// Owned by the run driver and passed by reference wherever a profile is
/// needed; hands out `Arc` clones so parallel evaluation shares one copy.
#[derive(Debug, Default)]
pub struct ProfileCache {
    entries: HashMap<(String, String, String), Arc<HourlyProfile>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached profile for these paths, loading it on first use.
    ///
    /// # Errors
    ///
    /// Propagates any load error from [`HourlyProfile::from_csv_files`].
    pub fn get_or_load(&mut self, paths: &ProfilesConfig) -> Result<Arc<HourlyProfile>, EvalError> {
        let key = (
            paths.load_path.clone(),
            paths.solar_path.clone(),
            paths.wind_path.clone(),
        );
        if let Some(profile) = self.entries.get(&key) {
            return Ok(Arc::clone(profile));
        }
        let profile = Arc::new(HourlyProfile::from_csv_files(paths)?);
        debug!(
            "profile cache: loaded load={}h solar={}h wind={}h from {}",
            profile.load_mw.len(),
            profile.solar_cf.len(),
            profile.wind_cf.len(),
            paths.load_path,
        );
        self.entries.insert(key, Arc::clone(&profile));
        Ok(profile)
    }

    /// Registers an in-memory profile under the given paths key.
    pub fn insert(&mut self, paths: &ProfilesConfig, profile: HourlyProfile) -> Arc<HourlyProfile> {
        let key = (
            paths.load_path.clone(),
            paths.solar_path.clone(),
            paths.wind_path.clone(),
        );
        let profile = Arc::new(profile);
        self.entries.insert(key, Arc::clone(&profile));
        profile
    }

    /// Number of distinct profiles held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
