//! Shared test fixtures for integration tests.

// not every test binary uses every fixture
#![allow(dead_code)]

use std::sync::Arc;

use arcgrid::config::SystemConfig;
use arcgrid::problem::MicrogridProblem;
use arcgrid::profile::{HOURS_PER_YEAR, HourlyProfile};

/// Synthetic but plausible Arctic community year: ~3.75 MW average load with
/// diurnal and seasonal swings, strongly seasonal solar, gusty wind, and
/// temperatures from -40 to +15 °C.
///
/// Deterministic; every shape is a closed-form function of the hour index.
pub fn realistic_profile() -> HourlyProfile {
    let mut load = Vec::with_capacity(HOURS_PER_YEAR);
    let mut solar = Vec::with_capacity(HOURS_PER_YEAR);
    let mut wind = Vec::with_capacity(HOURS_PER_YEAR);
    let mut temp = Vec::with_capacity(HOURS_PER_YEAR);

    for t in 0..HOURS_PER_YEAR {
        let hour_of_day = (t % 24) as f64;
        let day_of_year = (t / 24) as f64;
        // winter peak, evening peak
        let seasonal = (2.0 * std::f64::consts::PI * day_of_year / 365.0).cos();
        let diurnal = (2.0 * std::f64::consts::PI * (hour_of_day - 18.0) / 24.0).cos();
        load.push(3.75 + 0.6 * seasonal + 0.4 * diurnal);

        // polar night in midwinter, midnight sun in midsummer
        let daylight = (0.5 - 0.5 * seasonal).clamp(0.0, 1.0);
        let sun_angle = (std::f64::consts::PI * (hour_of_day - 6.0) / 12.0).sin();
        solar.push((daylight * sun_angle).clamp(0.0, 0.85));

        // breezy with a slow multi-day swell
        let swell = (2.0 * std::f64::consts::PI * t as f64 / 97.0).sin();
        wind.push((0.30 + 0.20 * swell).clamp(0.0, 0.95));

        temp.push(-12.5 - 27.5 * seasonal + 3.0 * diurnal.abs());
    }

    HourlyProfile::from_arrays(load, solar, wind, temp).expect("fixture arrays are 8760 long")
}

/// Default-configured problem over the realistic fixture profile.
pub fn default_problem() -> MicrogridProblem {
    MicrogridProblem::new(SystemConfig::default(), Arc::new(realistic_profile()))
        .expect("default config is valid")
}

/// A comfortably feasible mid-range sizing used across tests.
pub fn mid_range_candidate() -> [f64; 4] {
    [3000.0, 2.0, 30.0, 6.0]
}
