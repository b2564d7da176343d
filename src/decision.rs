//! Candidate sizing vectors and their box bounds.

use serde::Deserialize;

/// One candidate microgrid sizing, produced by the external search.
///
/// Immutable once handed to the core; every evaluation derives from these four
/// capacities plus the shared hourly profile and configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionVector {
    /// Installed solar PV capacity (kW).
    pub pv_kw: f64,
    /// Installed wind capacity (MW).
    pub wind_mw: f64,
    /// Battery energy capacity (MWh).
    pub battery_mwh: f64,
    /// Diesel generator capacity (MW).
    pub diesel_mw: f64,
}

impl DecisionVector {
    pub fn new(pv_kw: f64, wind_mw: f64, battery_mwh: f64, diesel_mw: f64) -> Self {
        Self {
            pv_kw,
            wind_mw,
            battery_mwh,
            diesel_mw,
        }
    }

    /// Builds a decision vector from one row of the search's N×4 matrix.
    ///
    /// Variable order is fixed: `[pv_kw, wind_mw, battery_mwh, diesel_mw]`.
    pub fn from_array(row: [f64; 4]) -> Self {
        Self {
            pv_kw: row[0],
            wind_mw: row[1],
            battery_mwh: row[2],
            diesel_mw: row[3],
        }
    }

    /// Returns the vector in the fixed matrix column order.
    pub fn to_array(self) -> [f64; 4] {
        [self.pv_kw, self.wind_mw, self.battery_mwh, self.diesel_mw]
    }
}

/// Box bounds for the four decision variables, `[lower, upper]` each.
///
/// Defaults match the v8 study configuration: PV 0–10 000 kW, wind 0–5 MW,
/// battery 0–100 MWh, diesel 0–10 MW.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bounds {
    pub pv_kw: [f64; 2],
    pub wind_mw: [f64; 2],
    pub battery_mwh: [f64; 2],
    pub diesel_mw: [f64; 2],
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            pv_kw: [0.0, 10_000.0],
            wind_mw: [0.0, 5.0],
            battery_mwh: [0.0, 100.0],
            diesel_mw: [0.0, 10.0],
        }
    }
}

impl Bounds {
    /// Lower bounds in matrix column order.
    pub fn lower(&self) -> [f64; 4] {
        [
            self.pv_kw[0],
            self.wind_mw[0],
            self.battery_mwh[0],
            self.diesel_mw[0],
        ]
    }

    /// Upper bounds in matrix column order.
    pub fn upper(&self) -> [f64; 4] {
        [
            self.pv_kw[1],
            self.wind_mw[1],
            self.battery_mwh[1],
            self.diesel_mw[1],
        ]
    }

    /// True when every bound pair satisfies `lower <= upper`.
    pub fn is_ordered(&self) -> bool {
        self.lower()
            .iter()
            .zip(self.upper())
            .all(|(lo, hi)| *lo <= hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_round_trip_preserves_order() {
        let x = DecisionVector::new(3000.0, 2.0, 30.0, 6.0);
        assert_eq!(DecisionVector::from_array(x.to_array()), x);
        assert_eq!(x.to_array(), [3000.0, 2.0, 30.0, 6.0]);
    }

    #[test]
    fn default_bounds_are_ordered() {
        let b = Bounds::default();
        assert!(b.is_ordered());
        assert_eq!(b.upper(), [10_000.0, 5.0, 100.0, 10.0]);
    }

    #[test]
    fn inverted_bounds_detected() {
        let b = Bounds {
            diesel_mw: [10.0, 0.0],
            ..Bounds::default()
        };
        assert!(!b.is_ordered());
    }
}
