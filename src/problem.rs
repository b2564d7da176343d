//! Batched evaluation surface consumed by the external many-objective search.
//!
//! The search hands over an N×4 matrix of candidate sizings and receives an
//! N×4 objective matrix and an N×6 constraint matrix back, row-aligned with
//! its input. Rows evaluate in parallel; each row is independent, so the
//! parallel result is bitwise identical to a sequential pass.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::config::SystemConfig;
use crate::constraints::validate_solution;
use crate::decision::DecisionVector;
use crate::error::{ConfigError, EvalError};
use crate::objectives;
use crate::profile::HourlyProfile;
use crate::sim::dispatch::simulate;

/// Row-aligned objective and constraint matrices for one evaluated batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEvaluation {
    /// One `[npc, lpsp, co2, gini]` row per candidate.
    pub objectives: Vec<[f64; 4]>,
    /// One `[bounds, area, lpsp, reserve, grid, re_cap]` row per candidate.
    pub constraints: Vec<[f64; 6]>,
}

/// The sizing problem as seen by the search: frozen configuration plus the
/// shared year of hourly profiles.
///
/// Construction validates the configuration once; evaluations never touch
/// disk or mutate shared state afterwards.
pub struct MicrogridProblem {
    config: SystemConfig,
    profile: Arc<HourlyProfile>,
}

impl MicrogridProblem {
    /// Builds a problem from a validated configuration and loaded profile.
    ///
    /// # Errors
    ///
    /// Returns every configuration validation error found.
    pub fn new(
        config: SystemConfig,
        profile: Arc<HourlyProfile>,
    ) -> Result<Self, Vec<ConfigError>> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self { config, profile })
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn profile(&self) -> &Arc<HourlyProfile> {
        &self.profile
    }

    /// Number of decision variables (matrix columns in).
    pub const N_VARIABLES: usize = 4;
    /// Number of objectives (matrix columns out).
    pub const N_OBJECTIVES: usize = 4;
    /// Number of constraints (matrix columns out).
    pub const N_CONSTRAINTS: usize = 6;

    /// Evaluates a single candidate row.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if an objective leaves its designed
    /// range; the row is not silently repaired.
    pub fn evaluate_one(&self, row: [f64; 4]) -> Result<([f64; 4], [f64; 6]), EvalError> {
        let x = DecisionVector::from_array(row);
        let dispatch = simulate(&x, &self.profile, &self.config);
        let obj = objectives::evaluate(&x, &dispatch, &self.config)?;
        let con = validate_solution(&x, obj.lpsp, dispatch.avg_load_mw(), &self.config);
        Ok((obj.to_array(), con.to_array()))
    }

    /// Evaluates a batch of candidate rows in parallel.
    ///
    /// Output rows are in input order regardless of worker scheduling. A
    /// single failing row fails the whole batch.
    ///
    /// # Errors
    ///
    /// Propagates the lowest-index row error. All rows are evaluated before
    /// the scan, so the surfaced error does not depend on worker count.
    pub fn evaluate_batch(&self, rows: &[[f64; 4]]) -> Result<BatchEvaluation, EvalError> {
        let started = Instant::now();

        let evaluated: Vec<Result<([f64; 4], [f64; 6]), EvalError>> = rows
            .par_iter()
            .map(|row| self.evaluate_one(*row))
            .collect();

        let mut objectives = Vec::with_capacity(rows.len());
        let mut constraints = Vec::with_capacity(rows.len());
        for result in evaluated {
            let (obj, con) = result?;
            objectives.push(obj);
            constraints.push(con);
        }

        log::debug!(
            "evaluated batch of {} candidates in {:.1} ms",
            rows.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(BatchEvaluation {
            objectives,
            constraints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::HOURS_PER_YEAR;

    fn flat_problem() -> MicrogridProblem {
        let profile = HourlyProfile::from_arrays(
            vec![3.75; HOURS_PER_YEAR],
            vec![0.15; HOURS_PER_YEAR],
            vec![0.30; HOURS_PER_YEAR],
            vec![-10.0; HOURS_PER_YEAR],
        )
        .unwrap();
        MicrogridProblem::new(SystemConfig::default(), Arc::new(profile)).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut cfg = SystemConfig::default();
        cfg.technology.diesel_efficiency = 0.0;
        let profile = HourlyProfile::from_arrays(
            vec![1.0; HOURS_PER_YEAR],
            vec![0.0; HOURS_PER_YEAR],
            vec![0.0; HOURS_PER_YEAR],
            vec![0.0; HOURS_PER_YEAR],
        )
        .unwrap();
        let result = MicrogridProblem::new(cfg, Arc::new(profile));
        assert!(result.is_err());
    }

    #[test]
    fn single_row_shapes() {
        let problem = flat_problem();
        let (obj, con) = problem.evaluate_one([3000.0, 2.0, 30.0, 6.0]).unwrap();
        assert_eq!(obj.len(), MicrogridProblem::N_OBJECTIVES);
        assert_eq!(con.len(), MicrogridProblem::N_CONSTRAINTS);
        assert!(obj[0] > 0.0, "npc must be positive");
        assert!((0.0..=1.0).contains(&obj[1]), "lpsp in unit interval");
    }

    #[test]
    fn batch_rows_align_with_input_order() {
        let problem = flat_problem();
        let rows = [
            [1000.0, 1.0, 10.0, 8.0],
            [5000.0, 3.0, 50.0, 4.0],
            [0.0, 0.0, 0.0, 10.0],
            [2000.0, 2.0, 20.0, 6.0],
        ];
        let batch = problem.evaluate_batch(&rows).unwrap();
        assert_eq!(batch.objectives.len(), rows.len());
        assert_eq!(batch.constraints.len(), rows.len());
        for (i, row) in rows.iter().enumerate() {
            let (obj, con) = problem.evaluate_one(*row).unwrap();
            assert_eq!(batch.objectives[i], obj, "objective row {i}");
            assert_eq!(batch.constraints[i], con, "constraint row {i}");
        }
    }

    #[test]
    fn batch_is_deterministic_across_runs() {
        let problem = flat_problem();
        let rows: Vec<[f64; 4]> = (0..32)
            .map(|i| {
                let f = i as f64;
                [f * 250.0, f * 0.15, f * 3.0, 10.0 - f * 0.3]
            })
            .collect();
        let a = problem.evaluate_batch(&rows).unwrap();
        let b = problem.evaluate_batch(&rows).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn failing_row_fails_batch() {
        let problem = flat_problem();
        let rows = [[1000.0, 1.0, 10.0, 8.0], [0.0, 0.0, 0.0, 0.0]];
        // the all-zero candidate has zero NPC, an invariant violation
        assert!(problem.evaluate_batch(&rows).is_err());
    }

    #[test]
    fn lowest_index_error_surfaces_regardless_of_threads() {
        let problem = flat_problem();
        // rows 1 and 3 both violate the NPC invariant with distinct values:
        // zero NPC at index 1, negative NPC at index 3
        let rows = [
            [1000.0, 1.0, 10.0, 8.0],
            [0.0, 0.0, 0.0, 0.0],
            [2000.0, 2.0, 20.0, 6.0],
            [0.0, 0.0, -10.0, 0.0],
        ];

        for threads in [1, 4] {
            let err = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| problem.evaluate_batch(&rows))
                .unwrap_err();
            match err {
                EvalError::Invariant { quantity, value } => {
                    assert_eq!(quantity, "npc_cad");
                    assert_eq!(value, 0.0, "expected index 1's error on {threads} threads");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn below_bound_battery_reports_violation_instead_of_panicking() {
        let problem = flat_problem();
        let (obj, con) = problem.evaluate_one([1000.0, 1.0, -5.0, 6.0]).unwrap();
        assert!(con[0] > 0.0, "bounds violation expected: {con:?}");
        assert!((con[0] - 5.0).abs() < 1e-12);
        assert!(obj[0] > 0.0, "npc stays positive: {obj:?}");
        assert!((0.0..=1.0).contains(&obj[1]));
    }

    #[test]
    fn empty_batch_is_empty_result() {
        let problem = flat_problem();
        let batch = problem.evaluate_batch(&[]).unwrap();
        assert!(batch.objectives.is_empty());
        assert!(batch.constraints.is_empty());
    }
}
