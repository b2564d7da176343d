//! Per-generation convergence metrics and the early-stop controller.
//!
//! The tracker observes the non-dominated front after each generation,
//! computes exact hypervolume plus secondary spread metrics, and tells the
//! caller whether the search has stagnated. It never raises; stopping is a
//! return value the driving loop acts on.

use crate::error::EvalError;

/// What the driving loop should do after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Keep searching.
    Continue,
    /// Hypervolume has stagnated; stop the run.
    Stop,
}

/// Lifecycle of a tracker. Once stopped, a tracker stays stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Running,
    Stopped,
}

/// Metrics recorded for one observed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceSample {
    pub generation: u32,
    /// Number of non-dominated solutions in the observed front.
    pub front_size: usize,
    pub hypervolume: f64,
    /// Only present when a reference front was configured; consumers that
    /// need a numeric value should read `None` as infinite.
    pub igd_plus: Option<f64>,
    pub spacing: f64,
    pub diversity: f64,
}

/// Tracker parameters. The reference point must dominate-ward bound every
/// objective value the search can produce, or front points fall out of the
/// hypervolume.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Hypervolume reference point, one coordinate per objective.
    pub ref_point: Vec<f64>,
    /// Known Pareto front for IGD+ (optional, rarely available in production).
    pub reference_front: Option<Vec<Vec<f64>>>,
    /// Record and log metrics every this many generations.
    pub log_every: u32,
    /// Consecutive non-improving generations before stopping.
    pub stagnation_generations: u32,
    /// Relative improvement below this fraction counts as stagnant.
    pub stagnation_tolerance: f64,
}

impl TrackerConfig {
    /// Defaults tuned for the four-objective sizing runs: observe every
    /// generation, log every 5th, stop after 20 stagnant generations.
    pub fn new(ref_point: Vec<f64>) -> Self {
        Self {
            ref_point,
            reference_front: None,
            log_every: 5,
            stagnation_generations: 20,
            stagnation_tolerance: 0.001,
        }
    }
}

/// Observes fronts generation by generation and decides when to stop.
#[derive(Debug, Clone)]
pub struct ConvergenceTracker {
    config: TrackerConfig,
    best_hv: Option<f64>,
    stagnant: u32,
    state: TrackerState,
    samples: Vec<ConvergenceSample>,
}

impl ConvergenceTracker {
    /// Creates a tracker.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference point is empty or the stop window
    /// is zero.
    pub fn new(config: TrackerConfig) -> Result<Self, EvalError> {
        if config.ref_point.is_empty() {
            return Err(EvalError::Invariant {
                quantity: "ref_point dimension",
                value: 0.0,
            });
        }
        if config.stagnation_generations == 0 {
            return Err(EvalError::Invariant {
                quantity: "stagnation_generations",
                value: 0.0,
            });
        }
        Ok(Self {
            config,
            best_hv: None,
            stagnant: 0,
            state: TrackerState::Running,
            samples: Vec::new(),
        })
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Best hypervolume seen so far, if any generation has been observed.
    pub fn best_hypervolume(&self) -> Option<f64> {
        self.best_hv
    }

    /// Metric history at the logging cadence.
    pub fn samples(&self) -> &[ConvergenceSample] {
        &self.samples
    }

    /// Observes one generation's non-dominated front.
    ///
    /// The first observation seeds the baseline and already counts toward
    /// the stagnation window, so a front that never improves stops after
    /// exactly `stagnation_generations` observations. An improvement must
    /// exceed the relative tolerance to reset the window.
    pub fn observe(&mut self, generation: u32, front: &[Vec<f64>]) -> Signal {
        if self.state == TrackerState::Stopped {
            return Signal::Stop;
        }

        let hv = hypervolume(front, &self.config.ref_point);

        match self.best_hv {
            None => {
                self.best_hv = Some(hv);
                self.stagnant = 1;
            }
            Some(best) => {
                if hv > best * (1.0 + self.config.stagnation_tolerance) {
                    self.best_hv = Some(hv);
                    self.stagnant = 0;
                } else {
                    self.stagnant += 1;
                }
            }
        }

        if generation == 1 || generation % self.config.log_every == 0 {
            let igd = self
                .config
                .reference_front
                .as_deref()
                .map(|reference| igd_plus(front, reference));
            let sp = spacing(front);
            let div = diversity(front);
            log::info!(
                "Gen {generation}: N={} HV={hv:.6} IGD+={} SP={sp:.4} DIV={div:.4}",
                front.len(),
                igd.map_or_else(|| "n/a".to_string(), |v| format!("{v:.6}")),
            );
            self.samples.push(ConvergenceSample {
                generation,
                front_size: front.len(),
                hypervolume: hv,
                igd_plus: igd,
                spacing: sp,
                diversity: div,
            });
        }

        if self.stagnant >= self.config.stagnation_generations {
            log::info!(
                "Gen {generation}: hypervolume stagnant for {} generations, stopping",
                self.stagnant
            );
            self.state = TrackerState::Stopped;
            Signal::Stop
        } else {
            Signal::Continue
        }
    }
}

/// Exact hypervolume of a minimization front against a reference point.
///
/// Uses the WFG exclusive-volume recursion, exact in any dimension. Only
/// points strictly dominating the reference point in every coordinate
/// contribute; an empty contributing set yields 0.0. Practical for the
/// front sizes this search produces (tens of points, four objectives).
pub fn hypervolume(front: &[Vec<f64>], ref_point: &[f64]) -> f64 {
    let contributing: Vec<Vec<f64>> = front
        .iter()
        .filter(|p| p.len() == ref_point.len() && p.iter().zip(ref_point).all(|(a, r)| a < r))
        .cloned()
        .collect();
    wfg(&contributing, ref_point)
}

fn wfg(points: &[Vec<f64>], ref_point: &[f64]) -> f64 {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| exclusive_volume(p, &points[i + 1..], ref_point))
        .sum()
}

fn exclusive_volume(p: &[f64], rest: &[Vec<f64>], ref_point: &[f64]) -> f64 {
    let inclusive: f64 = p.iter().zip(ref_point).map(|(a, r)| r - a).product();
    if rest.is_empty() {
        return inclusive;
    }
    // limit each remaining point to the part of its box inside p's box
    let limited: Vec<Vec<f64>> = rest
        .iter()
        .map(|q| q.iter().zip(p).map(|(a, b)| a.max(*b)).collect())
        .collect();
    inclusive - wfg(&non_dominated(&limited), ref_point)
}

/// Keeps the points of a minimization set not weakly dominated by another.
fn non_dominated(points: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut kept: Vec<Vec<f64>> = Vec::with_capacity(points.len());
    'outer: for (i, p) in points.iter().enumerate() {
        for (j, q) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            let dominates = q.iter().zip(p).all(|(a, b)| a <= b);
            // on ties, keep only the first occurrence
            if dominates && (q != p || j < i) {
                continue 'outer;
            }
        }
        kept.push(p.clone());
    }
    kept
}

/// Spacing metric: standard deviation of nearest-neighbor Euclidean
/// distances. Zero for fronts of fewer than two points and for perfectly
/// even fronts.
pub fn spacing(front: &[Vec<f64>]) -> f64 {
    let n = front.len();
    if n < 2 {
        return 0.0;
    }
    let distances: Vec<f64> = front
        .iter()
        .enumerate()
        .map(|(i, p)| {
            front
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, q)| {
                    p.iter()
                        .zip(q)
                        .map(|(a, b)| (a - b).powi(2))
                        .sum::<f64>()
                        .sqrt()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    let mean = distances.iter().sum::<f64>() / n as f64;
    let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    variance.sqrt()
}

/// Spread of the front: sum of squared distances to the centroid.
/// Zero for fronts of fewer than two points.
pub fn diversity(front: &[Vec<f64>]) -> f64 {
    let n = front.len();
    if n < 2 {
        return 0.0;
    }
    let dim = front[0].len();
    let mut centroid = vec![0.0; dim];
    for p in front {
        for (c, a) in centroid.iter_mut().zip(p) {
            *c += a / n as f64;
        }
    }
    front
        .iter()
        .map(|p| {
            p.iter()
                .zip(&centroid)
                .map(|(a, c)| (a - c).powi(2))
                .sum::<f64>()
        })
        .sum()
}

/// IGD+ of a minimization front against a known reference front: the mean,
/// over reference points, of the smallest dominated-distance
/// `‖max(p - z, 0)‖` to any front point. Infinite when the reference front
/// is empty.
pub fn igd_plus(front: &[Vec<f64>], reference_front: &[Vec<f64>]) -> f64 {
    if reference_front.is_empty() {
        return f64::INFINITY;
    }
    let total: f64 = reference_front
        .iter()
        .map(|z| {
            front
                .iter()
                .map(|p| {
                    p.iter()
                        .zip(z)
                        .map(|(a, b)| (a - b).max(0.0).powi(2))
                        .sum::<f64>()
                        .sqrt()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    total / reference_front.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(stagnation: u32) -> ConvergenceTracker {
        let mut cfg = TrackerConfig::new(vec![10.0, 10.0]);
        cfg.stagnation_generations = stagnation;
        ConvergenceTracker::new(cfg).unwrap()
    }

    #[test]
    fn hypervolume_single_point() {
        let hv = hypervolume(&[vec![0.0, 0.0, 0.0]], &[1.0, 1.0, 1.0]);
        assert!((hv - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hypervolume_two_point_overlap() {
        // boxes of area 2 each, overlapping in a unit square
        let front = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
        let hv = hypervolume(&front, &[3.0, 3.0]);
        assert!((hv - 3.0).abs() < 1e-12);
    }

    #[test]
    fn hypervolume_ignores_dominated_and_outside_points() {
        let front = vec![
            vec![1.0, 1.0],
            vec![2.0, 2.0], // dominated by (1,1)
            vec![4.0, 0.5], // outside the reference point
        ];
        let hv = hypervolume(&front, &[3.0, 3.0]);
        assert!((hv - 4.0).abs() < 1e-12);
    }

    #[test]
    fn hypervolume_empty_front_is_zero() {
        assert_eq!(hypervolume(&[], &[1.0, 1.0]), 0.0);
        // a point on the reference boundary does not contribute
        assert_eq!(hypervolume(&[vec![1.0, 0.0]], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn hypervolume_duplicate_points_count_once() {
        let front = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        let hv = hypervolume(&front, &[3.0, 3.0]);
        assert!((hv - 4.0).abs() < 1e-12);
    }

    #[test]
    fn hypervolume_three_objectives() {
        // staircase front: exact union volume worked out by inclusion-exclusion
        let front = vec![
            vec![1.0, 2.0, 2.0],
            vec![2.0, 1.0, 2.0],
            vec![2.0, 2.0, 1.0],
        ];
        // each box 2*1*1 = 2... against ref (3,3,3): (3-1)(3-2)(3-2)=2 each;
        // pairwise overlaps 1, triple overlap 1 => 3*2 - 3*1 + 1 = 4
        let hv = hypervolume(&front, &[3.0, 3.0, 3.0]);
        assert!((hv - 4.0).abs() < 1e-12);
    }

    #[test]
    fn spacing_degenerate_and_even() {
        assert_eq!(spacing(&[]), 0.0);
        assert_eq!(spacing(&[vec![1.0, 2.0]]), 0.0);
        let even = vec![vec![0.0, 2.0], vec![1.0, 1.0], vec![2.0, 0.0]];
        assert!(spacing(&even).abs() < 1e-12);
    }

    #[test]
    fn spacing_positive_for_uneven_front() {
        let uneven = vec![vec![0.0, 3.0], vec![0.1, 2.9], vec![3.0, 0.0]];
        assert!(spacing(&uneven) > 0.0);
    }

    #[test]
    fn diversity_degenerate_cases() {
        assert_eq!(diversity(&[]), 0.0);
        assert_eq!(diversity(&[vec![5.0, 5.0]]), 0.0);
        let identical = vec![vec![2.0, 2.0], vec![2.0, 2.0]];
        assert!(diversity(&identical).abs() < 1e-12);
    }

    #[test]
    fn diversity_grows_with_spread() {
        let tight = vec![vec![0.0, 0.0], vec![0.1, 0.1]];
        let wide = vec![vec![0.0, 0.0], vec![5.0, 5.0]];
        assert!(diversity(&wide) > diversity(&tight));
    }

    #[test]
    fn igd_plus_zero_on_matching_front() {
        let front = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
        assert_eq!(igd_plus(&front, &front), 0.0);
        // a front dominating the reference also scores zero
        let better = vec![vec![0.5, 1.5], vec![1.5, 0.5]];
        assert_eq!(igd_plus(&better, &front), 0.0);
    }

    #[test]
    fn igd_plus_infinite_without_reference() {
        assert_eq!(igd_plus(&[vec![1.0, 1.0]], &[]), f64::INFINITY);
    }

    #[test]
    fn flat_hypervolume_stops_after_exact_window() {
        let mut t = tracker(20);
        let front = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
        for generation in 1..20 {
            assert_eq!(
                t.observe(generation, &front),
                Signal::Continue,
                "gen {generation} should continue"
            );
        }
        assert_eq!(t.observe(20, &front), Signal::Stop);
        assert_eq!(t.state(), TrackerState::Stopped);
        // stays stopped
        assert_eq!(t.observe(21, &front), Signal::Stop);
    }

    #[test]
    fn improvement_resets_the_window() {
        let mut t = tracker(3);
        let front_a = vec![vec![2.0, 2.0]]; // hv 64
        let front_b = vec![vec![1.0, 1.0]]; // hv 81
        assert_eq!(t.observe(1, &front_a), Signal::Continue);
        assert_eq!(t.observe(2, &front_a), Signal::Continue);
        // improvement at the brink restarts the count in full
        assert_eq!(t.observe(3, &front_b), Signal::Continue);
        assert_eq!(t.observe(4, &front_b), Signal::Continue);
        assert_eq!(t.observe(5, &front_b), Signal::Continue);
        assert_eq!(t.observe(6, &front_b), Signal::Stop);
    }

    #[test]
    fn sub_tolerance_improvement_counts_as_stagnant() {
        let mut cfg = TrackerConfig::new(vec![100.0, 100.0]);
        cfg.stagnation_generations = 2;
        cfg.stagnation_tolerance = 0.01;
        let mut t = ConvergenceTracker::new(cfg).unwrap();
        // hv 9801 then 9801.98... (+0.01%), below the 1% tolerance
        assert_eq!(t.observe(1, &[vec![1.0, 1.0]]), Signal::Continue);
        assert_eq!(t.observe(2, &[vec![0.999, 1.0]]), Signal::Stop);
    }

    #[test]
    fn samples_follow_logging_cadence() {
        let mut t = tracker(100);
        let front = vec![vec![1.0, 1.0]];
        for generation in 1..=12 {
            t.observe(generation, &front);
        }
        let recorded: Vec<u32> = t.samples().iter().map(|s| s.generation).collect();
        assert_eq!(recorded, vec![1, 5, 10]);
        assert_eq!(t.samples()[0].front_size, 1);
        assert!(t.samples()[0].igd_plus.is_none());
    }

    #[test]
    fn best_hypervolume_tracks_maximum() {
        let mut t = tracker(100);
        assert_eq!(t.best_hypervolume(), None);
        t.observe(1, &[vec![2.0, 2.0]]);
        assert_eq!(t.best_hypervolume(), Some(64.0));
        t.observe(2, &[vec![1.0, 1.0]]);
        assert_eq!(t.best_hypervolume(), Some(81.0));
        // regression never lowers the baseline
        t.observe(3, &[vec![5.0, 5.0]]);
        assert_eq!(t.best_hypervolume(), Some(81.0));
    }

    #[test]
    fn invalid_tracker_config_rejected() {
        assert!(ConvergenceTracker::new(TrackerConfig::new(vec![])).is_err());
        let mut cfg = TrackerConfig::new(vec![1.0]);
        cfg.stagnation_generations = 0;
        assert!(ConvergenceTracker::new(cfg).is_err());
    }
}
