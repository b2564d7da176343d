//! Sizing core for an Arctic islanded microgrid.
//!
//! Simulates one year of hourly dispatch for a candidate PV/wind/battery/
//! diesel sizing, scores it on cost, reliability, emissions, and household
//! equity, and reports the six siting and policy constraint violations. An
//! external many-objective search drives the [`problem::MicrogridProblem`]
//! batch interface; [`convergence::ConvergenceTracker`] watches its fronts
//! and signals when to stop.

pub mod config;
pub mod constraints;
pub mod convergence;
pub mod decision;
pub mod error;
pub mod objectives;
pub mod problem;
pub mod profile;
pub mod sim;

pub use config::SystemConfig;
pub use decision::DecisionVector;
pub use error::{ConfigError, EvalError};
pub use problem::{BatchEvaluation, MicrogridProblem};
pub use profile::HourlyProfile;
