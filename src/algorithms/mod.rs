//! Core positioning algorithms

pub mod availability;
pub mod solver;

pub use availability::{AnchorSet, AnchorStatus, AvailabilityPolicy, EligibleAnchor};
pub use solver::{Bounds, InitialGuess, PositionSolver, SolverSettings};
