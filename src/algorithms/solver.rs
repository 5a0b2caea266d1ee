//! Bounded Levenberg-Marquardt solver for range-based 2-D positioning

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::availability::EligibleAnchor;
use crate::core::{
    Point2, PositionEstimate, UnavailableReason, BOUNDS_MARGIN_FT, DEPLOYMENT_SIDE_FT, MIN_ANCHORS_2D,
};

/// Smallest diagonal used for Marquardt scaling
const DIAG_FLOOR: f64 = 1e-9;
/// Damping above which the normal equations are considered unsolvable
const LAMBDA_MAX: f64 = 1e16;
/// Gain ratio required to accept a step
const ACCEPT_RATIO: f64 = 1e-4;
/// RMS residual (feet) above which a second start from the linearized fix is tried
const RESEED_RMS_FT: f64 = 1.0;

/// Axis-aligned box the estimate is confined to (feet)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: -BOUNDS_MARGIN_FT,
            max_x: DEPLOYMENT_SIDE_FT + BOUNDS_MARGIN_FT,
            min_y: -BOUNDS_MARGIN_FT,
            max_y: DEPLOYMENT_SIDE_FT + BOUNDS_MARGIN_FT,
        }
    }
}

impl Bounds {
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.max_x, self.min_y, self.max_y].iter().all(|v| v.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }

    pub fn contains(&self, p: &Point2) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }

    fn clamp(&self, v: Vector2<f64>) -> Vector2<f64> {
        Vector2::new(v.x.clamp(self.min_x, self.max_x), v.y.clamp(self.min_y, self.max_y))
    }

    /// Coordinates pinned at a bound with the descent direction pointing outward
    fn active(&self, x: &Vector2<f64>, g: &Vector2<f64>) -> [bool; 2] {
        [
            (x.x <= self.min_x && g.x > 0.0) || (x.x >= self.max_x && g.x < 0.0),
            (x.y <= self.min_y && g.y > 0.0) || (x.y >= self.max_y && g.y < 0.0),
        ]
    }
}

/// Where the iteration starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum InitialGuess {
    /// Mean of the eligible anchor positions
    #[default]
    Centroid,
    /// Map origin
    Origin,
    /// Caller-supplied point
    Fixed { x: f64, y: f64 },
}

/// Solver tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub bounds: Bounds,
    pub initial_guess: InitialGuess,
    /// Iteration cap; hitting it without convergence is a failure
    pub max_iterations: usize,
    /// Relative cost reduction tolerance
    pub ftol: f64,
    /// Relative step size tolerance
    pub xtol: f64,
    /// Projected gradient tolerance
    pub gtol: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            initial_guess: InitialGuess::Centroid,
            max_iterations: 200,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
        }
    }
}

/// Nonlinear least-squares position solver
///
/// Minimizes `sum_i (|p - a_i| - d_i)^2` inside [`Bounds`]. Deterministic for a
/// given input and seed.
#[derive(Debug, Clone, Default)]
pub struct PositionSolver {
    settings: SolverSettings,
}

/// Solution, residuals there, and iterations used
type Fit = (Vector2<f64>, Linearization, usize);

struct Linearization {
    residuals: Vec<f64>,
    rows: Vec<Vector2<f64>>,
}

impl Linearization {
    fn cost(&self) -> f64 {
        0.5 * self.residuals.iter().map(|r| r * r).sum::<f64>()
    }

    fn rms(&self) -> f64 {
        (2.0 * self.cost() / self.residuals.len() as f64).sqrt()
    }

    fn normal_equations(&self) -> (Matrix2<f64>, Vector2<f64>) {
        let mut jt_j = Matrix2::zeros();
        let mut gradient = Vector2::zeros();
        for (row, r) in self.rows.iter().zip(&self.residuals) {
            jt_j += row * row.transpose();
            gradient += row * *r;
        }
        (jt_j, gradient)
    }
}

impl PositionSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Estimate the position from eligible anchors and their averaged distances
    pub fn solve(&self, anchors: &[EligibleAnchor]) -> PositionEstimate {
        if anchors.len() < MIN_ANCHORS_2D {
            return PositionEstimate::unavailable(UnavailableReason::InsufficientAnchors {
                eligible: anchors.len(),
                required: MIN_ANCHORS_2D,
            });
        }

        let positions: Vec<Vector2<f64>> = anchors.iter().map(|a| a.position.to_vector()).collect();
        let ranges: Vec<f64> = anchors.iter().map(|a| a.distance_ft).collect();
        if positions.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) || ranges.iter().any(|r| !r.is_finite()) {
            return failed("non-finite anchor position or distance");
        }

        let mut outcome = self.iterate(&positions, &ranges, self.initial_guess(&positions));

        // A poor fit may be the mirror minimum; retry from the closed-form fix
        let better = match &outcome {
            Ok((_, lin, _)) if lin.rms() > RESEED_RMS_FT => self.refit(&positions, &ranges, lin.cost()),
            _ => None,
        };
        if let Some(fit) = better {
            debug!(x = fit.0.x, y = fit.0.y, "linearized seed found a better fit");
            outcome = Ok(fit);
        }

        match outcome {
            Ok((x, lin, iterations)) => {
                let rms_residual = lin.rms();
                debug!(x = x.x, y = x.y, iterations, rms_residual, "solver converged");
                PositionEstimate::Point {
                    x: x.x,
                    y: x.y,
                    anchors_used: anchors.iter().map(|a| a.id).collect(),
                    rms_residual,
                    iterations,
                }
            }
            Err(message) => {
                debug!(%message, "solver failed");
                failed(message)
            }
        }
    }

    fn initial_guess(&self, positions: &[Vector2<f64>]) -> Vector2<f64> {
        let seed = match self.settings.initial_guess {
            InitialGuess::Centroid => {
                positions.iter().fold(Vector2::zeros(), |acc, p| acc + p) / positions.len() as f64
            }
            InitialGuess::Origin => Vector2::zeros(),
            InitialGuess::Fixed { x, y } => Vector2::new(x, y),
        };
        self.settings.bounds.clamp(seed)
    }

    /// Second run seeded from [`linear_fix`], kept only if it lowers the cost
    fn refit(&self, positions: &[Vector2<f64>], ranges: &[f64], cost: f64) -> Option<Fit> {
        let seed = self.settings.bounds.clamp(linear_fix(positions, ranges)?);
        self.iterate(positions, ranges, seed).ok().filter(|fit| fit.1.cost() < cost)
    }

    fn iterate(&self, positions: &[Vector2<f64>], ranges: &[f64], seed: Vector2<f64>) -> Result<Fit, String> {
        let s = &self.settings;
        let mut x = seed;
        let mut lin = linearize(positions, ranges, &x);
        let mut cost = lin.cost();
        if !cost.is_finite() {
            return Err("non-finite residuals at initial guess".to_string());
        }

        let mut lambda = 1e-3;
        let mut nu = 2.0;

        for iteration in 1..=s.max_iterations {
            let (jt_j, gradient) = lin.normal_equations();

            let active = s.bounds.active(&x, &gradient);
            let mut projected = gradient;
            let mut damped = jt_j;
            for i in 0..2 {
                damped[(i, i)] += lambda * jt_j[(i, i)].max(DIAG_FLOOR);
            }
            // Pinned coordinates drop out; the free one takes its own damped step
            for i in (0..2).filter(|&i| active[i]) {
                projected[i] = 0.0;
                damped[(i, 1 - i)] = 0.0;
                damped[(1 - i, i)] = 0.0;
                damped[(i, i)] = 1.0;
            }

            if projected.amax() <= s.gtol {
                return Ok((x, lin, iteration));
            }

            let step = match damped.cholesky() {
                Some(chol) => chol.solve(&-projected),
                None => {
                    lambda *= nu;
                    nu *= 2.0;
                    if lambda > LAMBDA_MAX {
                        return Err("damped normal equations are singular".to_string());
                    }
                    continue;
                }
            };

            let candidate = s.bounds.clamp(x + step);
            let taken = candidate - x;
            if taken.norm() <= s.xtol * (s.xtol + x.norm()) {
                return Ok((x, lin, iteration));
            }

            let candidate_lin = linearize(positions, ranges, &candidate);
            let candidate_cost = candidate_lin.cost();
            if !candidate_cost.is_finite() {
                return Err(format!("non-finite residuals at iteration {}", iteration));
            }

            // Predicted reduction of the local quadratic model along the taken step
            let predicted = -(gradient.dot(&taken) + 0.5 * taken.dot(&(jt_j * taken)));
            let actual = cost - candidate_cost;
            let gain_ratio = if predicted > 0.0 { actual / predicted } else { 0.0 };

            if gain_ratio > ACCEPT_RATIO {
                let previous_cost = cost;
                x = candidate;
                lin = candidate_lin;
                cost = candidate_cost;

                lambda *= (1.0f64 / 3.0).max(1.0 - (2.0 * gain_ratio - 1.0).powi(3));
                nu = 2.0;

                if actual <= s.ftol * previous_cost {
                    return Ok((x, lin, iteration));
                }
            } else {
                lambda *= nu;
                nu *= 2.0;
                if lambda > LAMBDA_MAX {
                    return Err("damping diverged without reducing cost".to_string());
                }
            }
        }

        Err(format!("no convergence after {} iterations", s.max_iterations))
    }
}

/// Least-squares solution of the range equations differenced against the first anchor
///
/// `None` when the anchors are (nearly) collinear.
fn linear_fix(positions: &[Vector2<f64>], ranges: &[f64]) -> Option<Vector2<f64>> {
    let (first, first_range) = (positions[0], ranges[0]);
    let mut normal = Matrix2::zeros();
    let mut rhs = Vector2::zeros();
    for (anchor, range) in positions.iter().zip(ranges).skip(1) {
        let row = 2.0 * (anchor - first);
        let b = anchor.norm_squared() - first.norm_squared() - range * range + first_range * first_range;
        normal += row * row.transpose();
        rhs += row * b;
    }
    if normal.determinant().abs() <= 1e-9 * normal.trace().powi(2) {
        return None;
    }
    normal.try_inverse().map(|inverse| inverse * rhs)
}

fn failed(message: impl Into<String>) -> PositionEstimate {
    PositionEstimate::unavailable(UnavailableReason::OptimizationFailed(message.into()))
}

/// Residuals `|p - a_i| - d_i` and their gradients with respect to `p`
fn linearize(positions: &[Vector2<f64>], ranges: &[f64], estimate: &Vector2<f64>) -> Linearization {
    let mut residuals = Vec::with_capacity(positions.len());
    let mut rows = Vec::with_capacity(positions.len());

    for (anchor, range) in positions.iter().zip(ranges) {
        let diff = estimate - anchor;
        let predicted = diff.norm();
        residuals.push(predicted - range);
        // Gradient of the norm is undefined on the anchor itself
        rows.push(if predicted > 1e-10 { diff / predicted } else { Vector2::zeros() });
    }

    Linearization { residuals, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AnchorId;

    const SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (300.0, 0.0), (300.0, 300.0), (0.0, 300.0)];

    fn exact_anchors(corners: &[(f64, f64)], truth: Point2) -> Vec<EligibleAnchor> {
        corners
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let position = Point2::new(x, y);
                EligibleAnchor {
                    id: AnchorId(i),
                    position,
                    distance_ft: position.distance_to(&truth),
                }
            })
            .collect()
    }

    fn assert_near(estimate: &PositionEstimate, truth: Point2, tolerance: f64) {
        let point = estimate.point().unwrap_or_else(|| panic!("expected a fix, got {}", estimate));
        assert!(
            point.distance_to(&truth) < tolerance,
            "estimate {} too far from {}",
            point,
            truth
        );
    }

    #[test]
    fn test_recovers_exact_points() {
        let solver = PositionSolver::default();
        for &(x, y) in &[(150.0, 150.0), (75.0, 225.0), (10.0, 20.0), (260.0, 40.0), (299.0, 299.0), (120.0, 5.0)] {
            let truth = Point2::new(x, y);
            let estimate = solver.solve(&exact_anchors(&SQUARE, truth));
            assert_near(&estimate, truth, 0.5);
        }
    }

    #[test]
    fn test_three_anchors_suffice() {
        let solver = PositionSolver::default();
        let truth = Point2::new(75.0, 225.0);
        let estimate = solver.solve(&exact_anchors(&SQUARE[..3], truth));
        assert_near(&estimate, truth, 0.5);
        assert_eq!(estimate.anchors_used(), &[AnchorId(0), AnchorId(1), AnchorId(2)]);
    }

    #[test]
    fn test_origin_seed() {
        let solver = PositionSolver::new(SolverSettings {
            initial_guess: InitialGuess::Origin,
            ..SolverSettings::default()
        });
        let truth = Point2::new(100.0, 100.0);
        assert_near(&solver.solve(&exact_anchors(&SQUARE, truth)), truth, 0.5);
    }

    #[test]
    fn test_fewer_than_three_anchors() {
        let solver = PositionSolver::default();
        let estimate = solver.solve(&exact_anchors(&SQUARE[..2], Point2::new(50.0, 50.0)));
        assert_eq!(
            estimate,
            PositionEstimate::Unavailable {
                reason: UnavailableReason::InsufficientAnchors { eligible: 2, required: 3 }
            }
        );
    }

    #[test]
    fn test_equal_distances_terminate_bounded() {
        let solver = PositionSolver::default();
        for &d in &[0.0, 50.0, 100.0, 212.0, 400.0, 900.0] {
            let anchors: Vec<EligibleAnchor> = SQUARE
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| EligibleAnchor { id: AnchorId(i), position: Point2::new(x, y), distance_ft: d })
                .collect();
            let estimate = solver.solve(&anchors);
            let point = estimate.point().expect("equal distances still yield a point");
            assert!(Bounds::default().contains(&point));
        }
    }

    #[test]
    fn test_inconsistent_distances_stay_in_bounds() {
        let solver = PositionSolver::default();
        // Ranges of a point far east of the deployment
        let estimate = solver.solve(&exact_anchors(&SQUARE, Point2::new(700.0, 150.0)));
        let point = estimate.point().expect("bounded solve should still converge");
        assert!(Bounds::default().contains(&point));
        assert!((point.x - 350.0).abs() < 1e-6);
    }

    #[test]
    fn test_pinned_coordinate_slides_to_corner() {
        let solver = PositionSolver::default();
        let bias = [120.0, 90.0, 150.0, 110.0];
        for &((tx, ty), corner) in &[((10.0, 80.0), (-50.0, -50.0)), ((290.0, 250.0), (350.0, 350.0))] {
            let mut anchors = exact_anchors(&SQUARE, Point2::new(tx, ty));
            for (anchor, b) in anchors.iter_mut().zip(bias) {
                anchor.distance_ft += b;
            }
            match solver.solve(&anchors) {
                PositionEstimate::Point { x, y, iterations, .. } => {
                    assert!((x - corner.0).abs() < 1e-6 && (y - corner.1).abs() < 1e-6, "({}, {})", x, y);
                    assert!(iterations < 50);
                }
                other => panic!("expected a bounded fix, got {}", other),
            }
        }
    }

    #[test]
    fn test_biased_ranges_in_margin_always_bounded() {
        let solver = PositionSolver::default();
        for i in 0..39 {
            for j in 0..39 {
                let truth = Point2::new(-40.0 + 10.0 * i as f64, -40.0 + 10.0 * j as f64);
                let mut anchors = exact_anchors(&SQUARE[..3], truth);
                for (anchor, b) in anchors.iter_mut().zip([25.0, -30.0, 40.0]) {
                    anchor.distance_ft += b;
                }
                let estimate = solver.solve(&anchors);
                let point = estimate.point().unwrap_or_else(|| panic!("{} at {}", estimate, truth));
                assert!(Bounds::default().contains(&point));
            }
        }
    }

    #[test]
    fn test_margin_truth_escapes_mirror_minimum() {
        let solver = PositionSolver::default();
        for &(x, y) in &[(10.0, -30.0), (330.0, 290.0), (-40.0, 340.0)] {
            let truth = Point2::new(x, y);
            assert_near(&solver.solve(&exact_anchors(&SQUARE[..3], truth)), truth, 0.5);
        }
    }

    #[test]
    fn test_linear_fix() {
        let positions: Vec<Vector2<f64>> = SQUARE.iter().map(|&(x, y)| Vector2::new(x, y)).collect();
        let truth = Vector2::new(42.0, 260.0);
        let ranges: Vec<f64> = positions.iter().map(|p| (p - truth).norm()).collect();
        let fix = linear_fix(&positions, &ranges).unwrap();
        assert!((fix - truth).norm() < 1e-6);

        let line = [Vector2::new(0.0, 0.0), Vector2::new(150.0, 0.0), Vector2::new(300.0, 0.0)];
        assert!(linear_fix(&line, &[10.0, 20.0, 30.0]).is_none());
    }

    #[test]
    fn test_collinear_anchors_are_deterministic() {
        let solver = PositionSolver::default();
        let line = [(0.0, 0.0), (150.0, 0.0), (300.0, 0.0)];
        let anchors = exact_anchors(&line, Point2::new(150.0, 100.0));
        let first = solver.solve(&anchors);
        let second = solver.solve(&anchors);
        assert_eq!(first, second);
        if let Some(point) = first.point() {
            assert!(Bounds::default().contains(&point));
        }
    }

    #[test]
    fn test_noisy_distances() {
        let solver = PositionSolver::default();
        let truth = Point2::new(180.0, 90.0);
        let mut anchors = exact_anchors(&SQUARE, truth);
        for (anchor, noise) in anchors.iter_mut().zip([3.0, -2.5, 1.5, -3.0]) {
            anchor.distance_ft += noise;
        }
        let estimate = solver.solve(&anchors);
        assert_near(&estimate, truth, 10.0);
        if let PositionEstimate::Point { rms_residual, .. } = estimate {
            assert!(rms_residual > 0.0 && rms_residual < 5.0);
        }
    }

    #[test]
    fn test_non_finite_input_fails_cleanly() {
        let solver = PositionSolver::default();
        let mut anchors = exact_anchors(&SQUARE, Point2::new(100.0, 100.0));
        anchors[2].distance_ft = f64::NAN;
        assert!(matches!(
            solver.solve(&anchors),
            PositionEstimate::Unavailable { reason: UnavailableReason::OptimizationFailed(_) }
        ));
    }

    #[test]
    fn test_iteration_cap_reports_failure() {
        let solver = PositionSolver::new(SolverSettings {
            max_iterations: 1,
            initial_guess: InitialGuess::Origin,
            ..SolverSettings::default()
        });
        let estimate = solver.solve(&exact_anchors(&SQUARE, Point2::new(220.0, 180.0)));
        assert!(matches!(
            estimate,
            PositionEstimate::Unavailable { reason: UnavailableReason::OptimizationFailed(_) }
        ));
    }
}
