//! Finite-horizon jerk planner.

use nalgebra::{DMatrix, DVector, Matrix3, Vector2, Vector3};

use striders_core::geometry::polygon_edges;

use crate::error::QpError;
use crate::solver::solve_qp;
use crate::trajectory::CoMTrajectory;

/// Quantity a constraint applies to.
///
/// Every kind maps to an affine extractor over the decision variables (the
/// per-timestep jerks): the triple integrator gives position, velocity and
/// acceleration; ZMP and DCM are the LIPM combinations of those.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    Position,
    Velocity,
    Acceleration,
    Jerk,
    Zmp,
    Dcm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowBlock {
    X,
    Y,
    Mixed,
}

/// One scalar affine row `a . jerks + b` over the stacked `[jx, jy]`
/// decision vector.
#[derive(Clone, Debug)]
struct ConstraintRow {
    block: RowBlock,
    ax: DVector<f64>,
    ay: DVector<f64>,
    b: f64,
}

/// A constraint added to the planner. Equalities are `A x + b = 0`,
/// inequalities `A x + b >= 0`.
#[derive(Clone, Debug)]
pub struct JerkConstraint {
    rows: Vec<ConstraintRow>,
    inequality: bool,
    hard: bool,
    weight: f64,
}

impl JerkConstraint {
    /// Turn this constraint into a soft quadratic penalty with the given
    /// weight.
    pub fn soft(&mut self, weight: f64) -> &mut Self {
        self.hard = false;
        self.weight = weight;
        self
    }

    /// Enforce this constraint exactly (the default).
    pub fn hard(&mut self) -> &mut Self {
        self.hard = true;
        self
    }
}

/// Per-timestep affine propagation of the triple integrator.
#[derive(Clone, Debug)]
struct Propagation {
    /// `3 x N` map from the jerk vector of one axis to that axis' state.
    m: DMatrix<f64>,
    /// State offsets from the initial conditions, one per axis.
    c: [Vector3<f64>; 2],
}

/// Jerk-minimizing CoM planner over `timesteps` steps of width `dt`.
///
/// The decision variables are one jerk per axis and per timestep; constraint
/// timestep `k` refers to the state at the end of step `k`, i.e. at time
/// `(k + 1) * dt` from the start of the horizon. The objective is the jerk
/// norm (through a small regularization) plus any soft constraint
/// penalties.
pub struct JerkPlanner {
    timesteps: usize,
    dt: f64,
    omega: f64,
    initial_position: Vector2<f64>,
    initial_velocity: Vector2<f64>,
    initial_acceleration: Vector2<f64>,
    propagation: Vec<Propagation>,
    constraints: Vec<JerkConstraint>,
}

/// Strict-convexity regularization added to the Hessian diagonal.
const REGULARIZATION: f64 = 1e-8;

impl JerkPlanner {
    #[must_use]
    pub fn new(
        timesteps: usize,
        initial_position: Vector2<f64>,
        initial_velocity: Vector2<f64>,
        initial_acceleration: Vector2<f64>,
        dt: f64,
        omega: f64,
    ) -> Self {
        let a = Matrix3::new(
            1.0,
            dt,
            dt * dt / 2.0,
            0.0,
            1.0,
            dt,
            0.0,
            0.0,
            1.0,
        );
        let b = Vector3::new(dt * dt * dt / 6.0, dt * dt / 2.0, dt);

        let mut propagation = Vec::with_capacity(timesteps);
        // Column j of the timestep-k map is A^(k-j) B; columns are advanced
        // in place as the horizon is walked.
        let mut columns: Vec<Vector3<f64>> = Vec::with_capacity(timesteps);
        let mut c = [
            Vector3::new(
                initial_position.x,
                initial_velocity.x,
                initial_acceleration.x,
            ),
            Vector3::new(
                initial_position.y,
                initial_velocity.y,
                initial_acceleration.y,
            ),
        ];

        for _ in 0..timesteps {
            for column in &mut columns {
                *column = a * *column;
            }
            columns.push(b);
            c = [a * c[0], a * c[1]];

            let mut m = DMatrix::zeros(3, timesteps);
            for (j, column) in columns.iter().enumerate() {
                m.column_mut(j).copy_from(column);
            }
            propagation.push(Propagation { m, c });
        }

        Self {
            timesteps,
            dt,
            omega,
            initial_position,
            initial_velocity,
            initial_acceleration,
            propagation,
            constraints: Vec::new(),
        }
    }

    /// Number of timesteps in the horizon.
    #[must_use]
    pub const fn timesteps(&self) -> usize {
        self.timesteps
    }

    /// Affine expression of `kind` at timestep `k` for one axis: a row over
    /// that axis' jerks and one offset per axis.
    fn extract(&self, k: usize, kind: ConstraintKind) -> (DVector<f64>, f64, f64) {
        assert!(k < self.timesteps, "timestep {k} out of horizon");
        let propagation = &self.propagation[k];
        let omega2 = self.omega * self.omega;

        let row_of = |i: usize| propagation.m.row(i).transpose();
        let offset_of = |i: usize| (propagation.c[0][i], propagation.c[1][i]);

        match kind {
            ConstraintKind::Position => {
                let (cx, cy) = offset_of(0);
                (row_of(0), cx, cy)
            }
            ConstraintKind::Velocity => {
                let (cx, cy) = offset_of(1);
                (row_of(1), cx, cy)
            }
            ConstraintKind::Acceleration => {
                let (cx, cy) = offset_of(2);
                (row_of(2), cx, cy)
            }
            ConstraintKind::Jerk => {
                let mut row = DVector::zeros(self.timesteps);
                row[k] = 1.0;
                (row, 0.0, 0.0)
            }
            ConstraintKind::Zmp => {
                let row = row_of(0) - row_of(2) / omega2;
                let (px, py) = offset_of(0);
                let (ax, ay) = offset_of(2);
                (row, px - ax / omega2, py - ay / omega2)
            }
            ConstraintKind::Dcm => {
                let row = row_of(0) + row_of(1) / self.omega;
                let (px, py) = offset_of(0);
                let (vx, vy) = offset_of(1);
                (row, px + vx / self.omega, py + vy / self.omega)
            }
        }
    }

    /// Constrain `kind` at timestep `k` to equal `target` (one row per
    /// axis). The returned handle can soften the constraint.
    pub fn add_equality_constraint(
        &mut self,
        k: usize,
        target: Vector2<f64>,
        kind: ConstraintKind,
    ) -> &mut JerkConstraint {
        let (row, offset_x, offset_y) = self.extract(k, kind);
        let zeros = DVector::zeros(self.timesteps);

        self.constraints.push(JerkConstraint {
            rows: vec![
                ConstraintRow {
                    block: RowBlock::X,
                    ax: row.clone(),
                    ay: zeros.clone(),
                    b: offset_x - target.x,
                },
                ConstraintRow {
                    block: RowBlock::Y,
                    ax: zeros,
                    ay: row,
                    b: offset_y - target.y,
                },
            ],
            inequality: false,
            hard: true,
            weight: 1.0,
        });
        self.constraints.last_mut().expect("just pushed")
    }

    /// Constrain `kind` at timestep `k` to lie inside a clockwise convex
    /// `polygon`, shrunk inward by `margin`. One half-space inequality per
    /// polygon edge.
    pub fn add_polygon_constraint(
        &mut self,
        k: usize,
        polygon: &[Vector2<f64>],
        kind: ConstraintKind,
        margin: f64,
    ) {
        let (row, offset_x, offset_y) = self.extract(k, kind);

        let rows: Vec<ConstraintRow> = polygon_edges(polygon)
            .map(|(normal, offset)| ConstraintRow {
                block: RowBlock::Mixed,
                ax: &row * normal.x,
                ay: &row * normal.y,
                b: normal.x * offset_x + normal.y * offset_y + offset - margin,
            })
            .collect();

        self.constraints.push(JerkConstraint {
            rows,
            inequality: true,
            hard: true,
            weight: 1.0,
        });
    }

    /// Assemble and solve the QP, returning the planned trajectory anchored
    /// at `t_start = 0`.
    pub fn plan(&self) -> Result<CoMTrajectory, QpError> {
        let n = self.timesteps;
        let n_vars = 2 * n;
        if n == 0 {
            return Err(QpError::EmptyProblem);
        }

        let mut p = DMatrix::from_diagonal_element(n_vars, n_vars, REGULARIZATION);
        let mut q = DVector::zeros(n_vars);

        let mut n_eq = 0;
        let mut n_ineq = 0;
        for constraint in &self.constraints {
            if constraint.inequality {
                n_ineq += constraint.rows.len();
            } else if constraint.hard {
                n_eq += constraint.rows.len();
            }
        }

        let mut a_eq = DMatrix::zeros(n_eq, n_vars);
        let mut b_eq = DVector::zeros(n_eq);
        let mut a_ineq = DMatrix::zeros(n_ineq, n_vars);
        let mut b_ineq = DVector::zeros(n_ineq);

        let mut k_eq = 0;
        let mut k_ineq = 0;

        for constraint in &self.constraints {
            if constraint.inequality {
                for row in &constraint.rows {
                    a_ineq
                        .view_mut((k_ineq, 0), (1, n))
                        .copy_from(&row.ax.transpose());
                    a_ineq
                        .view_mut((k_ineq, n), (1, n))
                        .copy_from(&row.ay.transpose());
                    b_ineq[k_ineq] = row.b;
                    k_ineq += 1;
                }
            } else if constraint.hard {
                for row in &constraint.rows {
                    a_eq.view_mut((k_eq, 0), (1, n))
                        .copy_from(&row.ax.transpose());
                    a_eq.view_mut((k_eq, n), (1, n))
                        .copy_from(&row.ay.transpose());
                    b_eq[k_eq] = row.b;
                    k_eq += 1;
                }
            } else {
                // Soft equality: weighted quadratic penalty. The x/y blocks
                // of axis-pure rows keep the Hessian block sparse.
                for row in &constraint.rows {
                    match row.block {
                        RowBlock::X => {
                            p.view_mut((0, 0), (n, n))
                                .ger(constraint.weight, &row.ax, &row.ax, 1.0);
                            q.rows_mut(0, n)
                                .axpy(constraint.weight * row.b, &row.ax, 1.0);
                        }
                        RowBlock::Y => {
                            p.view_mut((n, n), (n, n))
                                .ger(constraint.weight, &row.ay, &row.ay, 1.0);
                            q.rows_mut(n, n)
                                .axpy(constraint.weight * row.b, &row.ay, 1.0);
                        }
                        RowBlock::Mixed => {
                            let mut a_full = DVector::zeros(n_vars);
                            a_full.rows_mut(0, n).copy_from(&row.ax);
                            a_full.rows_mut(n, n).copy_from(&row.ay);
                            p.ger(constraint.weight, &a_full, &a_full, 1.0);
                            q.axpy(constraint.weight * row.b, &a_full, 1.0);
                        }
                    }
                }
            }
        }

        assert_eq!(k_eq, n_eq, "Equality constraint count mismatch");
        assert_eq!(k_ineq, n_ineq, "Inequality constraint count mismatch");

        let x = solve_qp(&p, &q, &a_eq, &b_eq, &a_ineq, &b_ineq)?;

        let jerks: Vec<Vector2<f64>> = (0..n).map(|k| Vector2::new(x[k], x[n + k])).collect();

        Ok(CoMTrajectory::from_jerks(
            0.0,
            self.dt,
            self.omega,
            self.initial_position,
            self.initial_velocity,
            self.initial_acceleration,
            jerks,
        ))
    }
}
