//! Clarabel bridge for the jerk QP.
//!
//! Problems arrive in the planner's convention (`A_eq x + b_eq = 0`,
//! `A_ineq x + b_ineq >= 0`) and are mapped onto Clarabel's `A x + s = b`,
//! `s in K` form: equalities load `(A_eq, -b_eq)` into the zero cone,
//! inequalities load `(-A_ineq, b_ineq)` into the nonnegative cone.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus,
    SupportedConeT::{NonnegativeConeT, ZeroConeT},
};
use nalgebra::{DMatrix, DVector};

use crate::error::QpError;

/// Residual above which enforced equalities are reported as a failure.
pub const EQUALITY_RESIDUAL_TOLERANCE: f64 = 1e-6;

/// Solve `min 1/2 x'Px + q'x` subject to `A_eq x + b_eq = 0` and
/// `A_ineq x + b_ineq >= 0`.
pub fn solve_qp(
    p: &DMatrix<f64>,
    q: &DVector<f64>,
    a_eq: &DMatrix<f64>,
    b_eq: &DVector<f64>,
    a_ineq: &DMatrix<f64>,
    b_ineq: &DVector<f64>,
) -> Result<DVector<f64>, QpError> {
    let n = p.ncols();
    if n == 0 {
        return Err(QpError::EmptyProblem);
    }

    let n_eq = a_eq.nrows();
    let n_ineq = a_ineq.nrows();

    log::debug!("solving QP: {n} variables, {n_eq} equalities, {n_ineq} inequalities");

    let mut a_all = DMatrix::zeros(n_eq + n_ineq, n);
    let mut b_all = DVector::zeros(n_eq + n_ineq);
    a_all.view_mut((0, 0), (n_eq, n)).copy_from(a_eq);
    b_all.rows_mut(0, n_eq).copy_from(&(-b_eq));
    a_all.view_mut((n_eq, 0), (n_ineq, n)).copy_from(&(-a_ineq));
    b_all.rows_mut(n_eq, n_ineq).copy_from(b_ineq);

    let p_csc = dmatrix_to_csc_upper_tri(p);
    let a_csc = dmatrix_to_csc(&a_all);

    let cones = vec![ZeroConeT(n_eq), NonnegativeConeT(n_ineq)];

    let settings = DefaultSettingsBuilder::default()
        .max_iter(200)
        .verbose(false)
        .tol_gap_abs(1e-9)
        .tol_gap_rel(1e-9)
        .tol_feas(1e-9)
        .build()
        .expect("valid solver settings");

    let q_slice: Vec<f64> = q.iter().copied().collect();
    let b_slice: Vec<f64> = b_all.iter().copied().collect();

    let mut solver = DefaultSolver::new(&p_csc, &q_slice, &a_csc, &b_slice, &cones, settings);
    solver.solve();

    let solution = &solver.solution;
    match solution.status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => {}
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            return Err(QpError::Infeasible);
        }
        status => return Err(QpError::NotConverged(format!("{status:?}"))),
    }

    let x = DVector::from_iterator(n, solution.x.iter().copied());

    if x.iter().any(|value| value.is_nan()) {
        return Err(QpError::NanSolution);
    }

    // The interior point result is checked against the equality constraints,
    // which are not covered by the status alone.
    if n_eq > 0 {
        let residual = (a_eq * &x + b_eq).amax();
        if residual > EQUALITY_RESIDUAL_TOLERANCE {
            return Err(QpError::ResidualTooLarge { residual });
        }
    }

    Ok(x)
}

/// Convert a nalgebra `DMatrix<f64>` to a Clarabel `CscMatrix<f64>`.
fn dmatrix_to_csc(m: &DMatrix<f64>) -> CscMatrix<f64> {
    let (nrows, ncols) = m.shape();
    let mut colptr = vec![0usize; ncols + 1];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    for j in 0..ncols {
        for i in 0..nrows {
            let v = m[(i, j)];
            if v.abs() > 1e-15 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr[j + 1] = rowval.len();
    }

    CscMatrix::new(nrows, ncols, colptr, rowval, nzval)
}

/// Convert a symmetric nalgebra `DMatrix<f64>` to an upper-triangular
/// `CscMatrix<f64>`.
fn dmatrix_to_csc_upper_tri(m: &DMatrix<f64>) -> CscMatrix<f64> {
    let (nrows, ncols) = m.shape();
    let mut colptr = vec![0usize; ncols + 1];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    for j in 0..ncols {
        for i in 0..=j.min(nrows - 1) {
            let v = m[(i, j)];
            if v.abs() > 1e-15 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr[j + 1] = rowval.len();
    }

    CscMatrix::new(nrows, ncols, colptr, rowval, nzval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unconstrained_minimum() {
        // min (x0 - 1)^2 + (x1 + 2)^2
        let p = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 2.0]));
        let q = DVector::from_vec(vec![-2.0, 4.0]);
        let a_eq = DMatrix::zeros(0, 2);
        let b_eq = DVector::zeros(0);
        let a_ineq = DMatrix::zeros(0, 2);
        let b_ineq = DVector::zeros(0);

        let x = solve_qp(&p, &q, &a_eq, &b_eq, &a_ineq, &b_ineq).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(x[1], -2.0, epsilon = 1e-6);
    }

    #[test]
    fn equality_constrained() {
        // min x0^2 + x1^2 subject to x0 + x1 - 1 = 0
        let p = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 2.0]));
        let q = DVector::zeros(2);
        let a_eq = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let b_eq = DVector::from_vec(vec![-1.0]);
        let a_ineq = DMatrix::zeros(0, 2);
        let b_ineq = DVector::zeros(0);

        let x = solve_qp(&p, &q, &a_eq, &b_eq, &a_ineq, &b_ineq).unwrap();
        assert_relative_eq!(x[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(x[1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn active_inequality() {
        // min (x - 2)^2 subject to x - 1 <= 0, written as -(x - 1) >= 0.
        let p = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0]));
        let q = DVector::from_vec(vec![-4.0]);
        let a_eq = DMatrix::zeros(0, 1);
        let b_eq = DVector::zeros(0);
        let a_ineq = DMatrix::from_row_slice(1, 1, &[-1.0]);
        let b_ineq = DVector::from_vec(vec![1.0]);

        let x = solve_qp(&p, &q, &a_eq, &b_eq, &a_ineq, &b_ineq).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn infeasible_problem() {
        // x >= 1 and -x >= 0 cannot both hold.
        let p = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0]));
        let q = DVector::zeros(1);
        let a_eq = DMatrix::zeros(0, 1);
        let b_eq = DVector::zeros(0);
        let a_ineq = DMatrix::from_row_slice(2, 1, &[1.0, -1.0]);
        let b_ineq = DVector::from_vec(vec![-1.0, 0.0]);

        let result = solve_qp(&p, &q, &a_eq, &b_eq, &a_ineq, &b_ineq);
        assert!(matches!(result, Err(QpError::Infeasible)));
    }

    #[test]
    fn empty_problem() {
        let p = DMatrix::zeros(0, 0);
        let q = DVector::zeros(0);
        let a = DMatrix::zeros(0, 0);
        let b = DVector::zeros(0);
        assert!(matches!(
            solve_qp(&p, &q, &a, &b, &a, &b),
            Err(QpError::EmptyProblem)
        ));
    }
}
