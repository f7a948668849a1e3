use thiserror::Error;

/// Errors raised by the QP layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QpError {
    #[error("Infeasible QP (check the hard inequality constraints)")]
    Infeasible,

    #[error("QP solver did not converge: {0}")]
    NotConverged(String),

    #[error("NaN in the QP solution")]
    NanSolution,

    #[error("Equality constraints were not enforced (residual {residual:.2e} > 1e-6)")]
    ResidualTooLarge { residual: f64 },

    #[error("QP has no decision variables")]
    EmptyProblem,
}
