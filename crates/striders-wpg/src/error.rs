use thiserror::Error;

use striders_lipm::QpError;

/// Errors raised by the walk pattern generator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalkError {
    #[error("Trying to plan with no supports")]
    EmptySupports,

    #[error("Can't plan a swing starting with a single support without a previous trajectory")]
    SwingWithoutHistory,

    #[error("A single support must be followed by a support carrying the flying side")]
    DanglingSingleSupport,

    #[error("Supports can't be replanned at t = {0} (check can_replan_supports first)")]
    UnreplannableSupports(f64),

    #[error("CoM planning failed: {0}")]
    Qp(#[from] QpError),
}
