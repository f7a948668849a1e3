use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {value} (must be > 0)")]
    NonPositive { field: &'static str, value: f64 },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ConfigError::NonPositive {
                field: "pendulum_height",
                value: 0.0
            }
            .to_string(),
            "Invalid value for pendulum_height: 0 (must be > 0)"
        );
        assert_eq!(
            ConfigError::InvalidValue {
                field: "double_support_ratio",
                message: "must be >= 0".into()
            }
            .to_string(),
            "Invalid value for double_support_ratio: must be >= 0"
        );
    }
}
