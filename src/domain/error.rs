//! Domain error types.

/// Top-level error type for biastrader.
#[derive(Debug, thiserror::Error)]
pub enum BiasTraderError {
    #[error("grid search produced no result (empty price series or empty grid)")]
    NoResult,

    #[error("grid search cancelled")]
    Cancelled,

    #[error("price series dates must be strictly increasing (violated at index {index})")]
    UnsortedSeries { index: usize },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error("invalid price data for {symbol} at line {line}: {reason}")]
    PriceParse {
        symbol: String,
        line: u64,
        reason: String,
    },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<&BiasTraderError> for std::process::ExitCode {
    fn from(err: &BiasTraderError) -> Self {
        let code: u8 = match err {
            BiasTraderError::Io(_) | BiasTraderError::Csv(_) => 1,
            BiasTraderError::ConfigParse { .. }
            | BiasTraderError::ConfigMissing { .. }
            | BiasTraderError::ConfigInvalid { .. } => 2,
            BiasTraderError::Storage { .. } => 3,
            BiasTraderError::NoData { .. }
            | BiasTraderError::PriceParse { .. }
            | BiasTraderError::UnsortedSeries { .. } => 5,
            BiasTraderError::NoResult => 6,
            BiasTraderError::Cancelled => 130,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = BiasTraderError::PriceParse {
            symbol: "NVDA".into(),
            line: 7,
            reason: "bad close".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid price data for NVDA at line 7: bad close"
        );

        let err = BiasTraderError::ConfigInvalid {
            section: "grid".into(),
            key: "position_scales".into(),
            reason: "not a number".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [grid] position_scales: not a number"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BiasTraderError = io.into();
        assert!(matches!(err, BiasTraderError::Io(_)));
    }

    #[test]
    fn exit_codes_group_by_category() {
        use std::process::ExitCode;
        let code = |err: &BiasTraderError| format!("{:?}", ExitCode::from(err));
        let missing = BiasTraderError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        };
        assert_eq!(code(&missing), format!("{:?}", ExitCode::from(2)));
        assert_eq!(
            code(&BiasTraderError::NoResult),
            format!("{:?}", ExitCode::from(6))
        );
        assert_eq!(
            code(&BiasTraderError::NoData { symbol: "X".into() }),
            format!("{:?}", ExitCode::from(5))
        );
    }
}
