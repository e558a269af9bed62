use thiserror::Error;

/// Failure kinds of the computation kernel. All of these are fatal for the
/// call that raised them; the engine never leaves partial state behind.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown {kind} index {index}")]
    InvalidSymbol { kind: &'static str, index: i64 },

    #[error("declared day-master {declared} differs from day-pillar stem {actual}")]
    InvalidDayMaster { declared: String, actual: String },

    #[error("non-finite arithmetic in {context}: {value}")]
    NonFiniteArithmetic { context: &'static str, value: f64 },

    #[error("static table missing or malformed: {0}")]
    MissingTable(String),

    #[error("config value {field} = {value} outside documented range {range}")]
    ConfigOutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
