//! Errors raised while parsing or evaluating a rule condition.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConditionError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("unexpected end of condition, expected {0}")]
    UnexpectedEnd(String),

    #[error("expected {expected}, found '{found}'")]
    UnexpectedToken { expected: String, found: String },

    #[error("unknown identifier '{0}' — conditions may only reference event_type, severity, source, tags, data.<path>, windows[<name>].count(), or metrics[<name>]")]
    UnknownIdentifier(String),

    #[error("'{0}' is not a window accessor — expected windows['<name>'].count()")]
    MalformedWindowAccessor(String),

    #[error("'{0}' is not a metric accessor — expected metrics['<name>']")]
    MalformedMetricAccessor(String),

    #[error("trailing input after a complete expression: '{0}'")]
    TrailingInput(String),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("unknown window '{0}' referenced at evaluation time")]
    UnknownWindow(String),

    #[error("unknown metric '{0}' referenced at evaluation time")]
    UnknownMetric(String),
}

pub type ConditionResult<T> = Result<T, ConditionError>;
