use std::fmt;

/// Host-level machine fault.
///
/// These are *not* language-level abrupt completions: a `throw` produced by
/// evaluated code travels through [`crate::interpreter::Completion`] as data.
/// An `EngineError` aborts evaluation and surfaces to the driver as a typed
/// `Err`, never as a wrong language value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// A specification clause this machine does not implement yet
    /// (generator/async suspension and similar).
    Unsupported { feature: &'static str },
    /// The driver's step budget ran out mid-evaluation.
    BudgetExceeded,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Unsupported { feature } => {
                write!(f, "unsupported feature: {feature}")
            }
            EngineError::BudgetExceeded => write!(f, "evaluation budget exceeded"),
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        let e = EngineError::Unsupported { feature: "generator suspension" };
        assert_eq!(e.to_string(), "unsupported feature: generator suspension");
        assert_eq!(
            EngineError::BudgetExceeded.to_string(),
            "evaluation budget exceeded"
        );
    }
}
