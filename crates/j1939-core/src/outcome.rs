//! Step outcomes

use std::fmt;

use serde::Serialize;

/// Verdict severity attached to an [`Outcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Pass,
    Fail,
    Warn,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Pass => "PASS",
            Severity::Fail => "FAIL",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded verdict. Outcomes are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub part: u8,
    pub step: u8,
    pub severity: Severity,
    pub message: String,
}

impl Outcome {
    pub fn new(part: u8, step: u8, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            part,
            step,
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {} {}", self.part, self.step, self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let outcome = Outcome::new(12, 9, Severity::Warn, "6.12.9.4.b - Engine #1 (0) responded with a ACK");
        assert_eq!(
            outcome.to_string(),
            "12.9 WARN 6.12.9.4.b - Engine #1 (0) responded with a ACK"
        );
    }
}
