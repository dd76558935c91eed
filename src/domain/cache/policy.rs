//! What to do when the external store fails

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

use crate::domain::DomainError;

/// Store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Read,
    Write,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Policy applied to store errors during a read-through lookup
///
/// With `LogAndContinue` a failed read counts as a miss and a failed write is
/// dropped, so an unreachable store only costs database round-trips.
/// `Propagate` surfaces the store error to the caller instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DegradePolicy {
    #[default]
    LogAndContinue,
    Propagate,
}

impl DegradePolicy {
    /// Applies the policy to a store error for `key`
    ///
    /// Returns `Ok(())` when the lookup should carry on without the store.
    pub fn handle(
        &self,
        operation: StoreOperation,
        key: &str,
        error: DomainError,
    ) -> Result<(), DomainError> {
        match self {
            Self::LogAndContinue => {
                warn!(
                    key = %key,
                    operation = %operation,
                    error = %error,
                    "Cache store unavailable, bypassing"
                );
                Ok(())
            }
            Self::Propagate => Err(error),
        }
    }
}

impl FromStr for DegradePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log_and_continue" | "degrade" => Ok(Self::LogAndContinue),
            "propagate" | "fail" => Ok(Self::Propagate),
            _ => Err(DomainError::configuration(format!(
                "Unknown degrade policy: {}. Valid policies: log_and_continue, propagate",
                s
            ))),
        }
    }
}

impl TryFrom<String> for DegradePolicy {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
