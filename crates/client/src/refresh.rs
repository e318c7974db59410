//! Reporting for the re-fetches that follow a successful mutation.
//!
//! A mutation that succeeded stays successful even if a follow-up refresh
//! fails. Each refresh runs regardless of the others; failures are collected
//! here so the caller can mention them.

use tracing::warn;

use crate::error::ApiError;

/// A mirror that is re-fetched after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshTarget {
    Cart,
    Orders,
    Balance,
    Transactions,
    Comments,
    Messages,
}

impl RefreshTarget {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Orders => "orders",
            Self::Balance => "balance",
            Self::Transactions => "transactions",
            Self::Comments => "comments",
            Self::Messages => "messages",
        }
    }
}

impl std::fmt::Display for RefreshTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub target: RefreshTarget,
    pub error: ApiError,
}

/// Outcome of the refreshes after a successful mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct Refreshed {
    failures: Vec<RefreshFailure>,
}

impl Refreshed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note the result of one refresh.
    pub fn record<T>(&mut self, target: RefreshTarget, result: Result<T, ApiError>) {
        if let Err(error) = result {
            warn!(%target, error = %error, "refresh after mutation failed");
            self.failures.push(RefreshFailure { target, error });
        }
    }

    /// Builder form of [`Self::record`].
    pub fn with<T>(mut self, target: RefreshTarget, result: Result<T, ApiError>) -> Self {
        self.record(target, result);
        self
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn failures(&self) -> &[RefreshFailure] {
        &self.failures
    }

    #[must_use]
    pub fn failed(&self, target: RefreshTarget) -> bool {
        self.failures.iter().any(|f| f.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_only_failures() {
        let refreshed = Refreshed::new()
            .with(RefreshTarget::Cart, Ok::<_, ApiError>(()))
            .with::<()>(
                RefreshTarget::Orders,
                Err(ApiError::Network("timeout".to_string())),
            );

        assert!(!refreshed.is_clean());
        assert!(refreshed.failed(RefreshTarget::Orders));
        assert!(!refreshed.failed(RefreshTarget::Cart));
        assert_eq!(refreshed.failures().len(), 1);
    }
}
