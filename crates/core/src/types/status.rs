//! Status enums for server-owned records.
//!
//! The backend may grow new values at any time, so every enum here keeps an
//! `Other` catch-all instead of failing to deserialize.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
    #[serde(other)]
    Other,
}

impl OrderStatus {
    /// Whether the order may still be cancelled by its owner.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of money movement for a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Money into the wallet.
    Incoming,
    /// Money out of the wallet.
    Outgoing,
    /// Unknown type; the sign of the amount is taken as reported.
    Neutral,
}

/// Wallet transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Purchase,
    Refund,
    TransferIn,
    TransferOut,
    #[default]
    #[serde(other)]
    Other,
}

impl TransactionKind {
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Income | Self::Refund | Self::TransferIn => Direction::Incoming,
            Self::Expense | Self::Purchase | Self::TransferOut => Direction::Outgoing,
            Self::Other => Direction::Neutral,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
            Self::Purchase => "Purchase",
            Self::Refund => "Refund",
            Self::TransferIn => "Transfer In",
            Self::TransferOut => "Transfer Out",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity of a transient user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    #[default]
    Info,
    Success,
    Error,
}
