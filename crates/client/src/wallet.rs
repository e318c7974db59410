//! Wallet Controller: balance, transaction history, top-up, and transfers.
//!
//! Balances are never adjusted locally. Every successful mutation re-fetches
//! the balance and the history, so a concurrent incoming transfer shows up
//! too. A failed mutation leaves the displayed balance as it was.

use folio_core::{
    Amount, Direction, Money, OrderId, ProductId, TransactionId, TransactionKind, UserId,
    display_timestamp,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiCall, ApiClient, null_as_default};
use crate::endpoints;
use crate::error::{ApiError, ValidationError};
use crate::notice::Control;
use crate::refresh::{RefreshTarget, Refreshed};
use crate::transport::Transport;

pub const DEFAULT_TOP_UP_DESCRIPTION: &str = "Account recharge";
pub const DEFAULT_TRANSFER_DESCRIPTION: &str = "Transfer";
pub const TOP_UP_LABEL: &str = "Recharge";
pub const TRANSFER_LABEL: &str = "Transfer";
pub const PROCESSING_LABEL: &str = "Processing...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub balance: Money,
}

/// One history entry. Server-owned and append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<TransactionId>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: TransactionKind,
    /// As reported; may be unsigned with the sign implied by `kind`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: Money,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Transaction {
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.kind.direction()
    }

    /// The amount with its display sign: outgoing kinds are negative.
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        if self.direction() == Direction::Outgoing && !self.amount.is_negative() {
            -self.amount
        } else {
            self.amount
        }
    }

    #[must_use]
    pub fn occurred_on(&self) -> String {
        display_timestamp(self.created_at.as_deref())
    }
}

fn description_or(description: Option<&str>, fallback: &str) -> String {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Plan a top-up.
///
/// # Errors
///
/// Returns `ValidationError::InvalidAmount` unless `amount` is positive.
pub fn plan_add_balance(
    user: UserId,
    amount: Decimal,
    description: Option<&str>,
) -> Result<ApiCall, ValidationError> {
    let amount = Amount::new(amount).map_err(|_| ValidationError::InvalidAmount)?;
    Ok(endpoints::add_balance(
        user,
        amount,
        &description_or(description, DEFAULT_TOP_UP_DESCRIPTION),
    ))
}

/// Plan a transfer. Balance sufficiency and recipient existence are the
/// server's call.
///
/// # Errors
///
/// Checked in order: `InvalidRecipient` unless `to` is positive,
/// `SelfTransfer` if `to == from`, `InvalidAmount` unless `amount` is positive.
pub fn plan_transfer(
    from: UserId,
    to: UserId,
    amount: Decimal,
    description: Option<&str>,
) -> Result<ApiCall, ValidationError> {
    if !to.is_positive() {
        return Err(ValidationError::InvalidRecipient);
    }
    if to == from {
        return Err(ValidationError::SelfTransfer);
    }
    let amount = Amount::new(amount).map_err(|_| ValidationError::InvalidAmount)?;
    Ok(endpoints::transfer(
        from,
        to,
        amount,
        &description_or(description, DEFAULT_TRANSFER_DESCRIPTION),
    ))
}

/// Owns the balance and history mirrors for the logged-in user.
#[derive(Debug)]
pub struct WalletController<T> {
    api: ApiClient<T>,
    wallet: Option<Wallet>,
    transactions: Vec<Transaction>,
    top_up_button: Control,
    transfer_button: Control,
}

impl<T: Transport> WalletController<T> {
    #[must_use]
    pub fn new(api: ApiClient<T>) -> Self {
        Self {
            api,
            wallet: None,
            transactions: Vec::new(),
            top_up_button: Control::new(TOP_UP_LABEL),
            transfer_button: Control::new(TRANSFER_LABEL),
        }
    }

    #[must_use]
    pub const fn top_up_button(&self) -> &Control {
        &self.top_up_button
    }

    #[must_use]
    pub const fn transfer_button(&self) -> &Control {
        &self.transfer_button
    }

    #[must_use]
    pub const fn wallet(&self) -> Option<&Wallet> {
        self.wallet.as_ref()
    }

    #[must_use]
    pub fn balance(&self) -> Option<Money> {
        self.wallet.as_ref().map(|w| w.balance)
    }

    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Fetch the wallet, creating it once if the server has none.
    ///
    /// At most one create-then-refetch cycle runs per call; if the wallet
    /// is still missing after it, the load fails.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if it is anything but not-found, the create
    /// error if creation fails, or `ApiError::NotFound` if the wallet is
    /// still missing after creation.
    #[instrument(skip(self))]
    pub async fn ensure_wallet(&mut self) -> Result<&Wallet, ApiError> {
        let user = self.api.session().require_user().await?;

        let found = match self.api.fetch::<Wallet>(&endpoints::wallet(user.id)).await {
            Ok(found) => found,
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };

        let wallet = match found {
            Some(wallet) => wallet,
            None => {
                info!(user_id = %user.id, "no wallet, creating one");
                self.api
                    .execute(&endpoints::create_wallet(user.id))
                    .await
                    .inspect_err(|e| warn!(error = %e, "wallet creation failed"))?;

                self.api
                    .fetch::<Wallet>(&endpoints::wallet(user.id))
                    .await?
                    .ok_or_else(|| ApiError::NotFound {
                        message: "Wallet not found after creation".to_string(),
                    })?
            }
        };

        debug!(balance = %wallet.balance, "wallet loaded");
        Ok(self.wallet.insert(wallet))
    }

    /// Fetch the history, replacing the mirror.
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` from the request; the mirror is kept on failure.
    pub async fn load_transactions(&mut self) -> Result<&[Transaction], ApiError> {
        let user = self.api.session().require_user().await?;
        self.transactions = self
            .api
            .fetch_list(&endpoints::transactions(user.id))
            .await?;
        Ok(&self.transactions)
    }

    /// Re-fetch balance and history independently.
    pub async fn refresh(&mut self) -> Refreshed {
        let mut refreshed = Refreshed::new();
        let balance = self.ensure_wallet().await.map(|_| ());
        refreshed.record(RefreshTarget::Balance, balance);
        let history = self.load_transactions().await.map(|_| ());
        refreshed.record(RefreshTarget::Transactions, history);
        refreshed
    }

    /// Top up the balance.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidAmount` without a request for a
    /// non-positive amount, `ValidationError::Busy` while a top-up is in
    /// flight, otherwise the server's error.
    #[instrument(skip(self))]
    pub async fn add_balance(
        &mut self,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Refreshed, ApiError> {
        let _busy = self
            .top_up_button
            .try_engage(PROCESSING_LABEL)
            .ok_or(ValidationError::Busy)?;
        let user = self.api.session().require_user().await?;
        let call = plan_add_balance(user.id, amount, description)?;
        self.mutate(&call).await
    }

    /// Send money to another user.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` without a request if the pre-checks fail
    /// or a transfer is in flight, otherwise the server's error (e.g.
    /// insufficient balance).
    #[instrument(skip(self))]
    pub async fn transfer(
        &mut self,
        to: UserId,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Refreshed, ApiError> {
        let _busy = self
            .transfer_button
            .try_engage(PROCESSING_LABEL)
            .ok_or(ValidationError::Busy)?;
        let user = self.api.session().require_user().await?;
        let call = plan_transfer(user.id, to, amount, description)?;
        self.mutate(&call).await
    }

    async fn mutate(&mut self, call: &ApiCall) -> Result<Refreshed, ApiError> {
        self.api.execute(call).await?;
        Ok(self.refresh().await)
    }
}
