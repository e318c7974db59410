//! Wallet commands.

use folio_client::wallet::WalletController;
use folio_core::UserId;
use rust_decimal::Decimal;
use tracing::info;

use super::{CliError, Context, report_refresh};

fn controller(ctx: &Context) -> WalletController<folio_client::HttpTransport> {
    WalletController::new(ctx.api.clone())
}

pub async fn show(ctx: &Context) -> Result<(), CliError> {
    let mut wallet = controller(ctx);
    let balance = wallet.ensure_wallet().await?.balance;
    info!("Balance {balance}");
    Ok(())
}

pub async fn add(
    ctx: &Context,
    amount: Decimal,
    description: Option<&str>,
) -> Result<(), CliError> {
    let mut wallet = controller(ctx);
    let added = wallet.add_balance(amount, description).await;
    let refreshed = ctx.settle(added, "Balance added successfully")?;
    if let Some(balance) = wallet.balance() {
        info!("Balance {balance}");
    }
    report_refresh(&refreshed);
    Ok(())
}

pub async fn transfer(
    ctx: &Context,
    to: UserId,
    amount: Decimal,
    description: Option<&str>,
) -> Result<(), CliError> {
    let mut wallet = controller(ctx);
    let sent = wallet.transfer(to, amount, description).await;
    let refreshed = ctx.settle(sent, "Transfer completed successfully")?;
    if let Some(balance) = wallet.balance() {
        info!("Balance {balance}");
    }
    report_refresh(&refreshed);
    Ok(())
}

pub async fn history(ctx: &Context) -> Result<(), CliError> {
    let mut wallet = controller(ctx);
    let transactions = wallet.load_transactions().await?;
    if transactions.is_empty() {
        info!("No transactions yet");
    }
    for tx in transactions {
        info!(
            "{} {} {} {}",
            tx.occurred_on(),
            tx.kind,
            tx.signed_amount().signed_display(),
            tx.description.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}
