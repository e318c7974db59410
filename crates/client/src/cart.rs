//! Cart Controller: server-side cart mutations plus an in-memory mirror.
//!
//! The mirror is only ever replaced wholesale by a re-fetch. Mutations are
//! planned by the pure [`plan`] function, which also performs the local
//! pre-checks, so a rejected command never reaches the transport.

use folio_core::{Money, ProductId, UserId, round2};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::api::{ApiCall, ApiClient, null_as_default};
use crate::catalog::ProductSnapshot;
use crate::endpoints;
use crate::error::{ApiError, ValidationError};
use crate::refresh::{RefreshTarget, Refreshed};
use crate::transport::Transport;

/// One cart line with the product name and unit price denormalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    /// Unit price snapshot.
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Money,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// Derived totals; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// `round2(Σ price × quantity)`.
    pub subtotal: Money,
    pub item_count: u32,
}

/// The client's copy of the server cart.
///
/// At most one line per product and no zero-quantity lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartMirror {
    lines: Vec<CartLine>,
}

impl CartMirror {
    /// Build a mirror from a server response.
    ///
    /// Lines repeating a product are merged into the first one; zero-quantity
    /// lines are dropped.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
        for line in lines.into_iter().filter(|l| l.quantity > 0) {
            match merged.iter_mut().find(|m| m.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => merged.push(line),
            }
        }
        Self { lines: merged }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn line(&self, product: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product)
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |acc: u32, l| acc.saturating_add(l.quantity))
    }

    /// Same two-decimal rounding the server applies to order totals.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let raw: Money = self.lines.iter().map(CartLine::line_total).sum();
        CartTotals {
            subtotal: Money::new(round2(raw.amount())),
            item_count: self.item_count(),
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// A requested cart change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartCommand {
    Add { product: ProductId, quantity: u32 },
    /// Quantities below 1 mean removal.
    SetQuantity { product: ProductId, quantity: i64 },
    Remove { product: ProductId },
}

/// The mutation to send, then the re-fetch that replaces the mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct CartPlan {
    pub mutation: ApiCall,
    pub refetch: ApiCall,
}

impl CartPlan {
    #[must_use]
    pub fn calls(&self) -> [&ApiCall; 2] {
        [&self.mutation, &self.refetch]
    }
}

/// Plan `command` for `user`, checking stock against `catalog`.
///
/// # Errors
///
/// Returns a `ValidationError` for an unknown or out-of-stock product or a
/// zero quantity on add.
pub fn plan(
    user: UserId,
    command: CartCommand,
    catalog: &ProductSnapshot,
) -> Result<CartPlan, ValidationError> {
    let mutation = match command {
        CartCommand::Add { product, quantity } => {
            if quantity == 0 {
                return Err(ValidationError::InvalidQuantity);
            }
            let listed = catalog
                .find(product)
                .ok_or(ValidationError::UnknownProduct(product))?;
            if !listed.in_stock() {
                return Err(ValidationError::OutOfStock(product));
            }
            endpoints::add_to_cart(user, product, quantity)
        }
        CartCommand::SetQuantity { product, quantity } if quantity < 1 => {
            endpoints::remove_cart_item(user, product)
        }
        CartCommand::SetQuantity { product, quantity } => {
            let quantity = u32::try_from(quantity).map_err(|_| ValidationError::InvalidQuantity)?;
            endpoints::update_cart_item(user, product, quantity)
        }
        CartCommand::Remove { product } => endpoints::remove_cart_item(user, product),
    };

    Ok(CartPlan {
        mutation,
        refetch: endpoints::cart(user),
    })
}

/// Runs cart commands and owns the mirror.
#[derive(Debug)]
pub struct CartController<T> {
    api: ApiClient<T>,
    mirror: CartMirror,
}

impl<T: Transport> CartController<T> {
    #[must_use]
    pub fn new(api: ApiClient<T>) -> Self {
        Self {
            api,
            mirror: CartMirror::default(),
        }
    }

    #[must_use]
    pub const fn mirror(&self) -> &CartMirror {
        &self.mirror
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.mirror.totals()
    }

    /// Drop the local mirror without touching the server.
    pub fn clear_mirror(&mut self) {
        self.mirror.clear();
    }

    /// Re-fetch the whole cart, replacing the mirror.
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` from the request; the mirror is kept on failure.
    pub async fn refresh(&mut self) -> Result<&CartMirror, ApiError> {
        let user = self.api.session().require_user().await?;
        self.load(&endpoints::cart(user.id)).await
    }

    async fn load(&mut self, call: &ApiCall) -> Result<&CartMirror, ApiError> {
        let lines: Vec<CartLine> = self.api.fetch_list(call).await?;
        self.mirror = CartMirror::from_lines(lines);
        debug!(lines = self.mirror.lines().len(), "cart mirror replaced");
        Ok(&self.mirror)
    }

    /// Add `quantity` of `product`, rejecting out-of-stock products locally.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` without a request if the pre-checks
    /// fail, or the server's error if the mutation fails. The mirror is
    /// untouched on error.
    #[instrument(skip(self, catalog))]
    pub async fn add_item(
        &mut self,
        catalog: &ProductSnapshot,
        product: ProductId,
        quantity: u32,
    ) -> Result<Refreshed, ApiError> {
        self.run(CartCommand::Add { product, quantity }, catalog).await
    }

    /// Set the quantity of a line; below 1 removes it.
    ///
    /// # Errors
    ///
    /// Returns the server's error if the mutation fails.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &mut self,
        product: ProductId,
        quantity: i64,
    ) -> Result<Refreshed, ApiError> {
        self.run(
            CartCommand::SetQuantity { product, quantity },
            &ProductSnapshot::default(),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns the server's error if the mutation fails, including removing a
    /// line that is already gone.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, product: ProductId) -> Result<Refreshed, ApiError> {
        self.run(CartCommand::Remove { product }, &ProductSnapshot::default())
            .await
    }

    async fn run(
        &mut self,
        command: CartCommand,
        catalog: &ProductSnapshot,
    ) -> Result<Refreshed, ApiError> {
        let user = self.api.session().require_user().await?;
        let plan = plan(user.id, command, catalog)?;

        self.api.execute(&plan.mutation).await?;

        let refreshed = self.load(&plan.refetch).await.map(|_| ());
        Ok(Refreshed::new().with(RefreshTarget::Cart, refreshed))
    }
}
