//! The user's order list and order cancellation.

use folio_core::{Money, OrderId, OrderStatus, display_timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::api::{ApiCall, ApiClient, null_as_default};
use crate::endpoints;
use crate::error::{ApiError, ValidationError};
use crate::refresh::{RefreshTarget, Refreshed};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: u32,
    /// Line total as computed by the server.
    #[serde(default, alias = "line_total", deserialize_with = "null_as_default")]
    pub total_price: Money,
}

/// An order as the server reports it. Totals here are authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// A missing status is shown as pending.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_amount: Money,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Order {
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        self.status.is_cancellable()
    }

    #[must_use]
    pub fn placed_on(&self) -> String {
        display_timestamp(self.created_at.as_deref())
    }
}

/// Plan the cancellation of `order_id` against the last known order list.
///
/// # Errors
///
/// Returns `ValidationError::UnknownOrder` if the order is not listed, or
/// `ValidationError::NotCancellable` unless it is pending or paid.
pub fn plan_cancel(orders: &[Order], order_id: OrderId) -> Result<ApiCall, ValidationError> {
    let order = orders
        .iter()
        .find(|o| o.id == order_id)
        .ok_or(ValidationError::UnknownOrder(order_id))?;

    if !order.can_cancel() {
        return Err(ValidationError::NotCancellable {
            order_id,
            status: order.status,
        });
    }

    Ok(endpoints::cancel_order(order_id))
}

/// The current user's orders.
#[derive(Debug)]
pub struct OrderBook<T> {
    api: ApiClient<T>,
    orders: Vec<Order>,
}

impl<T: Transport> OrderBook<T> {
    #[must_use]
    pub const fn new(api: ApiClient<T>) -> Self {
        Self {
            api,
            orders: Vec::new(),
        }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn find(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Fetch the order list, replacing the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` from the request; the snapshot is kept on failure.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<&[Order], ApiError> {
        let user = self.api.session().require_user().await?;
        self.orders = self.api.fetch_list(&endpoints::user_orders(user.id)).await?;
        debug!(count = self.orders.len(), "orders loaded");
        Ok(&self.orders)
    }

    /// Cancel a pending or paid order, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` without a request if the order is unknown
    /// or not cancellable, otherwise the server's error verbatim.
    #[instrument(skip(self))]
    pub async fn cancel(&mut self, order_id: OrderId) -> Result<Refreshed, ApiError> {
        let call = plan_cancel(&self.orders, order_id)?;
        self.api.execute(&call).await?;

        let reloaded = self.load().await.map(|_| ());
        Ok(Refreshed::new().with(RefreshTarget::Orders, reloaded))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::api::Method;
    use crate::session::{Session, SessionStore, SessionUser};
    use crate::transport::scripted::ScriptedTransport;
    use folio_core::UserId;

    async fn book() -> (OrderBook<ScriptedTransport>, ScriptedTransport) {
        let transport = ScriptedTransport::new();
        let session = SessionStore::in_memory();
        session
            .login(Session::new("T", SessionUser::new(UserId::new(7), "a")))
            .await;
        let api = ApiClient::new(transport.clone(), "http://h/api/v1", session);
        (OrderBook::new(api), transport)
    }

    #[test]
    fn test_order_defaults() {
        let order: Order = serde_json::from_value(json!({
            "id": 12,
            "status": null,
            "items": [{ "product_name": "Mug", "quantity": 2, "line_total": "25.00" }],
            "total_amount": 25,
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items[0].total_price, Money::new(Decimal::new(25, 0)));
        assert_eq!(order.placed_on(), "Unknown date");
    }

    #[test]
    fn test_plan_cancel_checks_status() {
        let order = |id: i64, status| Order {
            id: OrderId::new(id),
            status,
            items: Vec::new(),
            total_amount: Money::ZERO,
            created_at: None,
        };
        let orders = vec![
            order(1, OrderStatus::Pending),
            order(2, OrderStatus::Paid),
            order(3, OrderStatus::Shipped),
            order(4, OrderStatus::Cancelled),
        ];

        assert!(plan_cancel(&orders, OrderId::new(1)).is_ok());
        assert_eq!(
            plan_cancel(&orders, OrderId::new(2)).unwrap().endpoint,
            "/orders/2/cancel"
        );
        assert!(matches!(
            plan_cancel(&orders, OrderId::new(3)),
            Err(ValidationError::NotCancellable { .. })
        ));
        assert!(plan_cancel(&orders, OrderId::new(4)).is_err());
        assert_eq!(
            plan_cancel(&orders, OrderId::new(5)).unwrap_err(),
            ValidationError::UnknownOrder(OrderId::new(5))
        );
    }

    #[tokio::test]
    async fn test_cancel_puts_then_reloads() {
        let (mut book, transport) = book().await;
        transport
            .respond_ok(
                Method::Get,
                "/users/7/orders",
                json!([{ "id": 12, "status": "pending", "total_amount": 10 }]),
            )
            .respond_ok(Method::Put, "/orders/12/cancel", json!(null))
            .respond_ok(
                Method::Get,
                "/users/7/orders",
                json!([{ "id": 12, "status": "cancelled", "total_amount": 10 }]),
            );

        book.load().await.unwrap();
        let refreshed = book.cancel(OrderId::new(12)).await.unwrap();
        assert!(refreshed.is_clean());
        assert_eq!(
            book.find(OrderId::new(12)).unwrap().status,
            OrderStatus::Cancelled
        );

        // Now cancelled: rejected locally.
        let before = transport.request_count();
        assert!(book.cancel(OrderId::new(12)).await.unwrap_err().is_validation());
        assert_eq!(transport.request_count(), before);
    }

    #[tokio::test]
    async fn test_server_refusal_is_surfaced() {
        let (mut book, transport) = book().await;
        transport
            .respond_ok(
                Method::Get,
                "/users/7/orders",
                json!([{ "id": 12, "status": "paid", "total_amount": 10 }]),
            )
            .respond_error(
                Method::Put,
                "/orders/12/cancel",
                1,
                "order already cancelled",
            );

        book.load().await.unwrap();
        let err = book.cancel(OrderId::new(12)).await.unwrap_err();
        assert_eq!(err.user_message(), "order already cancelled");
    }
}
