//! Builders for every primary-API call the client makes.
//!
//! Paths are relative to the API base URL. Bodies are built here and nowhere
//! else, so the wire shape of each call lives in one place.

use folio_core::{Amount, CommentId, OrderId, ProductId, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::api::{ApiCall, Method};

// =============================================================================
// Users
// =============================================================================

#[must_use]
pub fn login(email: &str, password: &SecretString) -> ApiCall {
    ApiCall::post(
        "/users/login",
        json!({ "email": email, "password": password.expose_secret() }),
    )
}

#[must_use]
pub fn register(username: &str, email: &str, password: &SecretString) -> ApiCall {
    ApiCall::post(
        "/users/register",
        json!({
            "username": username,
            "email": email,
            "password": password.expose_secret(),
        }),
    )
}

#[must_use]
pub fn send_verification_code(email: &str) -> ApiCall {
    ApiCall::post("/users/send-verification-code", json!({ "email": email }))
}

#[must_use]
pub fn verify_email(email: &str, code: &str) -> ApiCall {
    ApiCall::post("/users/verify-email", json!({ "email": email, "code": code }))
}

// =============================================================================
// Comments
// =============================================================================

#[must_use]
pub fn comments(page: u32, page_size: u32) -> ApiCall {
    ApiCall::get(format!("/comments?page={page}&page_size={page_size}"))
}

/// A top-level comment when `parent` is `None`, otherwise a reply.
#[must_use]
pub fn post_comment(user: UserId, content: &str, parent: Option<CommentId>) -> ApiCall {
    let body = match parent {
        Some(parent_id) => json!({ "user_id": user, "content": content, "parent_id": parent_id }),
        None => json!({ "user_id": user, "content": content }),
    };
    ApiCall::post("/comments", body)
}

#[must_use]
pub fn update_comment(id: CommentId, content: &str) -> ApiCall {
    ApiCall::put(format!("/comments/{id}"), json!({ "content": content }))
}

#[must_use]
pub fn delete_comment(id: CommentId) -> ApiCall {
    ApiCall::delete(format!("/comments/{id}"))
}

// =============================================================================
// Catalog and cart
// =============================================================================

#[must_use]
pub fn products(page: u32, page_size: u32) -> ApiCall {
    ApiCall::get(format!("/products?page={page}&page_size={page_size}"))
}

#[must_use]
pub fn cart(user: UserId) -> ApiCall {
    ApiCall::get(format!("/users/{user}/cart"))
}

#[must_use]
pub fn add_to_cart(user: UserId, product: ProductId, quantity: u32) -> ApiCall {
    ApiCall::post(
        format!("/users/{user}/cart"),
        json!({ "product_id": product, "quantity": quantity }),
    )
}

#[must_use]
pub fn update_cart_item(user: UserId, product: ProductId, quantity: u32) -> ApiCall {
    ApiCall::put(
        format!("/users/{user}/cart/{product}"),
        json!({ "quantity": quantity }),
    )
}

#[must_use]
pub fn remove_cart_item(user: UserId, product: ProductId) -> ApiCall {
    ApiCall::delete(format!("/users/{user}/cart/{product}"))
}

// =============================================================================
// Orders
// =============================================================================

/// Order from the server-side cart; line items are never re-sent.
#[must_use]
pub fn create_order(user: UserId, address: &str, phone: &str, remark: &str) -> ApiCall {
    ApiCall::post(
        "/orders",
        json!({
            "user_id": user,
            "address": address,
            "phone": phone,
            "remark": remark,
            "use_cart": true,
        }),
    )
}

#[must_use]
pub fn user_orders(user: UserId) -> ApiCall {
    ApiCall::get(format!("/users/{user}/orders"))
}

#[must_use]
pub fn cancel_order(order: OrderId) -> ApiCall {
    ApiCall::new(Method::Put, format!("/orders/{order}/cancel"))
}

// =============================================================================
// Wallet
// =============================================================================

#[must_use]
pub fn wallet(user: UserId) -> ApiCall {
    ApiCall::get(format!("/wallets/{user}"))
}

#[must_use]
pub fn create_wallet(user: UserId) -> ApiCall {
    ApiCall::new(Method::Post, format!("/wallets/{user}"))
}

#[must_use]
pub fn transactions(user: UserId) -> ApiCall {
    ApiCall::get(format!("/wallets/{user}/transactions"))
}

#[must_use]
pub fn add_balance(user: UserId, amount: Amount, description: &str) -> ApiCall {
    ApiCall::post(
        format!("/wallets/{user}/add"),
        json!({ "amount": amount, "description": description }),
    )
}

#[must_use]
pub fn transfer(from: UserId, to: UserId, amount: Amount, description: &str) -> ApiCall {
    ApiCall::post(
        "/wallets/transfer",
        json!({
            "from_user_id": from,
            "to_user_id": to,
            "amount": amount,
            "description": description,
        }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_paths() {
        let user = UserId::new(7);
        let product = ProductId::new(3);

        assert_eq!(cart(user).endpoint, "/users/7/cart");
        assert_eq!(
            add_to_cart(user, product, 1).body,
            Some(json!({ "product_id": 3, "quantity": 1 }))
        );
        let update = update_cart_item(user, product, 4);
        assert_eq!(update.method, Method::Put);
        assert_eq!(update.endpoint, "/users/7/cart/3");
        assert_eq!(remove_cart_item(user, product).method, Method::Delete);
    }

    #[test]
    fn test_create_order_uses_server_cart() {
        let call = create_order(UserId::new(7), "1 Main St", "555", "");
        assert_eq!(
            call.body,
            Some(json!({
                "user_id": 7,
                "address": "1 Main St",
                "phone": "555",
                "remark": "",
                "use_cart": true,
            }))
        );
    }

    #[test]
    fn test_reply_carries_parent_id() {
        let top = post_comment(UserId::new(1), "hi", None);
        assert!(top.body.unwrap().get("parent_id").is_none());

        let reply = post_comment(UserId::new(1), "hi", Some(CommentId::new(9)));
        assert_eq!(reply.body.unwrap()["parent_id"], json!(9));
    }

    #[test]
    fn test_bodyless_calls() {
        assert!(cancel_order(OrderId::new(2)).body.is_none());
        assert_eq!(cancel_order(OrderId::new(2)).endpoint, "/orders/2/cancel");
        let create = create_wallet(UserId::new(7));
        assert_eq!(create.method, Method::Post);
        assert!(create.body.is_none());
    }

    #[test]
    fn test_transfer_body() {
        let amount = Amount::parse("5").unwrap();
        let call = transfer(UserId::new(7), UserId::new(8), amount, "Transfer");
        let body = call.body.unwrap();
        assert_eq!(body["from_user_id"], json!(7));
        assert_eq!(body["to_user_id"], json!(8));
        assert_eq!(body["amount"], json!(5.0));
    }

    #[test]
    fn test_login_debug_hides_password() {
        let call = login("a@b.com", &SecretString::from("secret1".to_string()));
        assert!(!format!("{call:?}").contains("secret1"));
    }
}
