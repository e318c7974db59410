//! Error taxonomy for client operations.
//!
//! Every feature action returns `Result<_, ApiError>`. [`ValidationError`]s
//! are raised before any request is built, so a validation failure always
//! means nothing was sent.

use folio_core::{EmailError, OrderId, OrderStatus, ProductId};
use thiserror::Error;

/// Fallback message for application failures that carry no `msg`.
pub const GENERIC_FAILURE: &str = "Request failed";

/// Shown for transport failures, where the server never answered.
pub const NETWORK_FAILURE: &str = "Network error. Please check your connection and try again.";

/// Errors surfaced by client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// HTTP 401: the credential expired. The session has already been cleared.
    #[error("Unauthorized")]
    Unauthorized,

    /// The envelope carried a non-zero `code`.
    #[error("{message}")]
    Application {
        /// Envelope code (or HTTP status when the body had none).
        code: i64,
        /// Server-provided message.
        message: String,
    },

    /// The resource does not exist (HTTP 404 or envelope code 404).
    #[error("Not found: {message}")]
    NotFound {
        /// Server-provided message.
        message: String,
    },

    /// No response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be understood.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Client-side pre-check failed; no request was issued.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    /// Build an application error, falling back to [`GENERIC_FAILURE`].
    #[must_use]
    pub fn application(code: i64, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        Self::Application { code, message }
    }

    /// Text for the transient notification shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::Application { message, .. } | Self::NotFound { message } => message.clone(),
            Self::Network(_) => NETWORK_FAILURE.to_string(),
            Self::Decode(_) => "Unexpected response from server. Please try again.".to_string(),
            Self::Validation(err) => err.to_string(),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the failure happened before any request was sent.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Client-side pre-check failures.
///
/// These are necessary-but-not-sufficient checks; the backend re-validates
/// everything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No session is present.
    #[error("Please login first")]
    NotLoggedIn,

    /// Required form fields were left blank.
    #[error("Please fill in all required fields")]
    MissingFields,

    /// Login was attempted without an email or password.
    #[error("Please fill in all fields")]
    MissingCredentials,

    #[error("Please enter your email first")]
    EmailRequired,

    /// A verification code was sent too recently.
    #[error("Please wait {seconds}s before requesting another code")]
    ResendCooldown {
        /// Seconds until another code may be requested.
        seconds: u64,
    },

    #[error("Password must be at least {min} characters")]
    WeakPassword {
        /// Minimum length.
        min: usize,
    },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Please enter a valid email address")]
    InvalidEmail(#[source] EmailError),

    #[error("Product {0} is not in the catalog")]
    UnknownProduct(ProductId),

    #[error("Product {0} is out of stock")]
    OutOfStock(ProductId),

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// Checkout was attempted with nothing in the cart mirror.
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please fill in address and phone")]
    MissingShippingDetails,

    #[error("Checkout summary is not open")]
    CheckoutNotOpen,

    #[error("An order is already being submitted")]
    SubmissionInFlight,

    #[error("No order submission is in progress")]
    NotSubmitting,

    /// The control for this action is engaged by a request still in flight.
    #[error("Please wait for the current request to finish")]
    Busy,

    #[error("Order {0} is not in the order list")]
    UnknownOrder(OrderId),

    #[error("Order {order_id} cannot be cancelled while {status}")]
    NotCancellable {
        /// Order in question.
        order_id: OrderId,
        /// Its last known status.
        status: OrderStatus,
    },

    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Please enter a valid user ID")]
    InvalidRecipient,

    #[error("Cannot transfer to yourself")]
    SelfTransfer,

    #[error("Please enter a comment")]
    EmptyContent,

    #[error("Comment {0} is not in the current thread")]
    UnknownComment(folio_core::CommentId),

    /// The viewing user does not own the comment.
    #[error("You can only change your own comments")]
    NotOwner,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_error_falls_back_to_generic_message() {
        let err = ApiError::application(1, None);
        assert_eq!(err.user_message(), GENERIC_FAILURE);

        let err = ApiError::application(1, Some("  ".to_string()));
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_application_error_message_is_verbatim() {
        let err = ApiError::application(4001, Some("insufficient balance".to_string()));
        assert_eq!(err.to_string(), "insufficient balance");
        assert_eq!(err.user_message(), "insufficient balance");
    }

    #[test]
    fn test_network_error_shows_retry_prompt() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.user_message(), NETWORK_FAILURE);
    }

    #[test]
    fn test_validation_error_display() {
        let err = ApiError::from(ValidationError::SelfTransfer);
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "Cannot transfer to yourself");

        let err = ValidationError::NotCancellable {
            order_id: OrderId::new(9),
            status: OrderStatus::Shipped,
        };
        assert_eq!(err.to_string(), "Order 9 cannot be cancelled while shipped");
    }
}
