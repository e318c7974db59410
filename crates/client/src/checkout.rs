//! Checkout Flow: turning the server-side cart into an order.
//!
//! ```text
//! Idle ──Open──▶ SummaryOpen ──Submit──▶ Submitting ──Completed──▶ Idle
//!                     ▲                      │
//!                     └──────Rejected────────┘
//! ```
//!
//! [`transition`] is pure: it maps a state and an event to the next state
//! plus the effects to perform. [`CheckoutFlow`] interprets those effects.
//! The summary total is an estimate from the cart mirror; the order itself is
//! built by the server from its own cart (`use_cart: true`). Submitting
//! rebuilds the summary from the mirror as it is at that moment, so a cart
//! emptied after opening is refused before anything is sent.

use folio_core::{Money, OrderId, UserId};
use tracing::{info, instrument, warn};

use crate::api::{ApiCall, ApiClient};
use crate::cart::{CartController, CartMirror, CartTotals};
use crate::endpoints;
use crate::error::{ApiError, ValidationError};
use crate::notice::{Control, Notice, NoticeBoard};
use crate::orders::OrderBook;
use crate::refresh::{RefreshTarget, Refreshed};
use crate::transport::Transport;

pub const ORDER_CREATED: &str = "Order created successfully!";
pub const ORDER_CANCELLED: &str = "Order cancelled successfully!";
pub const PLACE_ORDER_LABEL: &str = "Place Order";
pub const PLACING_ORDER_LABEL: &str = "Placing...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub product_name: String,
    pub quantity: u32,
    pub line_total: Money,
}

/// The pre-submit view of the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub lines: Vec<SummaryLine>,
    /// Estimate only; the server's order total is authoritative.
    pub totals: CartTotals,
}

impl OrderSummary {
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyCart` if the mirror has no lines.
    pub fn from_mirror(cart: &CartMirror) -> Result<Self, ValidationError> {
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        let lines = cart
            .lines()
            .iter()
            .map(|line| SummaryLine {
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                line_total: line.line_total(),
            })
            .collect();
        Ok(Self {
            lines,
            totals: cart.totals(),
        })
    }

    #[must_use]
    pub const fn estimated_total(&self) -> Money {
        self.totals.subtotal
    }
}

/// Delivery form input. Fields are trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShippingDetails {
    pub address: String,
    pub phone: String,
    pub remark: String,
}

impl ShippingDetails {
    #[must_use]
    pub fn new(address: &str, phone: &str, remark: Option<&str>) -> Self {
        Self {
            address: address.trim().to_string(),
            phone: phone.trim().to_string(),
            remark: remark.map(str::trim).unwrap_or_default().to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError::MissingShippingDetails` if address or phone
    /// is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.address.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(ValidationError::MissingShippingDetails);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    SummaryOpen(OrderSummary),
    Submitting(OrderSummary),
}

impl CheckoutState {
    #[must_use]
    pub const fn summary(&self) -> Option<&OrderSummary> {
        match self {
            Self::Idle => None,
            Self::SummaryOpen(summary) | Self::Submitting(summary) => Some(summary),
        }
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting(_))
    }
}

#[derive(Debug, Clone)]
pub enum CheckoutEvent {
    /// Show the summary for the current mirror.
    Open { cart: CartMirror },
    Close,
    /// Place the order for the mirror as it is now.
    Submit {
        user_id: UserId,
        details: ShippingDetails,
        cart: CartMirror,
    },
    /// The order request succeeded.
    Completed,
    /// The order request failed.
    Rejected(ApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutEffect {
    Call(ApiCall),
    ClearCartMirror,
    RefreshCart,
    RefreshOrders,
    Notify(Notice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: CheckoutState,
    pub effects: Vec<CheckoutEffect>,
}

impl Transition {
    const fn quiet(state: CheckoutState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Compute the next state and its effects.
///
/// # Errors
///
/// Returns a `ValidationError` when the event is not allowed in `state`; the
/// caller keeps the current state and performs nothing.
pub fn transition(
    state: &CheckoutState,
    event: CheckoutEvent,
) -> Result<Transition, ValidationError> {
    use CheckoutState::{Idle, SummaryOpen, Submitting};

    match (state, event) {
        (
            Submitting(_),
            CheckoutEvent::Open { .. } | CheckoutEvent::Close | CheckoutEvent::Submit { .. },
        ) => Err(ValidationError::SubmissionInFlight),

        (Idle | SummaryOpen(_), CheckoutEvent::Open { cart }) => {
            let summary = OrderSummary::from_mirror(&cart)?;
            Ok(Transition::quiet(SummaryOpen(summary)))
        }

        (Idle | SummaryOpen(_), CheckoutEvent::Close) => Ok(Transition::quiet(Idle)),

        (Idle, CheckoutEvent::Submit { .. }) => Err(ValidationError::CheckoutNotOpen),

        (
            SummaryOpen(_),
            CheckoutEvent::Submit {
                user_id,
                details,
                cart,
            },
        ) => {
            let summary = OrderSummary::from_mirror(&cart)?;
            details.validate()?;
            let call = endpoints::create_order(
                user_id,
                &details.address,
                &details.phone,
                &details.remark,
            );
            Ok(Transition {
                state: Submitting(summary),
                effects: vec![CheckoutEffect::Call(call)],
            })
        }

        (Submitting(_), CheckoutEvent::Completed) => Ok(Transition {
            state: Idle,
            effects: vec![
                CheckoutEffect::ClearCartMirror,
                CheckoutEffect::RefreshCart,
                CheckoutEffect::RefreshOrders,
                CheckoutEffect::Notify(Notice::success(ORDER_CREATED)),
            ],
        }),

        (Submitting(summary), CheckoutEvent::Rejected(err)) => Ok(Transition {
            state: SummaryOpen(summary.clone()),
            effects: vec![CheckoutEffect::Notify(Notice::from_error(&err))],
        }),

        (Idle | SummaryOpen(_), CheckoutEvent::Completed | CheckoutEvent::Rejected(_)) => {
            Err(ValidationError::NotSubmitting)
        }
    }
}

/// Drives [`transition`] against the API, the cart, and the order list.
#[derive(Debug)]
pub struct CheckoutFlow<T> {
    api: ApiClient<T>,
    state: CheckoutState,
    notices: NoticeBoard,
    submit_button: Control,
}

impl<T: Transport> CheckoutFlow<T> {
    #[must_use]
    pub fn new(api: ApiClient<T>, notices: NoticeBoard) -> Self {
        Self {
            api,
            state: CheckoutState::Idle,
            notices,
            submit_button: Control::new(PLACE_ORDER_LABEL),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    #[must_use]
    pub const fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Disabled, with a busy label, while an order request is in flight.
    #[must_use]
    pub const fn submit_button(&self) -> &Control {
        &self.submit_button
    }

    fn apply(&mut self, event: CheckoutEvent) -> Result<Vec<CheckoutEffect>, ValidationError> {
        let next = transition(&self.state, event)?;
        self.state = next.state;
        Ok(next.effects)
    }

    fn reject_locally(&self, err: ValidationError) -> ApiError {
        let err = ApiError::from(err);
        self.notices.post(Notice::from_error(&err));
        err
    }

    /// Open the summary for `cart`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyCart` (and posts it) for an empty
    /// mirror. No request is ever made.
    pub fn open(&mut self, cart: &CartMirror) -> Result<&OrderSummary, ApiError> {
        let opened = self.apply(CheckoutEvent::Open { cart: cart.clone() });
        opened.map_err(|e| self.reject_locally(e))?;
        self.state
            .summary()
            .ok_or_else(|| ApiError::from(ValidationError::CheckoutNotOpen))
    }

    /// # Errors
    ///
    /// Returns `ValidationError::SubmissionInFlight` while submitting.
    pub fn close(&mut self) -> Result<(), ApiError> {
        self.apply(CheckoutEvent::Close)
            .map(|_| ())
            .map_err(|e| self.reject_locally(e))
    }

    /// Submit the order.
    ///
    /// On success the flow is back at `Idle`, the cart mirror is cleared, and
    /// both the cart and the order list have been re-fetched independently.
    /// On failure the flow is back at `SummaryOpen` with the cart mirror
    /// untouched, and the server's message is on the notice board.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` without a request if the summary is not
    /// open, the cart mirror is now empty (which also closes the summary),
    /// address/phone are blank, or the submit button is already engaged.
    /// Otherwise the order request's error.
    #[instrument(skip_all)]
    pub async fn submit(
        &mut self,
        details: ShippingDetails,
        cart: &mut CartController<T>,
        orders: &mut OrderBook<T>,
    ) -> Result<Refreshed, ApiError> {
        let Some(_busy) = self.submit_button.try_engage(PLACING_ORDER_LABEL) else {
            return Err(self.reject_locally(ValidationError::SubmissionInFlight));
        };

        let user = match self.api.session().require_user().await {
            Ok(user) => user,
            Err(e) => return Err(self.reject_locally(e)),
        };

        let submitted = self.apply(CheckoutEvent::Submit {
            user_id: user.id,
            details,
            cart: cart.mirror().clone(),
        });
        let mut pending = match submitted {
            Ok(effects) => effects,
            Err(ValidationError::EmptyCart) => {
                self.state = CheckoutState::Idle;
                return Err(self.reject_locally(ValidationError::EmptyCart));
            }
            Err(e) => return Err(self.reject_locally(e)),
        };

        let mut refreshed = Refreshed::new();
        let mut failure = None;

        loop {
            let mut next = None;
            for effect in pending {
                match effect {
                    CheckoutEffect::Call(call) => {
                        next = Some(match self.api.execute(&call).await {
                            Ok(_) => CheckoutEvent::Completed,
                            Err(err) => {
                                warn!(error = %err, "order submission rejected");
                                failure = Some(err.clone());
                                CheckoutEvent::Rejected(err)
                            }
                        });
                    }
                    CheckoutEffect::ClearCartMirror => cart.clear_mirror(),
                    CheckoutEffect::RefreshCart => {
                        refreshed.record(RefreshTarget::Cart, cart.refresh().await.map(|_| ()));
                    }
                    CheckoutEffect::RefreshOrders => {
                        let loaded = orders.load().await.map(|_| ());
                        refreshed.record(RefreshTarget::Orders, loaded);
                    }
                    CheckoutEffect::Notify(notice) => self.notices.post(notice),
                }
            }

            match next {
                Some(event) => pending = self.apply(event)?,
                None => break,
            }
        }

        match failure {
            Some(err) => Err(err),
            None => {
                info!(user_id = %user.id, "order created");
                Ok(refreshed)
            }
        }
    }

    /// Cancel an existing order. Independent of the checkout state.
    ///
    /// # Errors
    ///
    /// See [`OrderBook::cancel`]. The error is also posted as a notice.
    pub async fn cancel(
        &self,
        orders: &mut OrderBook<T>,
        order_id: OrderId,
    ) -> Result<Refreshed, ApiError> {
        let result = orders.cancel(order_id).await;
        match &result {
            Ok(_) => self.notices.post(Notice::success(ORDER_CANCELLED)),
            Err(err) => self.notices.post(Notice::from_error(err)),
        }
        result
    }
}
