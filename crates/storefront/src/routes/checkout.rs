//! Checkout route handler.
//!
//! Turns the session cart and the shipping form into a WhatsApp order
//! message. The cart is kept; the visitor clears it once the chat is sent.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;

use sparktizen_core::checkout::prepare_checkout;
use sparktizen_core::{CheckoutMessage, ShippingDetails};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::routes::cart::load_cart;
use crate::state::AppState;

/// Build the order message and chat link.
#[instrument(skip(state, session, details))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Json(details): Json<ShippingDetails>,
) -> Result<Json<CheckoutMessage>> {
    let missing = details.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".to_owned()));
    }

    let config = state.checkout();
    let checkout = prepare_checkout(
        &cart,
        &details,
        &config.shipping,
        config.currency,
        &config.whatsapp_number,
    );

    tracing::info!(
        lines = cart.len(),
        total = %checkout.summary.total,
        "Checkout message prepared"
    );
    add_breadcrumb("checkout", "Checkout message prepared", None);

    Ok(Json(checkout))
}
