//! Cart route handlers.
//!
//! The cart lives in the session. Every handler loads it, applies one cart
//! operation, writes it back and answers with the updated view.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use sparktizen_core::{Cart, CartItem, CurrencyCode, OrderSummary, Price, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::models::session_keys;
use crate::services::CatalogError;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// One cart line as shown to the visitor.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub quantity: u32,
    pub line_total: Decimal,
    pub line_total_display: String,
}

impl CartLineView {
    fn new(item: &CartItem, currency: CurrencyCode) -> Self {
        Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            price: item.price,
            image: item.image.as_ref().map(|image| image.as_str().to_owned()),
            quantity: item.quantity,
            line_total: item.line_total(),
            line_total_display: currency.format(item.line_total()),
        }
    }
}

/// Cart contents and totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub summary: OrderSummary,
    pub subtotal_display: String,
    pub shipping_display: String,
    pub total_display: String,
}

impl CartView {
    fn new(cart: &Cart, state: &AppState) -> Self {
        let checkout = state.checkout();
        let summary = cart.summary(&checkout.shipping);
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartLineView::new(item, checkout.currency))
                .collect(),
            subtotal_display: checkout.currency.format(summary.subtotal),
            shipping_display: checkout.currency.format(summary.shipping),
            total_display: checkout.currency.format(summary.total),
            summary,
        }
    }
}

/// Cart badge.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartCount {
    pub count: u64,
}

// =============================================================================
// Request Types
// =============================================================================

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Quantity change request. Zero and negative quantities clamp to 1.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Remove-line request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCart {
    pub product_id: ProductId,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the session cart, empty if there is none yet.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::new(&cart, &state)))
}

/// Total units in the cart.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartCount {
        count: cart.item_count(),
    }))
}

/// Add a product. Unknown products are a 404.
#[instrument(skip(state, session), fields(product_id = %req.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<AddToCart>,
) -> Result<Json<CartView>> {
    let product = state
        .catalog()
        .get_product(&req.product_id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(req.product_id.clone()))?;

    let mut cart = load_cart(&session).await?;
    cart.add_many(&product, req.quantity.unwrap_or(1));
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product.id.as_str())]),
    );

    Ok(Json(CartView::new(&cart, &state)))
}

/// Change a line's quantity.
#[instrument(skip(state, session), fields(product_id = %req.product_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<UpdateQuantity>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.update_quantity(&req.product_id, req.quantity);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::new(&cart, &state)))
}

/// Remove a line.
#[instrument(skip(state, session), fields(product_id = %req.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RemoveFromCart>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove_from_cart(&req.product_id);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::new(&cart, &state)))
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.clear_cart();
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::new(&cart, &state)))
}
