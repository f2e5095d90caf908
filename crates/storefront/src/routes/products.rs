//! Product route handlers.
//!
//! Public catalog reads: the landing gallery, the full listing, and product
//! detail with related products.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use sparktizen_core::{CurrencyCode, Price, Product, ProductId};

use crate::error::Result;
use crate::services::CatalogError;
use crate::services::catalog::{GALLERY_SIZE, related_products};
use crate::state::AppState;

/// Product summary for grids and the gallery.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub price_display: String,
    pub image: String,
    pub in_stock: bool,
}

impl ProductCard {
    fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            price_display: currency.format(product.price.amount()),
            image: product.images.primary_or_placeholder().to_owned(),
            in_stock: product.in_stock,
        }
    }
}

/// Full product page data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub price_display: String,
    pub images: Vec<String>,
    pub in_stock: bool,
    pub related: Vec<ProductCard>,
}

/// Display SKU: the first 8 characters of the id, uppercased.
fn sku(id: &ProductId) -> String {
    id.as_str().chars().take(8).collect::<String>().to_uppercase()
}

fn cards(products: &[Product], currency: CurrencyCode) -> Vec<ProductCard> {
    products
        .iter()
        .map(|p| ProductCard::new(p, currency))
        .collect()
}

/// Landing page gallery: the newest few products.
#[instrument(skip(state))]
pub async fn gallery(State(state): State<AppState>) -> Result<Json<Vec<ProductCard>>> {
    let products = state.catalog().list_products_limit(GALLERY_SIZE).await?;
    Ok(Json(cards(&products, state.checkout().currency)))
}

/// Every product, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductCard>>> {
    let products = state.catalog().list_products().await?;
    Ok(Json(cards(&products, state.checkout().currency)))
}

/// Product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>> {
    let id = ProductId::new(id);
    let product = state
        .catalog()
        .get_product(&id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

    let currency = state.checkout().currency;
    let related = related_products(state.catalog(), &product.id).await?;

    Ok(Json(ProductDetail {
        sku: sku(&product.id),
        price_display: currency.format(product.price.amount()),
        images: product.images.to_urls(),
        related: cards(&related, currency),
        id: product.id,
        name: product.name,
        description: product.description,
        price: product.price,
        in_stock: product.in_stock,
    }))
}
