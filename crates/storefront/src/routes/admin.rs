//! Admin product management.
//!
//! Every handler requires a logged-in admin. Products are created from a
//! multipart form carrying the fields and one or more image files; images go
//! to the asset host first and the returned URLs are stored on the product.

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sparktizen_core::{NewProduct, Price, Product, ProductFields, ProductId, ProductImages};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::CatalogError;
use crate::state::AppState;

/// Largest accepted create-product request, images included.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// An image file from the create form.
#[derive(Debug)]
struct UploadedImage {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Parsed create-product form.
#[derive(Debug, Default)]
struct ProductForm {
    name: String,
    description: String,
    price: String,
    in_stock: Option<String>,
    images: Vec<UploadedImage>,
}

/// Price as sent by the client: a JSON number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(serde_json::Number),
    Text(String),
}

impl PriceInput {
    fn parse(&self) -> Result<Price> {
        let raw = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        };
        parse_price(&raw)
    }
}

/// Product update body.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub description: String,
    pub price: PriceInput,
    pub in_stock: bool,
}

/// Response to a successful create.
#[derive(Debug, Serialize)]
pub struct CreatedProduct {
    pub id: ProductId,
    pub images: Vec<String>,
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid form data: {}", err.body_text()))
}

fn parse_price(raw: &str) -> Result<Price> {
    Price::parse(raw).map_err(|e| AppError::BadRequest(format!("Invalid price: {e}")))
}

/// New products are in stock unless the form says otherwise.
fn parse_in_stock(value: Option<&str>) -> bool {
    value.is_none_or(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "on" | "1" | "yes"
        )
    })
}

fn validate_fields(fields: &ProductFields) -> Result<()> {
    let missing = fields.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

async fn read_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "images" | "image" => {
                let filename = field.file_name().unwrap_or("image").to_owned();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !bytes.is_empty() {
                    form.images.push(UploadedImage {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "name" => form.name = field.text().await.map_err(multipart_error)?,
            "description" => form.description = field.text().await.map_err(multipart_error)?,
            "price" => form.price = field.text().await.map_err(multipart_error)?,
            "in_stock" => form.in_stock = Some(field.text().await.map_err(multipart_error)?),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// All products, newest first.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().list_products().await?))
}

/// One product for the edit form.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    let product = state
        .catalog()
        .get_product(&id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
    Ok(Json(product))
}

/// Create a product from a multipart form.
///
/// Fields: `name`, `description`, `price`, `in_stock` (checkbox), and one or
/// more `images` files.
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedProduct>)> {
    let form = read_form(multipart).await?;

    let fields = ProductFields {
        name: form.name.trim().to_owned(),
        description: form.description.trim().to_owned(),
        price: parse_price(&form.price)?,
        in_stock: parse_in_stock(form.in_stock.as_deref()),
    };
    validate_fields(&fields)?;
    if form.images.is_empty() {
        return Err(AppError::BadRequest(
            "Please upload at least one image.".to_owned(),
        ));
    }

    let assets = state.assets();
    let images: ProductImages = try_join_all(form.images.into_iter().map(|image| async move {
        assets
            .upload_image(&image.filename, &image.content_type, image.bytes)
            .await
    }))
    .await?
    .into_iter()
    .collect();
    let urls = images.to_urls();

    let id = state
        .catalog()
        .create_product(NewProduct { fields, images })
        .await?;
    tracing::info!(product_id = %id, images = urls.len(), "Product created");

    Ok((StatusCode::CREATED, Json(CreatedProduct { id, images: urls })))
}

/// Replace a product's editable fields. Images are left as they are.
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<StatusCode> {
    let fields = ProductFields {
        name: req.name.trim().to_owned(),
        description: req.description.trim().to_owned(),
        price: req.price.parse()?,
        in_stock: req.in_stock,
    };
    validate_fields(&fields)?;

    let id = ProductId::new(id);
    state.catalog().update_product(&id, fields).await?;
    tracing::info!(product_id = %id, "Product updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a product.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = ProductId::new(id);
    state.catalog().delete_product(&id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
