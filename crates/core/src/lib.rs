//! Sparktizen Core - Shared types and storefront logic.
//!
//! This crate provides the pieces used across all Sparktizen components:
//! - `storefront` - Public JSON API and admin panel
//! - `cli` - Command-line tools for migrations, admin users and imports
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and products
//! - [`cart`] - The session cart: merge-by-identity add, clamp-on-update
//! - [`checkout`] - Order message formatting and the messaging deep link

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use cart::{Cart, CartItem, OrderSummary, ShippingPolicy};
pub use checkout::{CheckoutMessage, ShippingDetails};
pub use types::*;
