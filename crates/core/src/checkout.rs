//! Checkout message formatting.
//!
//! Orders are not submitted to a payment API. Instead the cart and the
//! customer's shipping details are rendered into one human-readable message
//! and handed to the store's WhatsApp chat through a `wa.me` deep link.

use serde::{Deserialize, Serialize};

use crate::cart::{Cart, OrderSummary, ShippingPolicy};
use crate::types::CurrencyCode;

/// Base URL of the WhatsApp click-to-chat endpoint.
pub const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Customer-supplied shipping form.
///
/// Free-form text; presence of required fields is checked by the caller
/// with [`ShippingDetails::missing_fields`] before formatting. Absent
/// fields deserialize as blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: String,
    /// WhatsApp number the store should reply on.
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub notes: String,
}

impl ShippingDetails {
    /// Names of required fields that are blank, in form order.
    ///
    /// Postal code and notes are optional.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A ready-to-send checkout: the message text, the deep link carrying it,
/// and the totals it quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutMessage {
    pub message: String,
    pub link: String,
    pub summary: OrderSummary,
}

/// Render the order message for `cart` and `details`.
///
/// Every line item is listed, including zero-priced ones. An empty cart
/// produces an empty items section and zero totals. The postal code always
/// has its own line, blank or not. Notes are quoted as typed and the block
/// is left out when they are blank. The finished message is trimmed.
#[must_use]
pub fn format_order_message(
    cart: &Cart,
    details: &ShippingDetails,
    policy: &ShippingPolicy,
    currency: CurrencyCode,
) -> String {
    let summary = cart.summary(policy);

    let mut lines = vec![
        "*New Order*".to_owned(),
        String::new(),
        "*Customer Details:*".to_owned(),
        format!("Name: {}", details.full_name.trim()),
        format!("Email: {}", details.email.trim()),
        format!("WhatsApp: {}", details.phone.trim()),
        String::new(),
        "*Shipping Address:*".to_owned(),
        details.address.trim().to_owned(),
        format!("{}, {}", details.city.trim(), details.state.trim()),
        details.postal_code.trim().to_owned(),
        String::new(),
        "*Order Items:*".to_owned(),
    ];
    lines.extend(cart.items().iter().map(|item| {
        format!(
            "{} x{} - {}",
            item.name,
            item.quantity,
            currency.format(item.line_total())
        )
    }));
    lines.extend([
        String::new(),
        "*Order Summary:*".to_owned(),
        format!("Subtotal: {}", currency.format(summary.subtotal)),
        format!("Shipping: {}", currency.format(summary.shipping)),
        format!("Total: {}", currency.format(summary.total)),
    ]);
    if !details.notes.trim().is_empty() {
        lines.push(String::new());
        lines.push(format!("Notes: {}", details.notes));
    }

    lines.join("\n").trim().to_owned()
}

/// Build the click-to-chat link for `phone_number` with `message`
/// percent-encoded into the `text` parameter.
///
/// ```
/// use sparktizen_core::checkout::checkout_link;
///
/// let link = checkout_link("2348000000000", "Hi & bye");
/// assert_eq!(link, "https://wa.me/2348000000000?text=Hi%20%26%20bye");
/// ```
#[must_use]
pub fn checkout_link(phone_number: &str, message: &str) -> String {
    format!(
        "{WHATSAPP_BASE_URL}/{phone_number}?text={}",
        urlencoding::encode(message)
    )
}

/// Format the message and link in one step.
#[must_use]
pub fn prepare_checkout(
    cart: &Cart,
    details: &ShippingDetails,
    policy: &ShippingPolicy,
    currency: CurrencyCode,
    phone_number: &str,
) -> CheckoutMessage {
    let message = format_order_message(cart, details, policy, currency);
    let link = checkout_link(phone_number, &message);
    CheckoutMessage {
        message,
        link,
        summary: cart.summary(policy),
    }
}
