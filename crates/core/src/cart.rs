//! The shopping cart.
//!
//! A [`Cart`] is a plain owned value: whoever holds it (the storefront keeps
//! one per session) mutates it through the methods below and nothing else.
//! Lines are merged by product id, and every line always has a quantity of
//! at least one. There is deliberately no "set to zero removes" path;
//! removal is its own operation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ImageRef, Price, Product, ProductId};

/// Flat shipping fee charged on any non-empty order, in store currency units.
pub const DEFAULT_SHIPPING_FEE: u32 = 1500;

/// One line in the cart: a product snapshot plus a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Option<ImageRef>,
    pub quantity: u32,
}

impl CartItem {
    fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.images.primary().cloned(),
            quantity: 1,
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

/// How shipping is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Charged once per order when the subtotal is above zero.
    pub flat_fee: Price,
}

impl ShippingPolicy {
    /// A policy with the given flat fee.
    #[must_use]
    pub const fn flat(flat_fee: Price) -> Self {
        Self { flat_fee }
    }

    /// Shipping owed for a given subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal > Decimal::ZERO {
            self.flat_fee.amount()
        } else {
            Decimal::ZERO
        }
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self::flat(Price::from_units(DEFAULT_SHIPPING_FEE))
    }
}

/// Totals derived from a cart. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub item_count: u64,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Session-scoped shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add one unit of `product`.
    ///
    /// If a line for the same product id exists its quantity goes up by one,
    /// otherwise a new line with quantity 1 is appended.
    pub fn add_to_cart(&mut self, product: &Product) {
        match self.item_mut(&product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem::from_product(product)),
        }
    }

    /// Add `count` units of `product`, as if `add_to_cart` were called
    /// `count` times. A count of zero still adds one unit.
    pub fn add_many(&mut self, product: &Product, count: u32) {
        self.add_to_cart(product);
        if let Some(item) = self.item_mut(&product.id) {
            item.quantity = item.quantity.saturating_add(count.max(1) - 1);
        }
    }

    /// Remove the line for `product_id`. No-op if absent.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) {
        self.items.retain(|item| &item.product_id != product_id);
    }

    /// Set the quantity of an existing line, clamped to at least 1.
    ///
    /// Quantities of zero or below become 1; the line is never removed here.
    /// No-op if there is no line for `product_id`.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if let Some(item) = self.item_mut(product_id) {
            item.quantity = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        }
    }

    /// Remove every line.
    pub fn clear_cart(&mut self) {
        self.items.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    fn item_mut(&mut self, product_id: &ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines (the cart badge).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of price times quantity over all lines, saturating at
    /// `Decimal::MAX`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(CartItem::line_total)
            .try_fold(Decimal::ZERO, Decimal::checked_add)
            .unwrap_or(Decimal::MAX)
    }

    /// Subtotal, shipping and total under `policy`.
    #[must_use]
    pub fn summary(&self, policy: &ShippingPolicy) -> OrderSummary {
        let subtotal = self.subtotal();
        let shipping = policy.shipping_for(subtotal);
        OrderSummary {
            item_count: self.item_count(),
            subtotal,
            shipping,
            total: subtotal.checked_add(shipping).unwrap_or(Decimal::MAX),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::types::{Price, Product, ProductId, ProductImages};

    pub fn product(id: &str, name: &str, price: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: format!("{name} description"),
            price: Price::from_units(price),
            images: ProductImages::new(vec![format!("https://img.test/{id}.png")]),
            in_stock: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::test_support::product;
    use super::*;

    #[test]
    fn test_add_appends_then_merges() {
        let shirt = product("p1", "Shirt", 1000);
        let cap = product("p2", "Cap", 500);
        let mut cart = Cart::new();

        cart.add_to_cart(&shirt);
        cart.add_to_cart(&cap);
        cart.add_to_cart(&shirt);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].product_id.as_str(), "p1");
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[1].quantity, 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_snapshots_primary_image() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product("p1", "Shirt", 1000));
        assert_eq!(
            cart.items()[0].image.as_ref().map(ImageRef::as_str),
            Some("https://img.test/p1.png")
        );
    }

    #[test]
    fn test_add_many() {
        let shirt = product("p1", "Shirt", 1000);
        let mut cart = Cart::new();
        cart.add_many(&shirt, 3);
        cart.add_many(&shirt, 0);
        assert_eq!(cart.item(&shirt.id).unwrap().quantity, 4);
    }

    #[test]
    fn test_update_quantity_clamps_to_one() {
        let shirt = product("p1", "Shirt", 1000);
        let mut cart = Cart::new();
        cart.add_many(&shirt, 5);

        cart.update_quantity(&shirt.id, 0);
        assert_eq!(cart.item(&shirt.id).unwrap().quantity, 1);

        cart.update_quantity(&shirt.id, -7);
        assert_eq!(cart.item(&shirt.id).unwrap().quantity, 1);

        cart.update_quantity(&shirt.id, 9);
        assert_eq!(cart.item(&shirt.id).unwrap().quantity, 9);
    }

    #[test]
    fn test_update_quantity_missing_is_noop() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product("p1", "Shirt", 1000));
        let before = cart.clone();
        cart.update_quantity(&ProductId::new("nope"), 4);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product("p1", "Shirt", 1000));
        cart.add_to_cart(&product("p2", "Cap", 500));

        cart.remove_from_cart(&ProductId::new("p1"));
        assert_eq!(cart.len(), 1);

        cart.remove_from_cart(&ProductId::new("p1"));
        assert_eq!(cart.len(), 1);

        cart.clear_cart();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_summary_example() {
        let mut cart = Cart::new();
        cart.add_many(&product("p1", "Jersey", 2000), 2);

        let summary = cart.summary(&ShippingPolicy::default());
        assert_eq!(summary.subtotal, Decimal::from(4000));
        assert_eq!(summary.shipping, Decimal::from(1500));
        assert_eq!(summary.total, Decimal::from(5500));
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn test_summary_empty_cart_has_no_shipping() {
        let summary = Cart::new().summary(&ShippingPolicy::default());
        assert_eq!(summary.subtotal, Decimal::ZERO);
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_summary_zero_priced_items_skip_shipping() {
        let mut cart = Cart::new();
        cart.add_to_cart(&product("free", "Sticker", 0));
        let summary = cart.summary(&ShippingPolicy::default());
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.item_count, 1);
    }

    #[test]
    fn test_summary_at_price_and_quantity_limits() {
        let mut big = product("big", "Big", 0);
        big.price = Price::MAX;
        let mut cart = Cart::new();
        cart.add_to_cart(&big);
        cart.add_to_cart(&big);
        cart.update_quantity(&big.id, 4_000_000_000);

        let expected = Price::MAX.amount() * Decimal::from(4_000_000_000u32);
        let summary = cart.summary(&ShippingPolicy::default());
        assert_eq!(summary.subtotal, expected);
        assert_eq!(summary.total, expected + Decimal::from(1500));
    }

    #[test]
    fn test_serde_session_roundtrip() {
        let mut cart = Cart::new();
        cart.add_many(&product("p1", "Shirt", 1000), 2);
        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::test_support::product;
        use super::super::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u8),
            Remove(u8),
            Update(u8, i64),
            Clear,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => (0u8..4).prop_map(Op::Add),
                1 => (0u8..4).prop_map(Op::Remove),
                2 => ((0u8..4), -5i64..20).prop_map(|(p, q)| Op::Update(p, q)),
                1 => Just(Op::Clear),
            ]
        }

        fn catalog() -> Vec<Product> {
            vec![
                product("a", "A", 0),
                product("b", "B", 250),
                product("c", "C", 1000),
                product("d", "D", 2000),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Repeated adds of one product merge into a single line.
            #[test]
            fn adds_merge(count in 1u32..50) {
                let shirt = product("p1", "Shirt", 1000);
                let mut cart = Cart::new();
                for _ in 0..count {
                    cart.add_to_cart(&shirt);
                }
                prop_assert_eq!(cart.len(), 1);
                prop_assert_eq!(cart.item(&shirt.id).map(|i| i.quantity), Some(count));
            }

            /// Non-positive updates clamp to one and keep the line.
            #[test]
            fn update_never_below_one(q in i64::MIN..=0) {
                let shirt = product("p1", "Shirt", 1000);
                let mut cart = Cart::new();
                cart.add_many(&shirt, 3);
                cart.update_quantity(&shirt.id, q);
                prop_assert_eq!(cart.item(&shirt.id).map(|i| i.quantity), Some(1));
            }

            /// Removing an id that is not in the cart changes nothing.
            #[test]
            fn remove_absent_is_noop(ops in proptest::collection::vec(op(), 0..20)) {
                let products = catalog();
                let mut cart = Cart::new();
                for op in ops {
                    apply(&mut cart, &products, op);
                }
                let before = cart.clone();
                cart.remove_from_cart(&ProductId::new("not-in-catalog"));
                prop_assert_eq!(cart, before);
            }

            /// Any operation sequence keeps quantities positive, ids unique,
            /// and totals consistent with the flat shipping rule.
            #[test]
            fn invariants_hold(ops in proptest::collection::vec(op(), 0..40)) {
                let products = catalog();
                let mut cart = Cart::new();
                for op in ops {
                    apply(&mut cart, &products, op);
                }

                let mut ids: Vec<_> = cart.items().iter().map(|i| i.product_id.clone()).collect();
                ids.sort();
                ids.dedup();
                prop_assert_eq!(ids.len(), cart.len());
                prop_assert!(cart.items().iter().all(|i| i.quantity >= 1));

                let expected: Decimal = cart
                    .items()
                    .iter()
                    .map(|i| i.price.amount() * Decimal::from(i.quantity))
                    .sum();
                let summary = cart.summary(&ShippingPolicy::default());
                prop_assert_eq!(summary.subtotal, expected);
                let shipping = if expected > Decimal::ZERO { Decimal::from(1500) } else { Decimal::ZERO };
                prop_assert_eq!(summary.total, expected + shipping);
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Totals never panic, whatever the prices and quantities.
            #[test]
            fn extreme_totals_are_total(
                lines in proptest::collection::vec((0u64..=999_999_999_999, any::<u32>()), 1..8),
            ) {
                let mut cart = Cart::new();
                for (i, (cents, quantity)) in lines.iter().enumerate() {
                    let mut p = product(&format!("p{i}"), "Item", 0);
                    p.price = Price::new(Decimal::new(i64::try_from(*cents).unwrap(), 2)).unwrap();
                    cart.add_to_cart(&p);
                    cart.update_quantity(&p.id, i64::from(*quantity));
                }

                let summary = cart.summary(&ShippingPolicy::flat(Price::MAX));
                prop_assert!(summary.subtotal >= Decimal::ZERO);
                prop_assert!(summary.total >= summary.subtotal);
                prop_assert!(crate::checkout::format_order_message(
                    &cart,
                    &crate::checkout::ShippingDetails::default(),
                    &ShippingPolicy::default(),
                    crate::types::CurrencyCode::NGN,
                )
                .contains("Total: "));
            }
        }

        fn apply(cart: &mut Cart, products: &[Product], op: Op) {
            let pick = |i: u8| products.get(usize::from(i)).cloned();
            match op {
                Op::Add(i) => {
                    if let Some(p) = pick(i) {
                        cart.add_to_cart(&p);
                    }
                }
                Op::Remove(i) => {
                    if let Some(p) = pick(i) {
                        cart.remove_from_cart(&p.id);
                    }
                }
                Op::Update(i, q) => {
                    if let Some(p) = pick(i) {
                        cart.update_quantity(&p.id, q);
                    }
                }
                Op::Clear => cart.clear_cart(),
            }
        }
    }
}
