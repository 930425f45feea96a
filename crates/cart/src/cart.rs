//! Cart data model.
//!
//! A cart is an ordered list of line items, one per product, in insertion
//! order. The session manager owns the only mutable instance; consumers
//! get cloned snapshots via [`crate::session::CartSession::cart`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bodega_core::{CurrencyCode, Price, ProductId};

/// Product data handed to the cart by presentational collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Optional product image.
    pub image_url: Option<String>,
}

/// One product entry in a cart.
///
/// Invariant: `quantity` is always at least 1. An item whose quantity
/// would drop to zero is removed from the cart instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier. Unique within a cart.
    pub product_id: ProductId,
    /// Display name, captured at add time.
    pub product_name: String,
    /// Unit price, captured at add time.
    pub unit_price: Price,
    /// Optional product image.
    pub image_url: Option<String>,
    /// Number of units. Always >= 1.
    pub quantity: u32,
}

impl LineItem {
    /// Create a line item from product data.
    #[must_use]
    pub fn from_product(product: Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name,
            unit_price: product.price,
            image_url: product.image_url,
            quantity,
        }
    }

    /// Line total (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.amount * Decimal::from(self.quantity)
    }
}

/// Ordered collection of line items.
///
/// Order is insertion order; the cart never re-sorts. No two items share
/// a `product_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a cart from existing line items (e.g. a persisted record).
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Self { items }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of the given product, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| item.product_id == product_id)
            .map_or(0, |item| item.quantity)
    }

    /// Total units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of line totals.
    ///
    /// Currency is taken from the first line item; a cart only ever holds
    /// products priced in the storefront's single display currency.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        let currency = self
            .items
            .first()
            .map_or(CurrencyCode::default(), |item| {
                item.unit_price.currency_code
            });
        let amount = self.items.iter().map(LineItem::line_total).sum();
        Price::new(amount, currency)
    }

    /// Derived read-only summary.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            item_count: self.item_count(),
            subtotal: self.subtotal(),
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line item for the same product accumulates; otherwise
    /// a new line item is appended. Zero quantities are ignored.
    pub fn add(&mut self, product: Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            item.quantity += quantity;
        } else {
            self.items.push(LineItem::from_product(product, quantity));
        }
    }

    /// Remove the line item for a product. No-op when absent.
    pub fn remove(&mut self, product_id: ProductId) {
        self.items.retain(|item| item.product_id != product_id);
    }

    /// Decrement a product's quantity by one, removing the line item when
    /// it would reach zero. No-op when absent.
    pub fn decrease(&mut self, product_id: ProductId) {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            if item.quantity > 1 {
                item.quantity -= 1;
            } else {
                self.remove(product_id);
            }
        }
    }

    /// Set a product's quantity to an absolute value.
    ///
    /// Zero removes the line item. No-op when the product is absent.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            item.quantity = quantity;
        }
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Merge a pre-login cart into this (saved) cart.
    ///
    /// For each line item of `pre_login` in its original order: if this
    /// cart already has the product, quantities are added; otherwise the
    /// item is appended. The saved cart's ordering wins, with products
    /// new to the user appended in pre-login order. Per-product totals
    /// after the merge equal the sum of both sources.
    pub fn merge_from(&mut self, pre_login: Self) {
        for incoming in pre_login.items {
            if let Some(item) = self
                .items
                .iter_mut()
                .find(|item| item.product_id == incoming.product_id)
            {
                item.quantity += incoming.quantity;
            } else {
                self.items.push(incoming);
            }
        }
    }
}

/// Read-only cart summary for display collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    /// Total units across all line items.
    pub item_count: u32,
    /// Sum of line totals.
    pub subtotal: Price,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i32, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product-{id}"),
            price: Price::from_cents(cents, CurrencyCode::USD),
            image_url: None,
        }
    }

    fn cart_with(entries: &[(i32, u32)]) -> Cart {
        let mut cart = Cart::new();
        for &(id, quantity) in entries {
            cart.add(product(id, 100), quantity);
        }
        cart
    }

    #[test]
    fn test_add_accumulates_into_one_line_item() {
        let mut cart = Cart::new();
        cart.add(product(1, 100), 1);
        cart.add(product(1, 100), 1);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = Cart::new();
        cart.add(product(1, 100), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrease_removes_at_one() {
        let mut cart = cart_with(&[(1, 1)]);
        cart.decrease(ProductId::new(1));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrease_absent_is_noop() {
        let mut cart = cart_with(&[(1, 2)]);
        cart.decrease(ProductId::new(9));
        assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_cart_never_holds_zero_quantity() {
        let mut cart = cart_with(&[(1, 2)]);
        cart.decrease(ProductId::new(1));
        cart.decrease(ProductId::new(1));
        assert!(cart.items().iter().all(|item| item.quantity >= 1));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = cart_with(&[(1, 1)]);
        cart.remove(ProductId::new(2));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = cart_with(&[(1, 3)]);
        cart.set_quantity(ProductId::new(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_absent_is_noop() {
        let mut cart = Cart::new();
        cart.set_quantity(ProductId::new(1), 5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merge_adds_quantities_per_product() {
        // Saved user cart has A x3; pre-login cart has A x1.
        let mut saved = cart_with(&[(1, 3)]);
        let pre_login = cart_with(&[(1, 1)]);

        saved.merge_from(pre_login);

        assert_eq!(saved.items().len(), 1);
        assert_eq!(saved.quantity_of(ProductId::new(1)), 4);
    }

    #[test]
    fn test_merge_appends_new_products_after_saved_items() {
        // Saved user cart has B x1; pre-login cart has A x2.
        let mut saved = cart_with(&[(2, 1)]);
        let pre_login = cart_with(&[(1, 2)]);

        saved.merge_from(pre_login);

        let ids: Vec<i32> = saved
            .items()
            .iter()
            .map(|item| item.product_id.as_i32())
            .collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(saved.quantity_of(ProductId::new(2)), 1);
        assert_eq!(saved.quantity_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_merge_totals_sum_both_sources() {
        let mut saved = cart_with(&[(1, 2), (2, 1)]);
        let pre_login = cart_with(&[(2, 3), (3, 1)]);

        saved.merge_from(pre_login);

        assert_eq!(saved.quantity_of(ProductId::new(1)), 2);
        assert_eq!(saved.quantity_of(ProductId::new(2)), 4);
        assert_eq!(saved.quantity_of(ProductId::new(3)), 1);
        assert_eq!(saved.items().len(), 3);
    }

    #[test]
    fn test_merge_into_empty_saved_cart_keeps_pre_login_order() {
        let mut saved = Cart::new();
        let pre_login = cart_with(&[(3, 1), (1, 1), (2, 1)]);

        saved.merge_from(pre_login.clone());

        assert_eq!(saved, pre_login);
    }

    #[test]
    fn test_summary_counts_units_and_money() {
        let mut cart = Cart::new();
        cart.add(product(1, 250), 2); // $5.00
        cart.add(product(2, 1000), 1); // $10.00

        let summary = cart.summary();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal.amount, Decimal::new(1500, 2));
        assert_eq!(summary.subtotal.display(), "$15.00");
    }

    #[test]
    fn test_empty_cart_summary() {
        let summary = Cart::new().summary();
        assert_eq!(summary.item_count, 0);
        assert_eq!(summary.subtotal.amount, Decimal::ZERO);
    }
}
