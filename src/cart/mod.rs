//! Cart bookkeeping.
//!
//! The backend owns the cart, but it happily returns entries whose product
//! has since been deleted or whose fields are malformed. Everything in here
//! works on a read-only view that skips those entries; nothing is ever
//! written back to the server.

mod validity;

pub use validity::InvalidCartItem;

use crate::{
    id::{CartItemId, ProductId},
    products::Product,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A cart line that passed validation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct CartItem {
    /// The line's own identifier, used when changing its quantity.
    pub id: Option<CartItemId>,
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn from_value(entry: &Value) -> Result<Self, InvalidCartItem> {
        validity::parse_entry(entry)
    }

    /// The price of the whole line.
    pub fn subtotal(&self) -> f64 { self.product.price * f64::from(self.quantity) }
}

/// A shopper's cart with the invalid entries filtered out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
    dropped: usize,
}

impl Cart {
    /// Build a cart from the backend's raw cart payload.
    ///
    /// Anything other than an array is treated as an empty cart.
    pub fn from_entries(entries: &Value) -> Cart {
        let raw = match entries.as_array() {
            Some(raw) => raw,
            None => return Cart::default(),
        };

        let mut items = Vec::with_capacity(raw.len());

        for entry in raw {
            match CartItem::from_value(entry) {
                Ok(item) => items.push(item),
                Err(e) => log::trace!("Skipping cart entry {}: {}", entry, e),
            }
        }

        let dropped = raw.len() - items.len();
        if dropped > 0 {
            log::debug!("Filtered out {} invalid cart items", dropped);
        }

        Cart { items, dropped }
    }

    pub fn items(&self) -> &[CartItem] { &self.items }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// How many of the server's entries were left out because they were
    /// invalid.
    pub fn dropped(&self) -> usize { self.dropped }

    /// The sum of every line's price times its quantity.
    pub fn total(&self) -> f64 { self.items.iter().map(CartItem::subtotal).sum() }

    pub fn contains(&self, product: &ProductId) -> bool {
        self.find(product).is_some()
    }

    pub fn find(&self, product: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == *product)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.dropped = 0;
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D>(deserializer: D) -> Result<Cart, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Cart::from_entries(&raw))
    }
}

/// Is this raw cart entry usable?
pub fn is_valid_cart_item(entry: &Value) -> bool {
    CartItem::from_value(entry).is_ok()
}

/// Keep only the usable entries from a raw cart payload.
pub fn filter_valid_cart_items(entries: &Value) -> Vec<CartItem> {
    Cart::from_entries(entries).items
}

/// Total a raw cart payload, ignoring invalid entries.
pub fn calculate_cart_total(entries: &Value) -> f64 {
    Cart::from_entries(entries).total()
}

/// Does a valid entry in the raw cart payload reference this product?
pub fn is_product_in_cart(product: &str, entries: &Value) -> bool {
    Cart::from_entries(entries).contains(&ProductId::from(product))
}
