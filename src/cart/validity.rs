use crate::{cart::CartItem, id::CartItemId, products::Product};
use serde_json::Value;
use std::convert::TryFrom;

/// Check a single raw cart entry and turn it into a [`CartItem`].
///
/// An entry is only usable when it has a product with a non-empty `_id`, a
/// numeric `price`, and an integer `quantity` of at least one.
pub(crate) fn parse_entry(entry: &Value) -> Result<CartItem, InvalidCartItem> {
    let fields = entry.as_object().ok_or(InvalidCartItem::NotAnObject)?;

    let product = match fields.get("product") {
        Some(product @ Value::Object(_)) => product,
        _ => return Err(InvalidCartItem::MissingProduct),
    };

    match product.get("_id") {
        Some(Value::String(id)) if !id.is_empty() => {},
        _ => return Err(InvalidCartItem::MissingProductId),
    }

    if !matches!(product.get("price"), Some(Value::Number(_))) {
        return Err(InvalidCartItem::NonNumericPrice);
    }

    let quantity = fields
        .get("quantity")
        .and_then(whole_number)
        .filter(|&q| q >= 1)
        .ok_or(InvalidCartItem::BadQuantity)?;

    let product: Product = serde_json::from_value(product.clone())
        .map_err(InvalidCartItem::MalformedProduct)?;

    let id = match fields.get("_id") {
        Some(Value::String(id)) if !id.is_empty() => {
            Some(CartItemId::from(id.as_str()))
        },
        _ => None,
    };

    Ok(CartItem {
        id,
        product,
        quantity,
    })
}

/// Accept `2` as well as `2.0`, since JSON doesn't distinguish integers
/// from floats.
fn whole_number(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }

    let n = value.as_f64()?;
    if n.fract() == 0.0 && n >= 0.0 && n <= f64::from(u32::MAX) {
        Some(n as u32)
    } else {
        None
    }
}

/// Why a cart entry was left out.
#[derive(Debug, thiserror::Error)]
pub enum InvalidCartItem {
    #[error("The cart entry isn't an object")]
    NotAnObject,
    #[error("The cart entry doesn't reference a product")]
    MissingProduct,
    #[error("The referenced product has no identifier")]
    MissingProductId,
    #[error("The referenced product's price isn't a number")]
    NonNumericPrice,
    #[error("The quantity must be a whole number of at least 1")]
    BadQuantity,
    #[error("Unable to read the referenced product")]
    MalformedProduct(#[source] serde_json::Error),
}
