//! Turning a cart into an order.

use crate::{
    orders::{PaymentMethod, ShippingAddress, COUNTRY},
    validation::{self, ValidationError},
};
use serde_derive::Serialize;

/// Orders at or above this subtotal ship for free.
pub const FREE_DELIVERY_THRESHOLD: f64 = 999.0;
pub const DELIVERY_FEE: f64 = 99.0;

/// What the shopper will be charged.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrderSummary {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
}

impl OrderSummary {
    pub fn for_subtotal(subtotal: f64) -> Self {
        let delivery_fee = if subtotal >= FREE_DELIVERY_THRESHOLD {
            0.0
        } else {
            DELIVERY_FEE
        };

        OrderSummary {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}

/// The checkout form, exactly as the shopper filled it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutForm {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub special_instructions: String,
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    /// Check every field, stopping at the first problem.
    pub fn validate(&self) -> Result<CheckoutDetails, ValidationError> {
        let required = |value: &str, name: &'static str| {
            if value.trim().is_empty() {
                Err(ValidationError::MissingField(name))
            } else {
                Ok(())
            }
        };

        required(&self.full_name, "your full name")?;

        let phone = self.phone_number.trim();
        if phone.is_empty() || self.phone_number.chars().count() < 10 {
            return Err(ValidationError::InvalidPhoneNumber);
        }

        if self.email.trim().is_empty() || !validation::is_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }

        required(&self.street_address, "your street address")?;
        required(&self.city, "your city")?;
        required(&self.state, "your state")?;

        if self.pincode.trim().is_empty() || self.pincode.chars().count() != 6
        {
            return Err(ValidationError::InvalidPincode);
        }

        Ok(CheckoutDetails {
            shipping_address: ShippingAddress {
                full_name: self.full_name.clone(),
                phone_number: self.phone_number.clone(),
                email: self.email.clone(),
                street_address: self.street_address.clone(),
                city: self.city.clone(),
                state: self.state.clone(),
                pincode: self.pincode.clone(),
                country: COUNTRY.to_string(),
            },
            special_instructions: self.special_instructions.clone(),
            payment_method: self.payment_method,
        })
    }
}

/// A validated checkout form.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutDetails {
    pub shipping_address: ShippingAddress,
    pub special_instructions: String,
    pub payment_method: PaymentMethod,
}

impl CheckoutDetails {
    pub(crate) fn payload(&self) -> DeliveryPayload<'_> {
        DeliveryPayload {
            shipping_address: &self.shipping_address,
            phone_number: &self.shipping_address.phone_number,
            special_instructions: &self.special_instructions,
        }
    }
}

/// The delivery details the backend expects with every order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeliveryPayload<'a> {
    pub(crate) shipping_address: &'a ShippingAddress,
    pub(crate) phone_number: &'a str,
    pub(crate) special_instructions: &'a str,
}

/// Reasons the shopper can't start checking out.
#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Please log in to proceed with checkout")]
    NotLoggedIn,
    #[error("Your cart is empty")]
    EmptyCart,
}
