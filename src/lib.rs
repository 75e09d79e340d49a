//! A client for the MotluPets pet-supplies storefront API.

#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod cart;
pub mod checkout;
mod client;
mod config;
pub mod endpoints;
mod id;
pub mod orders;
pub mod products;
mod session;
mod shop;
mod utils;
pub mod validation;

pub use cart::{Cart, CartItem};
pub use client::{needs_refresh, ApiRequest, Storefront};
pub use config::{Config, DEFAULT_TIMEOUT};
pub use id::{CartItemId, OrderId, ProductId, UserId};
pub use session::{
    EntryPoint, FileStore, MemoryStore, Role, Session, SessionStore, StoreError,
};
pub use shop::Shop;
pub use utils::format_price;

/// The default user agent to use when communicating with the storefront.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));
