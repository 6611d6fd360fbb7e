// ranmix/src/cart/mod.rs

//! The shopping cart: persisted line items, fulfillment branch and derived totals.

pub mod model;
pub mod price;
pub mod store;

pub use model::{CartLine, CartState, Product};
pub use price::{format_price, parse_price};
pub use store::{CartStore, CART_STORAGE_KEY};
