//! Aggregates module
pub mod product;
pub mod cart;

pub use product::{Costs, DedicatedGraphics, Display, Processor, Product, ProductAddon, ProductSize, WholesaleInfo};
pub use cart::{Cart, CartError, CartItem};
