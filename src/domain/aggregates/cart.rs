//! Cart Aggregate
//!
//! Carts live only in memory for the duration of a shopping session.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::product::Product;
use crate::domain::pricing::{self, PriceQuote, PricingError, Selection};
use crate::domain::value_objects::Quantity;

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    items: Vec<CartItem>,
    subtotal: Decimal,
}

#[derive(Clone, Debug)]
pub struct CartItem {
    pub product: Product,
    pub quantity: Quantity,
    pub selection: Selection,
    pub selected_color: Option<String>,
    quote: PriceQuote,
}

impl CartItem {
    /// Prices the configuration up front so a cart never holds an unpriceable line.
    pub fn new(product: Product, quantity: Quantity, selection: Selection, selected_color: Option<String>) -> Result<Self, PricingError> {
        let quote = pricing::quote(&product, &selection, quantity)?;
        Ok(Self { product, quantity, selection, selected_color, quote })
    }

    pub fn unit_final_price(&self) -> Decimal { self.quote.unit_final_price }
    pub fn total_price(&self) -> Decimal { self.quote.total_price }

    fn same_configuration(&self, other: &CartItem) -> bool {
        self.product.id == other.product.id && self.selection == other.selection && self.selected_color == other.selected_color
    }

    fn set_quantity(&mut self, quantity: Quantity) -> Result<(), PricingError> {
        self.quote.total_price = pricing::line_total(&self.product, self.quote.unit_final_price, quantity)?;
        self.quantity = quantity;
        Ok(())
    }
}

impl Cart {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4().to_string(), items: vec![], subtotal: Decimal::ZERO }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn subtotal(&self) -> Decimal { self.subtotal }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds a line, merging it into an existing line with the same configuration.
    /// On error the cart is left unchanged.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        let mut items = self.items.clone();
        if let Some(existing) = items.iter_mut().find(|i| i.same_configuration(&item)) {
            let quantity = existing.quantity.add(item.quantity);
            existing.set_quantity(quantity)?;
        } else {
            items.push(item);
        }
        self.commit(items)
    }

    pub fn update_quantity(&mut self, index: usize, quantity: i64) -> Result<(), CartError> {
        let quantity = Quantity::new(quantity).map_err(PricingError::from)?;
        let mut items = self.items.clone();
        let item = items.get_mut(index).ok_or(CartError::ItemNotFound(index))?;
        item.set_quantity(quantity)?;
        self.commit(items)
    }

    pub fn remove_item(&mut self, index: usize) -> Result<CartItem, CartError> {
        if index >= self.items.len() { return Err(CartError::ItemNotFound(index)); }
        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.commit(items)?;
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.subtotal = Decimal::ZERO;
    }

    fn commit(&mut self, items: Vec<CartItem>) -> Result<(), CartError> {
        let subtotal = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.total_price()))
            .ok_or(CartError::SubtotalOverflow)?;
        self.items = items;
        self.subtotal = subtotal;
        Ok(())
    }
}

impl Default for Cart {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("cart has no item at position {0}")]
    ItemNotFound(usize),
    #[error("cart subtotal is out of range")]
    SubtotalOverflow,
    #[error(transparent)]
    Pricing(#[from] PricingError),
}
