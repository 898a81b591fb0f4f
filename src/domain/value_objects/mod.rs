//! Value Objects for the catalog

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quantity of a cart line. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value <= 0 { return Err(QuantityError::NotPositive(value)); }
        u32::try_from(value).map(Self).map_err(|_| QuantityError::TooLarge(value))
    }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
    pub fn as_decimal(&self) -> Decimal { Decimal::from(self.0) }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;
    fn try_from(value: i64) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self { q.0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity must be a positive integer, got {0}")]
    NotPositive(i64),
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// A field restricted to a fixed set of string values.
pub trait ClosedSet: Sized {
    const ALLOWED: &'static [&'static str];
    fn parse(raw: &str) -> Option<Self>;
}

macro_rules! closed_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self { $(Self::$variant => $label),+ }
            }
        }

        impl ClosedSet for $name {
            const ALLOWED: &'static [&'static str] = &[$($label),+];
            fn parse(raw: &str) -> Option<Self> {
                match raw { $($label => Some(Self::$variant),)+ _ => None }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as ClosedSet>::parse(s).ok_or_else(|| UnknownVariant(s.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value `{0}`")]
pub struct UnknownVariant(pub String);

closed_set!(
    /// CPU vendor
    ProcessorBrand { Intel => "Intel", Amd => "AMD", Apple => "Apple", Qualcomm => "Qualcomm" }
);

closed_set!(
    /// Dedicated GPU vendor
    GpuBrand { Nvidia => "NVIDIA", Amd => "AMD", Intel => "Intel" }
);

closed_set!(
    /// Offer availability, mirrors the structured-data offer vocabulary
    Availability { InStock => "InStock", OutOfStock => "OutOfStock", PreOrder => "PreOrder", Discontinued => "Discontinued" }
);

closed_set!(
    /// Item condition of an offer
    Condition { New => "New", Used => "Used", Refurbished => "Refurbished" }
);
