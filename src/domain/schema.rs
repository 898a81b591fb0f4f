//! Validation of raw product documents
//!
//! Documents arrive from the store as untyped JSON. Every field is checked by
//! path so a failure names exactly what is wrong, and a caller either gets a
//! complete `Product` or an error, never something in between.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;
use crate::domain::aggregates::product::{
    Costs, DedicatedGraphics, Display, Processor, Product, ProductAddon, ProductSize, WholesaleInfo,
};
use crate::domain::value_objects::ClosedSet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field `{path}`: {kind}")]
pub struct ValidationError {
    pub path: String,
    pub kind: ValidationErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    NotAnObject,
    Missing,
    WrongType { expected: &'static str },
    NotAllowed { value: String, allowed: &'static [&'static str] },
    Rule(String),
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "expected an object"),
            Self::Missing => write!(f, "required field is missing"),
            Self::WrongType { expected } => write!(f, "expected {expected}"),
            Self::NotAllowed { value, allowed } => write!(f, "`{value}` is not one of {}", allowed.join(", ")),
            Self::Rule(rule) => write!(f, "{rule}"),
        }
    }
}

impl ValidationError {
    fn new(path: impl Into<String>, kind: ValidationErrorKind) -> Self { Self { path: path.into(), kind } }
}

type Result<T> = std::result::Result<T, ValidationError>;

/// Validate a raw product document, stamping `createdAt` with the current time when absent.
pub fn validate_product(raw: &Value) -> Result<Product> { validate_product_at(raw, Utc::now()) }

pub fn validate_product_at(raw: &Value, now: DateTime<Utc>) -> Result<Product> {
    let doc = Fields::root(raw)?;
    let product = Product {
        id: doc.required_str("id")?,
        name: doc.required_str("name")?,
        brand: doc.required_str("brand")?,
        category: doc.required_str("category")?,
        subcategory: doc.optional_str("subcategory")?,
        color: doc.required_str("color")?,
        size: doc.required_str("size")?,
        description: doc.required_str("description")?,
        images: doc.required_str_array("images")?,
        price: doc.required_decimal("price")?,
        special_offer: doc.optional_bool("specialOffer")?.unwrap_or(false),
        discount_percentage: doc.optional_decimal("discountPercentage")?,
        discount_price: doc.optional_decimal("discountPrice")?,
        offer_ends_at: doc.optional_str("offerEndsAt")?,
        availability: doc.optional_enum("availability")?,
        condition: doc.optional_enum("condition")?,
        is_archived: doc.required_bool("isArchived")?,
        created_at: doc.optional_str("createdAt")?.unwrap_or_else(|| now.to_rfc3339()),
        expiration_date: doc.optional_str("expirationDate")?,
        sizes: doc.optional_array("sizes", parse_size)?.unwrap_or_default(),
        addons: doc.optional_array("addons", parse_addon)?.unwrap_or_default(),
        costs: doc.optional_object("costs", parse_costs)?,
        processor: doc.optional_object("processor", parse_processor)?,
        dedicated_graphics: doc.optional_object("dedicatedGraphics", parse_graphics)?,
        display: doc.optional_object("display", parse_display)?,
        wholesale_info: doc.optional_object("wholesaleInfo", parse_wholesale)?,
    };
    check_rules(&product)?;
    Ok(product)
}

fn parse_size(f: &Fields) -> Result<ProductSize> {
    Ok(ProductSize {
        id: f.required_str("id")?,
        label: f.required_str("label")?,
        price: f.optional_decimal("price")?,
        extra_price: f.optional_decimal("extraPrice")?,
    })
}

fn parse_addon(f: &Fields) -> Result<ProductAddon> {
    Ok(ProductAddon {
        id: f.required_str("id")?,
        label: f.required_str("label")?,
        price_delta: f.required_decimal("price_delta")?,
    })
}

fn parse_costs(f: &Fields) -> Result<Costs> {
    Ok(Costs { base_cost: f.optional_decimal("base_cost")? })
}

fn parse_processor(f: &Fields) -> Result<Processor> {
    Ok(Processor {
        processor_name: f.optional_str("processorName")?,
        processor_brand: f.optional_enum("processorBrand")?,
        processor_generation: f.optional_str("processorGeneration")?,
        cache_memory: f.optional_f64("cacheMemory")?,
        base_clock_speed: f.optional_f64("baseClockSpeed")?,
        max_turbo_speed: f.optional_f64("maxTurboSpeed")?,
        cores: f.optional_u32("cores")?,
        threads: f.optional_u32("threads")?,
        integrated_gpu: f.optional_str("integratedGpu")?,
    })
}

fn parse_graphics(f: &Fields) -> Result<DedicatedGraphics> {
    Ok(DedicatedGraphics {
        has_dedicated_graphics: f.optional_bool("hasDedicatedGraphics")?,
        dedicated_gpu_brand: f.optional_enum("dedicatedGpuBrand")?,
        dedicated_gpu_model: f.optional_str("dedicatedGpuModel")?,
        vram: f.optional_u32("vram")?,
        memory_type: f.optional_str("memoryType")?,
        memory_speed: f.optional_f64("memorySpeed")?,
    })
}

fn parse_display(f: &Fields) -> Result<Display> {
    Ok(Display {
        size_inches: f.optional_f64("sizeInches")?,
        resolution: f.optional_str("resolution")?,
        refresh_rate: f.optional_u32("refreshRate")?,
        panel_type: f.optional_str("panelType")?,
        touch_screen: f.optional_bool("touchScreen")?,
    })
}

fn parse_wholesale(f: &Fields) -> Result<WholesaleInfo> {
    Ok(WholesaleInfo {
        supplier_name: f.optional_str("supplierName")?,
        supplier_phone: f.optional_str("supplierPhone")?,
        supplier_email: f.optional_str("supplierEmail")?,
        supplier_location: f.optional_str("supplierLocation")?,
        purchase_price: f.optional_decimal("purchasePrice")?,
        purchased_quantity: f.optional_u32("purchasedQuantity")?,
        current_quantity: f.optional_u32("currentQuantity")?,
        notes: f.optional_str("notes")?,
    })
}

/// Range rules declared on `Product` through `validator`.
fn check_rules(product: &Product) -> Result<()> {
    if let Err(errors) = product.validate() {
        let mut fields: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .map(|(name, errs)| {
                let rule = errs.first().map(|e| e.code.to_string()).unwrap_or_else(|| "invalid".to_string());
                (name.to_string(), rule)
            })
            .collect();
        fields.sort();
        if let Some((name, rule)) = fields.into_iter().next() {
            return Err(ValidationError::new(document_key(&name), ValidationErrorKind::Rule(rule)));
        }
    }
    if let Some(cost) = product.base_cost() {
        if cost < Decimal::ZERO {
            return Err(ValidationError::new("costs.base_cost", ValidationErrorKind::Rule("must not be negative".into())));
        }
    }
    Ok(())
}

fn document_key(field: &str) -> String {
    match field {
        "discount_percentage" => "discountPercentage".to_string(),
        "discount_price" => "discountPrice".to_string(),
        other => other.to_string(),
    }
}

/// Converts a JSON number to an exact decimal using its literal text.
pub(crate) fn decimal_from_number(n: &Number) -> Option<Decimal> {
    let text = n.to_string();
    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}

/// Field access into one JSON object, tracking the path for error messages.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> Fields<'a> {
    fn root(value: &'a Value) -> Result<Self> {
        Self::at(value, String::new())
    }

    fn at(value: &'a Value, prefix: String) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self { map, prefix }),
            _ => Err(ValidationError::new(if prefix.is_empty() { "$".to_string() } else { prefix }, ValidationErrorKind::NotAnObject)),
        }
    }

    fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() { key.to_string() } else { format!("{}.{}", self.prefix, key) }
    }

    /// `null` is treated the same as an absent key.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn require(&self, key: &str) -> Result<&'a Value> {
        self.get(key).ok_or_else(|| ValidationError::new(self.path(key), ValidationErrorKind::Missing))
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> ValidationError {
        ValidationError::new(self.path(key), ValidationErrorKind::WrongType { expected })
    }

    fn as_str(&self, key: &str, v: &Value) -> Result<String> {
        v.as_str().map(str::to_string).ok_or_else(|| self.wrong_type(key, "a string"))
    }

    fn as_decimal(&self, key: &str, v: &Value) -> Result<Decimal> {
        match v {
            Value::Number(n) => decimal_from_number(n).ok_or_else(|| self.wrong_type(key, "a finite number")),
            _ => Err(self.wrong_type(key, "a number")),
        }
    }

    fn required_str(&self, key: &str) -> Result<String> { self.as_str(key, self.require(key)?) }

    fn optional_str(&self, key: &str) -> Result<Option<String>> {
        self.get(key).map(|v| self.as_str(key, v)).transpose()
    }

    fn required_bool(&self, key: &str) -> Result<bool> {
        self.require(key)?.as_bool().ok_or_else(|| self.wrong_type(key, "a boolean"))
    }

    fn optional_bool(&self, key: &str) -> Result<Option<bool>> {
        self.get(key).map(|v| v.as_bool().ok_or_else(|| self.wrong_type(key, "a boolean"))).transpose()
    }

    fn required_decimal(&self, key: &str) -> Result<Decimal> { self.as_decimal(key, self.require(key)?) }

    fn optional_decimal(&self, key: &str) -> Result<Option<Decimal>> {
        self.get(key).map(|v| self.as_decimal(key, v)).transpose()
    }

    fn optional_f64(&self, key: &str) -> Result<Option<f64>> {
        self.get(key).map(|v| v.as_f64().ok_or_else(|| self.wrong_type(key, "a number"))).transpose()
    }

    fn optional_u32(&self, key: &str) -> Result<Option<u32>> {
        self.get(key)
            .map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok()).ok_or_else(|| self.wrong_type(key, "a non-negative integer")))
            .transpose()
    }

    fn optional_enum<E: ClosedSet>(&self, key: &str) -> Result<Option<E>> {
        let Some(v) = self.get(key) else { return Ok(None) };
        let raw = v.as_str().ok_or_else(|| self.wrong_type(key, "a string"))?;
        E::parse(raw).map(Some).ok_or_else(|| {
            ValidationError::new(self.path(key), ValidationErrorKind::NotAllowed { value: raw.to_string(), allowed: E::ALLOWED })
        })
    }

    fn required_str_array(&self, key: &str) -> Result<Vec<String>> {
        let items = self.require(key)?.as_array().ok_or_else(|| self.wrong_type(key, "an array"))?;
        items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    ValidationError::new(format!("{}[{}]", self.path(key), i), ValidationErrorKind::WrongType { expected: "a string" })
                })
            })
            .collect()
    }

    fn optional_array<T>(&self, key: &str, parse: fn(&Fields) -> Result<T>) -> Result<Option<Vec<T>>> {
        let Some(v) = self.get(key) else { return Ok(None) };
        let items = v.as_array().ok_or_else(|| self.wrong_type(key, "an array"))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| parse(&Fields::at(item, format!("{}[{}]", self.path(key), i))?))
            .collect::<Result<Vec<T>>>()
            .map(Some)
    }

    fn optional_object<T>(&self, key: &str, parse: fn(&Fields) -> Result<T>) -> Result<Option<T>> {
        self.get(key).map(|v| parse(&Fields::at(v, self.path(key))?)).transpose()
    }
}
