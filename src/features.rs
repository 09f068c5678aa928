//! Feature row assembly.
//!
//! Takes the eleven raw field values, encodes the five categoricals through
//! the code tables, passes the six numerics through unchanged, and emits the
//! row in the exact column order the model was trained on. Numeric range
//! enforcement belongs to the input boundary (CLI parsers and form prompts),
//! not here.

use crate::{
    cli::UnknownLabel,
    codes::{Category, CodeTables},
    error::PriceError,
};

/// Model column order. The artifact's feature list must match this exactly.
pub const FEATURE_COLUMNS: [&str; 11] = [
    "name",
    "year",
    "km_driven",
    "fuel",
    "seller_type",
    "transmission",
    "owner",
    "mileage",
    "engine",
    "max_power",
    "seats",
];

/// The eleven raw inputs as collected from the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInput {
    pub name: String,
    pub year: u32,
    pub km_driven: u32,
    pub fuel: String,
    pub seller_type: String,
    pub transmission: String,
    pub owner: String,
    pub mileage: u32,
    pub engine: u32,
    pub max_power: u32,
    pub seats: u32,
}

/// An encoded 11-column numeric row, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow([f64; 11]);

impl FeatureRow {
    pub fn values(&self) -> &[f64; 11] {
        &self.0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Encode `raw` into a feature row.
///
/// An out-of-vocabulary label either aborts assembly (`UnknownLabel::Reject`)
/// or lands as NaN in its slot (`UnknownLabel::Missing`), per the configured
/// policy.
pub fn assemble(
    raw: &RawInput,
    tables: &CodeTables,
    policy: UnknownLabel,
) -> Result<FeatureRow, PriceError> {
    let name = encode(tables, Category::Brand, &raw.name, policy)?;
    let fuel = encode(tables, Category::Fuel, &raw.fuel, policy)?;
    let seller_type = encode(tables, Category::SellerType, &raw.seller_type, policy)?;
    let transmission = encode(tables, Category::Transmission, &raw.transmission, policy)?;
    let owner = encode(tables, Category::Owner, &raw.owner, policy)?;

    Ok(FeatureRow([
        name,
        f64::from(raw.year),
        f64::from(raw.km_driven),
        fuel,
        seller_type,
        transmission,
        owner,
        f64::from(raw.mileage),
        f64::from(raw.engine),
        f64::from(raw.max_power),
        f64::from(raw.seats),
    ]))
}

fn encode(
    tables: &CodeTables,
    category: Category,
    label: &str,
    policy: UnknownLabel,
) -> Result<f64, PriceError> {
    match tables.encode(category, label) {
        Some(code) => Ok(code as f64),
        None => match policy {
            UnknownLabel::Reject => Err(PriceError::EncodingMiss {
                category: category.as_str(),
                label: label.to_string(),
            }),
            UnknownLabel::Missing => Ok(f64::NAN),
        },
    }
}
