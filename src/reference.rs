//! Reference dataset loader.
//!
//! The reference CSV is consumed for exactly one purpose: enumerating the
//! categorical domains offered to the user (brand, fuel, seller type,
//! transmission, owner). The `name` column is normalized to its brand token
//! once, before any distinct-value extraction, and the loaded table is
//! immutable afterwards. Any load problem (missing file, undecodable bytes,
//! missing columns) is fatal to the session.

use std::{collections::BTreeSet, path::Path};

use encoding_rs::Encoding;
use log::debug;

use crate::{error::PriceError, io_utils};

/// Columns the reference resource must carry, in feature order.
pub const REQUIRED_COLUMNS: [&str; 11] = [
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

/// Distinct categorical domains extracted from the reference dataset.
///
/// Each domain is sorted lexicographically ascending and deduplicated.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    brands: Vec<String>,
    fuels: Vec<String>,
    seller_types: Vec<String>,
    transmissions: Vec<String>,
    owners: Vec<String>,
    row_count: usize,
}

impl ReferenceTable {
    pub fn load(
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<Self, PriceError> {
        let mut reader = io_utils::open_csv_reader(path, delimiter)
            .map_err(|err| PriceError::resource(path, err.to_string()))?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .map_err(|err| PriceError::resource(path, err.to_string()))?;

        let mut column_at = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, required) in REQUIRED_COLUMNS.iter().enumerate() {
            match headers.iter().position(|h| h == required) {
                Some(idx) => column_at[slot] = idx,
                None => {
                    return Err(PriceError::resource(
                        path,
                        format!("missing required column '{required}'"),
                    ));
                }
            }
        }
        let name_idx = column_at[0];
        let fuel_idx = column_at[3];
        let seller_idx = column_at[4];
        let transmission_idx = column_at[5];
        let owner_idx = column_at[6];

        let mut brands = BTreeSet::new();
        let mut fuels = BTreeSet::new();
        let mut seller_types = BTreeSet::new();
        let mut transmissions = BTreeSet::new();
        let mut owners = BTreeSet::new();
        let mut row_count = 0usize;

        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record
                .map_err(|err| PriceError::resource(path, format!("row {}: {err}", row_idx + 2)))?;
            let decoded = io_utils::decode_record(&record, encoding)
                .map_err(|err| PriceError::resource(path, format!("row {}: {err}", row_idx + 2)))?;

            let brand = normalize_brand(field(&decoded, name_idx));
            if !brand.is_empty() {
                brands.insert(brand.to_string());
            }
            insert_label(&mut fuels, field(&decoded, fuel_idx));
            insert_label(&mut seller_types, field(&decoded, seller_idx));
            insert_label(&mut transmissions, field(&decoded, transmission_idx));
            insert_label(&mut owners, field(&decoded, owner_idx));
            row_count += 1;
        }

        debug!(
            "Reference data {path:?}: {row_count} row(s), {} brand(s)",
            brands.len()
        );

        Ok(ReferenceTable {
            brands: brands.into_iter().collect(),
            fuels: fuels.into_iter().collect(),
            seller_types: seller_types.into_iter().collect(),
            transmissions: transmissions.into_iter().collect(),
            owners: owners.into_iter().collect(),
            row_count,
        })
    }

    pub fn brands(&self) -> &[String] {
        &self.brands
    }

    pub fn fuels(&self) -> &[String] {
        &self.fuels
    }

    pub fn seller_types(&self) -> &[String] {
        &self.seller_types
    }

    pub fn transmissions(&self) -> &[String] {
        &self.transmissions
    }

    pub fn owners(&self) -> &[String] {
        &self.owners
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

/// Reduce a free-text vehicle name to its manufacturer token: the first
/// whitespace-delimited word, trimmed. Idempotent.
pub fn normalize_brand(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or_default()
}

fn field(record: &[String], idx: usize) -> &str {
    record.get(idx).map(|s| s.as_str()).unwrap_or("")
}

fn insert_label(domain: &mut BTreeSet<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        domain.insert(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_brand_takes_first_token() {
        assert_eq!(normalize_brand("Maruti Swift Dzire VDI"), "Maruti");
        assert_eq!(normalize_brand("  Hyundai i20 Sportz"), "Hyundai");
        assert_eq!(normalize_brand("BMW"), "BMW");
        assert_eq!(normalize_brand(""), "");
        assert_eq!(normalize_brand("   "), "");
    }

    #[test]
    fn normalize_brand_is_idempotent() {
        for name in ["Maruti Swift Dzire VDI", "Tata Nexon XZ", "Skoda"] {
            let once = normalize_brand(name);
            assert_eq!(normalize_brand(once), once);
        }
    }
}
