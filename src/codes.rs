//! Categorical code tables.
//!
//! The four fixed tables (owner, fuel, seller type, transmission) are the
//! exact label-to-code assignments the model was trained against. The brand
//! table is derived from the reference dataset: distinct normalized brands,
//! sorted lexicographically ascending, coded 1..N. Because a re-derived
//! brand table silently shifts whenever the reference data changes, the
//! table can also be persisted as a versioned, fingerprinted codebook
//! artifact and pinned at inference time.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{error::PriceError, reference::ReferenceTable};

const CODEBOOK_VERSION: u32 = 1;

pub const OWNER_CODES: [(&str, i64); 5] = [
    ("First Owner", 1),
    ("Second Owner", 2),
    ("Third Owner", 3),
    ("Fourth & Above Owner", 4),
    ("Test Drive Car", 5),
];

pub const FUEL_CODES: [(&str, i64); 4] =
    [("Diesel", 1), ("Petrol", 2), ("LPG", 3), ("CNG", 4)];

pub const SELLER_CODES: [(&str, i64); 3] =
    [("Individual", 1), ("Dealer", 2), ("Trustmark Dealer", 3)];

pub const TRANSMISSION_CODES: [(&str, i64); 2] = [("Manual", 1), ("Automatic", 2)];

/// The five categorical feature positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Brand,
    Fuel,
    SellerType,
    Transmission,
    Owner,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Brand => "brand",
            Category::Fuel => "fuel",
            Category::SellerType => "seller type",
            Category::Transmission => "transmission",
            Category::Owner => "owner",
        }
    }
}

/// Label-to-code lookup for all five categorical features.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeTables {
    brands: BTreeMap<String, i64>,
    fingerprint: String,
}

impl CodeTables {
    /// Derive the brand table from the loaded reference data: distinct
    /// brands sorted ascending, codes assigned 1..N in that order.
    pub fn from_reference(reference: &ReferenceTable) -> Self {
        let brands: BTreeMap<String, i64> = reference
            .brands()
            .iter()
            .enumerate()
            .map(|(idx, brand)| (brand.clone(), idx as i64 + 1))
            .collect();
        let fingerprint = fingerprint_brands(&brands);
        CodeTables { brands, fingerprint }
    }

    /// Look up the code for a raw label. `None` means the label is outside
    /// the table's vocabulary; the caller decides whether that is an error
    /// or a missing value.
    pub fn encode(&self, category: Category, label: &str) -> Option<i64> {
        match category {
            Category::Brand => self.brands.get(label).copied(),
            Category::Fuel => fixed_lookup(&FUEL_CODES, label),
            Category::SellerType => fixed_lookup(&SELLER_CODES, label),
            Category::Transmission => fixed_lookup(&TRANSMISSION_CODES, label),
            Category::Owner => fixed_lookup(&OWNER_CODES, label),
        }
    }

    pub fn brand_count(&self) -> usize {
        self.brands.len()
    }

    /// Brand entries in code order (which is also lexicographic order).
    pub fn brand_entries(&self) -> impl Iterator<Item = (&str, i64)> {
        self.brands.iter().map(|(brand, code)| (brand.as_str(), *code))
    }

    /// SHA-256 over the (brand, code) pairs; stable identity for pinning.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Persist the brand table as a versioned codebook artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let artifact = Codebook {
            version: CODEBOOK_VERSION,
            fingerprint: self.fingerprint.clone(),
            brands: self.brands.clone(),
        };
        let file =
            File::create(path).with_context(|| format!("Creating codebook file {path:?}"))?;
        serde_json::to_writer_pretty(file, &artifact).context("Writing codebook JSON")
    }

    /// Load a pinned codebook, re-deriving its fingerprint and re-checking
    /// that codes form a contiguous 1..N range.
    pub fn load(path: &Path) -> Result<Self, PriceError> {
        let file = File::open(path).map_err(|err| PriceError::resource(path, err.to_string()))?;
        let artifact: Codebook = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| PriceError::resource(path, format!("malformed codebook: {err}")))?;

        if artifact.version != CODEBOOK_VERSION {
            return Err(PriceError::resource(
                path,
                format!(
                    "unsupported codebook version {} (expected {CODEBOOK_VERSION})",
                    artifact.version
                ),
            ));
        }

        let mut codes: Vec<i64> = artifact.brands.values().copied().collect();
        codes.sort_unstable();
        let contiguous = codes
            .iter()
            .enumerate()
            .all(|(idx, code)| *code == idx as i64 + 1);
        if !contiguous {
            return Err(PriceError::resource(
                path,
                "brand codes are not a contiguous 1..N range",
            ));
        }

        let fingerprint = fingerprint_brands(&artifact.brands);
        if fingerprint != artifact.fingerprint {
            return Err(PriceError::resource(
                path,
                "fingerprint mismatch: codebook contents were altered",
            ));
        }

        Ok(CodeTables {
            brands: artifact.brands,
            fingerprint,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Codebook {
    version: u32,
    fingerprint: String,
    brands: BTreeMap<String, i64>,
}

fn fixed_lookup(table: &[(&str, i64)], label: &str) -> Option<i64> {
    table
        .iter()
        .find(|(entry, _)| *entry == label)
        .map(|(_, code)| *code)
}

fn fingerprint_brands(brands: &BTreeMap<String, i64>) -> String {
    let mut hasher = Sha256::new();
    for (brand, code) in brands {
        hasher.update(brand.as_bytes());
        hasher.update(b":");
        hasher.update(code.to_string().as_bytes());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables_for(brands: &[&str]) -> CodeTables {
        let brands: BTreeMap<String, i64> = brands
            .iter()
            .enumerate()
            .map(|(idx, brand)| (brand.to_string(), idx as i64 + 1))
            .collect();
        let fingerprint = fingerprint_brands(&brands);
        CodeTables { brands, fingerprint }
    }

    #[test]
    fn fixed_tables_match_the_training_assignments() {
        let tables = tables_for(&[]);
        assert_eq!(tables.encode(Category::Owner, "First Owner"), Some(1));
        assert_eq!(tables.encode(Category::Owner, "Second Owner"), Some(2));
        assert_eq!(tables.encode(Category::Owner, "Third Owner"), Some(3));
        assert_eq!(
            tables.encode(Category::Owner, "Fourth & Above Owner"),
            Some(4)
        );
        assert_eq!(tables.encode(Category::Owner, "Test Drive Car"), Some(5));

        assert_eq!(tables.encode(Category::Fuel, "Diesel"), Some(1));
        assert_eq!(tables.encode(Category::Fuel, "Petrol"), Some(2));
        assert_eq!(tables.encode(Category::Fuel, "LPG"), Some(3));
        assert_eq!(tables.encode(Category::Fuel, "CNG"), Some(4));

        assert_eq!(tables.encode(Category::SellerType, "Individual"), Some(1));
        assert_eq!(tables.encode(Category::SellerType, "Dealer"), Some(2));
        assert_eq!(
            tables.encode(Category::SellerType, "Trustmark Dealer"),
            Some(3)
        );

        assert_eq!(tables.encode(Category::Transmission, "Manual"), Some(1));
        assert_eq!(tables.encode(Category::Transmission, "Automatic"), Some(2));
    }

    #[test]
    fn unknown_labels_return_none() {
        let tables = tables_for(&["Maruti"]);
        assert_eq!(tables.encode(Category::Fuel, "Hydrogen"), None);
        assert_eq!(tables.encode(Category::Brand, "DeLorean"), None);
        assert_eq!(tables.encode(Category::Owner, "first owner"), None);
    }

    #[test]
    fn brand_codes_are_dense_and_sorted() {
        let tables = tables_for(&["Audi", "BMW", "Maruti", "Tata"]);
        let entries: Vec<(&str, i64)> = tables.brand_entries().collect();
        assert_eq!(
            entries,
            vec![("Audi", 1), ("BMW", 2), ("Maruti", 3), ("Tata", 4)]
        );
    }

    #[test]
    fn codebook_round_trips_and_detects_tampering() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("brands.codebook.json");
        let tables = tables_for(&["Audi", "BMW", "Maruti"]);
        tables.save(&path).expect("save codebook");

        let loaded = CodeTables::load(&path).expect("load codebook");
        assert_eq!(loaded, tables);

        // Flip one code; the stored fingerprint no longer matches.
        let text = std::fs::read_to_string(&path).expect("read codebook");
        let tampered = text.replace("\"Maruti\": 3", "\"Maruti\": 9");
        assert_ne!(text, tampered);
        std::fs::write(&path, tampered).expect("write tampered");
        let err = CodeTables::load(&path).expect_err("tampered codebook must fail");
        assert!(matches!(err, PriceError::ResourceUnavailable { .. }));
    }
}
