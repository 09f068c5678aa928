use std::path::PathBuf;

use proptest::prelude::*;
use proptest::sample::select;

use autoprice::{
    cli::UnknownLabel,
    codes::{Category, CodeTables},
    features::{self, RawInput},
    reference::ReferenceTable,
};

fn fixture_reference() -> ReferenceTable {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("cardetails.csv");
    ReferenceTable::load(&path, b',', encoding_rs::UTF_8).expect("load reference")
}

fn arb_raw_input(reference: ReferenceTable) -> impl Strategy<Value = RawInput> {
    let categoricals = (
        select(reference.brands().to_vec()),
        select(reference.fuels().to_vec()),
        select(reference.seller_types().to_vec()),
        select(reference.transmissions().to_vec()),
        select(reference.owners().to_vec()),
    );
    let numerics = (
        1994u32..=2024,
        11u32..=200_000,
        10u32..=40,
        700u32..=5000,
        0u32..=200,
        4u32..=10,
    );
    (categoricals, numerics).prop_map(
        |(
            (name, fuel, seller_type, transmission, owner),
            (year, km_driven, mileage, engine, max_power, seats),
        )| RawInput {
            name,
            year,
            km_driven,
            fuel,
            seller_type,
            transmission,
            owner,
            mileage,
            engine,
            max_power,
            seats,
        },
    )
}

#[test]
fn brand_codes_are_contiguous_and_lexicographic() {
    let reference = fixture_reference();
    let tables = CodeTables::from_reference(&reference);
    let entries: Vec<(String, i64)> = tables
        .brand_entries()
        .map(|(brand, code)| (brand.to_string(), code))
        .collect();

    assert_eq!(entries.len(), reference.brands().len());
    let mut sorted = entries.clone();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(entries, sorted);
    for (idx, (_, code)) in entries.iter().enumerate() {
        assert_eq!(*code, idx as i64 + 1);
    }
}

proptest! {
    #[test]
    fn assemble_is_a_pure_function(raw in arb_raw_input(fixture_reference())) {
        let reference = fixture_reference();
        let tables = CodeTables::from_reference(&reference);
        let first = features::assemble(&raw, &tables, UnknownLabel::Reject).expect("assemble");
        let second = features::assemble(&raw, &tables, UnknownLabel::Reject).expect("assemble");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn rows_keep_the_fixed_column_order(raw in arb_raw_input(fixture_reference())) {
        let reference = fixture_reference();
        let tables = CodeTables::from_reference(&reference);
        let row = features::assemble(&raw, &tables, UnknownLabel::Reject).expect("assemble");
        let values = row.values();

        prop_assert_eq!(values.len(), 11);
        prop_assert_eq!(values[0], tables.encode(Category::Brand, &raw.name).unwrap() as f64);
        prop_assert_eq!(values[1], f64::from(raw.year));
        prop_assert_eq!(values[2], f64::from(raw.km_driven));
        prop_assert_eq!(values[3], tables.encode(Category::Fuel, &raw.fuel).unwrap() as f64);
        prop_assert_eq!(
            values[4],
            tables.encode(Category::SellerType, &raw.seller_type).unwrap() as f64
        );
        prop_assert_eq!(
            values[5],
            tables.encode(Category::Transmission, &raw.transmission).unwrap() as f64
        );
        prop_assert_eq!(values[6], tables.encode(Category::Owner, &raw.owner).unwrap() as f64);
        prop_assert_eq!(values[7], f64::from(raw.mileage));
        prop_assert_eq!(values[8], f64::from(raw.engine));
        prop_assert_eq!(values[9], f64::from(raw.max_power));
        prop_assert_eq!(values[10], f64::from(raw.seats));
    }
}
