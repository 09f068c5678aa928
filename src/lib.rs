pub mod cli;
pub mod codes;
pub mod error;
pub mod features;
pub mod form;
pub mod io_utils;
pub mod model;
pub mod predict;
pub mod reference;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, ChoicesArgs, CodebookArgs, Commands, EncodeArgs, FormArgs, PredictArgs, VehicleArgs},
    codes::{Category, CodeTables},
    error::PriceError,
    features::{FEATURE_COLUMNS, RawInput},
    model::Model,
    reference::ReferenceTable,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("autoprice", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Choices(args) => handle_choices(&args),
        Commands::Encode(args) => handle_encode(&args),
        Commands::Predict(args) => handle_predict(&args),
        Commands::Form(args) => handle_form(&args),
        Commands::Codebook(args) => handle_codebook(&args),
    }
}

fn handle_choices(args: &ChoicesArgs) -> Result<()> {
    let reference = load_reference(&args.data, args.delimiter, args.input_encoding.as_deref())?;
    let tables = load_tables(&reference, args.codebook.as_deref())?;

    let headers = vec![
        "category".to_string(),
        "label".to_string(),
        "code".to_string(),
    ];
    let mut rows = Vec::new();
    for (brand, code) in tables.brand_entries() {
        rows.push(vec!["brand".to_string(), brand.to_string(), code.to_string()]);
    }
    push_category_rows(&mut rows, &tables, Category::Fuel, reference.fuels());
    push_category_rows(&mut rows, &tables, Category::SellerType, reference.seller_types());
    push_category_rows(&mut rows, &tables, Category::Transmission, reference.transmissions());
    push_category_rows(&mut rows, &tables, Category::Owner, reference.owners());

    table::print_table(&headers, &rows);
    Ok(())
}

fn push_category_rows(
    rows: &mut Vec<Vec<String>>,
    tables: &CodeTables,
    category: Category,
    labels: &[String],
) {
    for label in labels {
        let code = tables
            .encode(category, label)
            .map(|code| code.to_string())
            .unwrap_or_default();
        rows.push(vec![category.as_str().to_string(), label.clone(), code]);
    }
}

fn handle_encode(args: &EncodeArgs) -> Result<()> {
    let reference = load_reference(&args.data, args.delimiter, args.input_encoding.as_deref())?;
    let tables = load_tables(&reference, args.codebook.as_deref())?;
    let raw = raw_input(&args.vehicle);
    let row = features::assemble(&raw, &tables, args.on_unknown)?;

    if args.table {
        let headers = vec!["column".to_string(), "value".to_string()];
        let rows: Vec<Vec<String>> = FEATURE_COLUMNS
            .iter()
            .zip(row.values().iter())
            .map(|(column, value)| vec![column.to_string(), format_feature_value(*value)])
            .collect();
        table::print_table(&headers, &rows);
    } else {
        let line = row
            .values()
            .iter()
            .map(|value| format_feature_value(*value))
            .join(",");
        println!("{line}");
    }
    Ok(())
}

fn handle_predict(args: &PredictArgs) -> Result<()> {
    let reference = load_reference(&args.data, args.delimiter, args.input_encoding.as_deref())?;
    let tables = load_tables(&reference, args.codebook.as_deref())?;
    let model = load_model(&args.model)?;

    let raw = raw_input(&args.vehicle);
    let row = features::assemble(&raw, &tables, args.on_unknown)?;
    let prediction = predict::invoke(&model, &row)?;
    info!(
        "Predicted price {:.2} for brand '{}'",
        prediction.price, raw.name
    );
    println!("Estimated price: {}", prediction.display_price());
    Ok(())
}

fn handle_form(args: &FormArgs) -> Result<()> {
    // Both resources load before the first prompt; a failure here means no
    // form is ever rendered.
    let reference = load_reference(&args.data, args.delimiter, args.input_encoding.as_deref())?;
    let tables = load_tables(&reference, args.codebook.as_deref())?;
    let model = load_model(&args.model)?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    form::run_session(
        &mut stdin.lock(),
        &mut stdout.lock(),
        &reference,
        &tables,
        &model,
    )
}

fn handle_codebook(args: &CodebookArgs) -> Result<()> {
    let reference = load_reference(&args.data, args.delimiter, args.input_encoding.as_deref())?;
    let tables = CodeTables::from_reference(&reference);
    tables
        .save(&args.output)
        .with_context(|| format!("Writing codebook to {:?}", args.output))?;
    info!(
        "Codebook with {} brand(s) written to {:?} (fingerprint {})",
        tables.brand_count(),
        args.output,
        tables.fingerprint()
    );
    Ok(())
}

fn load_reference(
    path: &Path,
    delimiter: Option<u8>,
    encoding_label: Option<&str>,
) -> Result<ReferenceTable> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let encoding = io_utils::resolve_encoding(encoding_label)?;
    let reference = ReferenceTable::load(path, delimiter, encoding)?;
    info!(
        "Loaded reference data from {:?}: {} row(s), {} brand(s)",
        path,
        reference.row_count(),
        reference.brands().len()
    );
    Ok(reference)
}

fn load_tables(reference: &ReferenceTable, codebook: Option<&Path>) -> Result<CodeTables> {
    match codebook {
        Some(path) => {
            let tables = CodeTables::load(path)?;
            info!(
                "Pinned brand codes from codebook {:?} ({} brand(s), fingerprint {})",
                path,
                tables.brand_count(),
                tables.fingerprint()
            );
            Ok(tables)
        }
        None => Ok(CodeTables::from_reference(reference)),
    }
}

fn load_model(path: &Path) -> Result<Model> {
    let model = Model::load(path)?;
    if !model
        .feature_names()
        .iter()
        .map(|name| name.as_str())
        .eq(FEATURE_COLUMNS)
    {
        return Err(PriceError::resource(
            path,
            "artifact feature list does not match the expected column order",
        )
        .into());
    }
    info!(
        "Loaded model artifact {:?} ({} feature(s))",
        path,
        model.feature_count()
    );
    Ok(model)
}

fn raw_input(vehicle: &VehicleArgs) -> RawInput {
    RawInput {
        name: vehicle.brand.clone(),
        year: vehicle.year,
        km_driven: vehicle.km_driven,
        fuel: vehicle.fuel.clone(),
        seller_type: vehicle.seller_type.clone(),
        transmission: vehicle.transmission.clone(),
        owner: vehicle.owner.clone(),
        mileage: vehicle.mileage,
        engine: vehicle.engine,
        max_power: vehicle.max_power,
        seats: vehicle.seats,
    }
}

/// Integer-valued features print without a decimal point; a missing code
/// prints as an empty field.
fn format_feature_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_values_render_like_csv_fields() {
        assert_eq!(format_feature_value(7.0), "7");
        assert_eq!(format_feature_value(2020.0), "2020");
        assert_eq!(format_feature_value(f64::NAN), "");
    }
}
