use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Predict used-car resale prices from a trained model artifact", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the categorical choices and codes derived from the reference data
    Choices(ChoicesArgs),
    /// Encode raw inputs into the numeric feature row without predicting
    Encode(EncodeArgs),
    /// Predict the resale price for one set of inputs
    Predict(PredictArgs),
    /// Interactive prompt session for repeated predictions
    Form(FormArgs),
    /// Export the brand code table as a versioned codebook artifact
    Codebook(CodebookArgs),
}

#[derive(Debug, Args)]
pub struct ChoicesArgs {
    /// Reference CSV with the known vehicle attributes
    #[arg(short = 'i', long = "data")]
    pub data: PathBuf,
    /// Pinned codebook to use for brand codes instead of re-deriving them
    #[arg(long)]
    pub codebook: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the reference file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct EncodeArgs {
    /// Reference CSV with the known vehicle attributes
    #[arg(short = 'i', long = "data")]
    pub data: PathBuf,
    /// Pinned codebook to use for brand codes instead of re-deriving them
    #[arg(long)]
    pub codebook: Option<PathBuf>,
    #[command(flatten)]
    pub vehicle: VehicleArgs,
    /// How to treat labels missing from the code tables
    #[arg(long = "on-unknown", value_enum, default_value = "reject")]
    pub on_unknown: UnknownLabel,
    /// Render the row as an aligned column/value table instead of CSV
    #[arg(long = "table")]
    pub table: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the reference file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Reference CSV with the known vehicle attributes
    #[arg(short = 'i', long = "data")]
    pub data: PathBuf,
    /// Trained model artifact
    #[arg(short = 'm', long = "model")]
    pub model: PathBuf,
    /// Pinned codebook to use for brand codes instead of re-deriving them
    #[arg(long)]
    pub codebook: Option<PathBuf>,
    #[command(flatten)]
    pub vehicle: VehicleArgs,
    /// How to treat labels missing from the code tables
    #[arg(long = "on-unknown", value_enum, default_value = "reject")]
    pub on_unknown: UnknownLabel,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the reference file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct FormArgs {
    /// Reference CSV with the known vehicle attributes
    #[arg(short = 'i', long = "data")]
    pub data: PathBuf,
    /// Trained model artifact
    #[arg(short = 'm', long = "model")]
    pub model: PathBuf,
    /// Pinned codebook to use for brand codes instead of re-deriving them
    #[arg(long)]
    pub codebook: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the reference file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CodebookArgs {
    /// Reference CSV with the known vehicle attributes
    #[arg(short = 'i', long = "data")]
    pub data: PathBuf,
    /// Destination codebook file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the reference file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

/// The eleven raw vehicle fields. Numeric ranges mirror the input controls
/// the model was trained against and are enforced here, at the boundary.
#[derive(Debug, Args)]
pub struct VehicleArgs {
    /// Car brand (one of the brands listed by `choices`)
    #[arg(long)]
    pub brand: String,
    /// Manufacture year
    #[arg(long, default_value_t = 2020, value_parser = clap::value_parser!(u32).range(1994..=2024))]
    pub year: u32,
    /// Kilometers driven
    #[arg(long = "km-driven", default_value_t = 50000, value_parser = clap::value_parser!(u32).range(11..=200_000))]
    pub km_driven: u32,
    /// Fuel type (Diesel, Petrol, LPG, CNG)
    #[arg(long)]
    pub fuel: String,
    /// Seller type (Individual, Dealer, Trustmark Dealer)
    #[arg(long = "seller-type")]
    pub seller_type: String,
    /// Transmission type (Manual, Automatic)
    #[arg(long)]
    pub transmission: String,
    /// Owner category (First Owner .. Test Drive Car)
    #[arg(long)]
    pub owner: String,
    /// Mileage in km/l
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(10..=40))]
    pub mileage: u32,
    /// Engine displacement in CC
    #[arg(long, default_value_t = 1500, value_parser = clap::value_parser!(u32).range(700..=5000))]
    pub engine: u32,
    /// Maximum power in bhp
    #[arg(long = "max-power", default_value_t = 100, value_parser = clap::value_parser!(u32).range(0..=200))]
    pub max_power: u32,
    /// Number of seats
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(4..=10))]
    pub seats: u32,
}

/// Policy for categorical labels that have no entry in their code table.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum UnknownLabel {
    /// Fail before inference with an encoding error
    Reject,
    /// Encode the label as a missing value (NaN) and let the model see it
    Missing,
}

impl Default for UnknownLabel {
    fn default() -> Self {
        UnknownLabel::Reject
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
