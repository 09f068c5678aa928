//! Interactive prediction session.
//!
//! The terminal counterpart of the original single-page form: both resources
//! are loaded before the first prompt, each round collects the eleven fields
//! with validation, and a prediction (or an inline error) ends the round
//! without ending the session. All I/O runs over generic reader/writer pairs
//! so sessions are scriptable in tests.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use log::debug;

use crate::{
    cli::UnknownLabel,
    codes::CodeTables,
    features::{self, RawInput},
    model::Model,
    predict,
    reference::ReferenceTable,
};

pub fn run_session<R, W>(
    input: &mut R,
    output: &mut W,
    reference: &ReferenceTable,
    tables: &CodeTables,
    model: &Model,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Car price prediction")?;
    writeln!(
        output,
        "Enter the details of your car to predict its resale price.\n"
    )?;

    loop {
        let raw = match collect_input(input, output, reference)? {
            Some(raw) => raw,
            None => break,
        };
        debug!("Collected form input: {raw:?}");

        // Choices come from the loaded domains, but a pinned codebook can
        // still lack a brand the reference data has.
        match features::assemble(&raw, tables, UnknownLabel::Reject)
            .and_then(|row| predict::invoke(model, &row))
        {
            Ok(prediction) => {
                writeln!(output, "\nEstimated price: {}", prediction.display_price())?;
            }
            Err(err) => {
                writeln!(output, "\nerror: {err}")?;
            }
        }

        match prompt_line(input, output, "\nPredict another? [y/N]: ")? {
            Some(answer) if matches!(answer.trim(), "y" | "Y" | "yes" | "Yes") => {
                writeln!(output)?;
            }
            _ => break,
        }
    }

    writeln!(output, "Goodbye.")?;
    Ok(())
}

fn collect_input<R, W>(
    input: &mut R,
    output: &mut W,
    reference: &ReferenceTable,
) -> Result<Option<RawInput>>
where
    R: BufRead,
    W: Write,
{
    macro_rules! field {
        ($expr:expr) => {
            match $expr? {
                Some(value) => value,
                None => return Ok(None),
            }
        };
    }

    let name = field!(prompt_choice(input, output, "Car brand", reference.brands()));
    let year = field!(prompt_number(input, output, "Manufacture year", 1994, 2024, 2020));
    let km_driven = field!(prompt_number(
        input,
        output,
        "Kilometers driven",
        11,
        200_000,
        50_000
    ));
    let fuel = field!(prompt_choice(input, output, "Fuel type", reference.fuels()));
    let seller_type = field!(prompt_choice(
        input,
        output,
        "Seller type",
        reference.seller_types()
    ));
    let transmission = field!(prompt_choice(
        input,
        output,
        "Transmission type",
        reference.transmissions()
    ));
    let owner = field!(prompt_choice(input, output, "Owner type", reference.owners()));
    let mileage = field!(prompt_number(input, output, "Mileage (km/l)", 10, 40, 15));
    let engine = field!(prompt_number(input, output, "Engine (CC)", 700, 5000, 1500));
    let max_power = field!(prompt_number(input, output, "Max power (bhp)", 0, 200, 100));
    let seats = field!(prompt_number(input, output, "Number of seats", 4, 10, 5));

    Ok(Some(RawInput {
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
    }))
}

/// Offer `options` as a numbered list; accept a 1-based number or an exact
/// label. Re-prompts on invalid input, returns `None` on end of input.
fn prompt_choice<R, W>(
    input: &mut R,
    output: &mut W,
    label: &str,
    options: &[String],
) -> Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{label}:")?;
    for (idx, option) in options.iter().enumerate() {
        writeln!(output, "  {}) {option}", idx + 1)?;
    }
    loop {
        let line = match prompt_line(input, output, &format!("Select [1-{}]: ", options.len()))? {
            Some(line) => line,
            None => return Ok(None),
        };
        let trimmed = line.trim();
        if let Ok(number) = trimmed.parse::<usize>()
            && (1..=options.len()).contains(&number)
        {
            return Ok(Some(options[number - 1].clone()));
        }
        if let Some(exact) = options.iter().find(|option| option.as_str() == trimmed) {
            return Ok(Some(exact.clone()));
        }
        writeln!(output, "Please pick one of the listed options.")?;
    }
}

/// Prompt for an integer in `[min, max]`; an empty line accepts `default`.
/// Re-prompts on invalid input, returns `None` on end of input.
fn prompt_number<R, W>(
    input: &mut R,
    output: &mut W,
    label: &str,
    min: u32,
    max: u32,
    default: u32,
) -> Result<Option<u32>>
where
    R: BufRead,
    W: Write,
{
    loop {
        let prompt = format!("{label} [{min}-{max}, default {default}]: ");
        let line = match prompt_line(input, output, &prompt)? {
            Some(line) => line,
            None => return Ok(None),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Some(default));
        }
        match trimmed.parse::<u32>() {
            Ok(value) if (min..=max).contains(&value) => return Ok(Some(value)),
            _ => {
                writeln!(output, "Enter a whole number between {min} and {max}.")?;
            }
        }
    }
}

/// Write a prompt and read one line. `None` means end of input.
fn prompt_line<R, W>(input: &mut R, output: &mut W, prompt: &str) -> Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    let read = input.read_line(&mut line).context("Reading form input")?;
    if read == 0 {
        writeln!(output)?;
        return Ok(None);
    }
    Ok(Some(line))
}
