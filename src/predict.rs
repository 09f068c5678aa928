use crate::{error::PriceError, features::FeatureRow, model::Model};

/// A successful inference result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub price: f64,
}

impl Prediction {
    pub fn display_price(&self) -> String {
        format_price(self.price)
    }
}

/// Invoke the model on an assembled row.
///
/// This is the only boundary where inference faults are caught: shape
/// mismatches, malformed regressors, and non-finite outputs (a NaN feature
/// reaching the model under the lenient unknown-label policy) all surface as
/// `PredictionFailure` with a human-readable message.
pub fn invoke(model: &Model, row: &FeatureRow) -> Result<Prediction, PriceError> {
    let price = model.predict(row.as_slice())?;
    if !price.is_finite() {
        return Err(PriceError::PredictionFailure(format!(
            "model returned a non-finite price ({price})"
        )));
    }
    Ok(Prediction { price })
}

/// Currency-style formatting: two decimals, thousands grouping.
pub fn format_price(price: f64) -> String {
    let negative = price < 0.0;
    let cents = (price.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}
