//! Rendering and weight derivation for recipe ingredient quantities.

mod entry;
mod error;
mod fraction;
mod unit;

use std::fmt;

use serde::{Serialize, Serializer};

pub use entry::QuantityEntry;
pub use error::QuantityError;
pub use fraction::MixedNumber;
pub use unit::{Measure, Unit};

/// A derived mass in grams, rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Weight(f64);

impl Weight {
    pub fn from_grams(grams: f64) -> Self {
        Self((grams * 100.0).round() / 100.0)
    }

    pub fn grams(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_decimal(self.0))
    }
}

impl Serialize for Weight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

/// Largest amount a quantity may hold.
pub const MAX_AMOUNT: f64 = 1e9;

/// Check that an amount is usable as a quantity.
pub fn validate_amount(amount: f64) -> Result<f64, QuantityError> {
    if amount.is_finite() && (0.0..=MAX_AMOUNT).contains(&amount) {
        Ok(amount)
    } else {
        Err(QuantityError::InvalidAmount(amount))
    }
}

/// Check that a density is usable for weight derivation.
pub fn validate_density(density: f64) -> Result<f64, QuantityError> {
    if density.is_finite() && density > 0.0 {
        Ok(density)
    } else {
        Err(QuantityError::InvalidDensity(density))
    }
}

/// Render an amount as a whole or mixed number.
///
/// Returns `None` when there is nothing to show: zero, negative or
/// non-finite amounts.
pub fn format_amount(amount: f64) -> Option<String> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    match MixedNumber::approximate(amount) {
        Some(mixed) if mixed.is_zero() => Some(render_small(amount)),
        Some(mixed) => Some(mixed.to_string()),
        // Past the whole-number range.
        None => Some(render_decimal(amount)),
    }
}

/// Two significant digits for amounts below the smallest kitchen fraction:
/// `0.001`, `0.0012`.
fn render_small(value: f64) -> String {
    let digits = (1.0 - value.log10().floor()).max(1.0) as usize;
    let rendered = format!("{value:.digits$}");
    rendered.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// At most two decimals, without trailing zeros: `250`, `12.5`, `0.01`.
fn render_decimal(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        return format!("{rounded:.0}");
    }
    format!("{rounded:.2}").trim_end_matches('0').to_string()
}

/// Human-readable rendering of a quantity, e.g. `"2 1/2 cups flour"`.
///
/// Without an amount the result is just the ingredient name.
pub fn format(amount: Option<f64>, unit: Option<&str>, ingredient_name: &str) -> String {
    let Some(rendered) = amount.and_then(format_amount) else {
        return ingredient_name.to_string();
    };

    let mut parts = vec![rendered.as_str()];
    if let Some(unit) = unit.map(str::trim).filter(|u| !u.is_empty()) {
        parts.push(unit);
    }
    parts.push(ingredient_name);
    parts.join(" ")
}

/// Derive the mass in grams of a quantity.
///
/// Absent when the density is unknown, or when there is no amount or unit to
/// convert. Fails with [`QuantityError::UnknownUnit`] when a density is known
/// but the unit is not in the conversion table.
pub fn weight(
    amount: Option<f64>,
    unit: Option<&str>,
    density: Option<f64>,
) -> Result<Option<Weight>, QuantityError> {
    let Some(density) = density else {
        return Ok(None);
    };
    let Some(unit) = unit.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    let unit: Unit = unit.parse()?;
    let Some(amount) = amount else {
        return Ok(None);
    };

    Ok(Some(Weight::from_grams(unit.to_grams(amount, density))))
}
