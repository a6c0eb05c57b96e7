use std::cell::OnceCell;

use tracing::debug;

use super::error::QuantityError;
use super::{Weight, format, validate_amount, validate_density, weight};

/// One ingredient line of a recipe, with its rendering computed on demand.
///
/// `pretty` and `weight` are computed on first access and cached. Every
/// setter clears the caches it affects.
#[derive(Debug, Clone)]
pub struct QuantityEntry {
    amount: Option<f64>,
    unit: Option<String>,
    ingredient_name: String,
    density: Option<f64>,
    pretty: OnceCell<String>,
    weight: OnceCell<Result<Option<Weight>, QuantityError>>,
}

impl QuantityEntry {
    pub fn new(
        amount: Option<f64>,
        unit: Option<String>,
        ingredient_name: impl Into<String>,
        density: Option<f64>,
    ) -> Result<Self, QuantityError> {
        let amount = amount.map(validate_amount).transpose()?;
        let density = density.map(validate_density).transpose()?;
        Ok(Self {
            amount,
            unit: unit.filter(|u| !u.trim().is_empty()),
            ingredient_name: ingredient_name.into(),
            density,
            pretty: OnceCell::new(),
            weight: OnceCell::new(),
        })
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn ingredient_name(&self) -> &str {
        &self.ingredient_name
    }

    pub fn density(&self) -> Option<f64> {
        self.density
    }

    /// Rendering such as `"2 1/2 cups flour"`.
    pub fn pretty(&self) -> &str {
        self.pretty
            .get_or_init(|| format(self.amount, self.unit(), &self.ingredient_name))
    }

    /// Derived weight in grams. See [`weight`](super::weight).
    pub fn weight(&self) -> Result<Option<Weight>, QuantityError> {
        self.weight
            .get_or_init(|| weight(self.amount, self.unit(), self.density))
            .clone()
    }

    /// Weight for display: an unknown unit degrades to no weight.
    pub fn display_weight(&self) -> Option<Weight> {
        match self.weight() {
            Ok(weight) => weight,
            Err(e) => {
                debug!(ingredient = %self.ingredient_name, error = %e, "Weight unavailable");
                None
            }
        }
    }

    pub fn set_amount(&mut self, amount: Option<f64>) -> Result<(), QuantityError> {
        self.amount = amount.map(validate_amount).transpose()?;
        self.invalidate();
        Ok(())
    }

    pub fn set_unit(&mut self, unit: Option<String>) {
        self.unit = unit.filter(|u| !u.trim().is_empty());
        self.invalidate();
    }

    pub fn set_density(&mut self, density: Option<f64>) -> Result<(), QuantityError> {
        self.density = density.map(validate_density).transpose()?;
        self.weight.take();
        Ok(())
    }

    pub fn set_ingredient_name(&mut self, name: impl Into<String>) {
        self.ingredient_name = name.into();
        self.pretty.take();
    }

    /// Drop all cached values.
    pub fn invalidate(&mut self) {
        self.pretty.take();
        self.weight.take();
    }
}
