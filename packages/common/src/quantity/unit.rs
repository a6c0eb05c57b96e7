use std::fmt;
use std::str::FromStr;

use super::error::QuantityError;

/// Units understood by weight derivation.
///
/// Volumes use US customary culinary measures (1 cup = 236.5882365 ml,
/// 1 tbsp = 1/16 cup, 1 tsp = 1/3 tbsp, 1 fl oz = 2 tbsp) alongside metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Milliliter,
    Liter,
    Teaspoon,
    Tablespoon,
    FluidOunce,
    Cup,
    Pint,
    Quart,
    Gallon,
    Gram,
    Kilogram,
    Ounce,
    Pound,
}

/// What one of a [`Unit`] measures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    /// Volume in milliliters.
    Volume(f64),
    /// Mass in grams.
    Mass(f64),
}

const ML_PER_CUP: f64 = 236.588_236_5;

impl Unit {
    pub const ALL: [Unit; 13] = [
        Unit::Milliliter,
        Unit::Liter,
        Unit::Teaspoon,
        Unit::Tablespoon,
        Unit::FluidOunce,
        Unit::Cup,
        Unit::Pint,
        Unit::Quart,
        Unit::Gallon,
        Unit::Gram,
        Unit::Kilogram,
        Unit::Ounce,
        Unit::Pound,
    ];

    /// Look up a unit by any accepted spelling.
    ///
    /// Matching ignores case, periods and repeated whitespace, so `"Tbsp."`,
    /// `"fl. oz"` and `"Cups"` all resolve.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = normalize(s);
        let unit = match normalized.as_str() {
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => Unit::Milliliter,
            "l" | "liter" | "liters" | "litre" | "litres" => Unit::Liter,
            "tsp" | "tsps" | "teaspoon" | "teaspoons" => Unit::Teaspoon,
            "tbsp" | "tbsps" | "tablespoon" | "tablespoons" => Unit::Tablespoon,
            "fl-oz" | "fl oz" | "floz" | "fluid ounce" | "fluid ounces" => Unit::FluidOunce,
            "c" | "cup" | "cups" => Unit::Cup,
            "pt" | "pint" | "pints" => Unit::Pint,
            "qt" | "quart" | "quarts" => Unit::Quart,
            "gal" | "gallon" | "gallons" => Unit::Gallon,
            "g" | "gram" | "grams" => Unit::Gram,
            "kg" | "kilogram" | "kilograms" => Unit::Kilogram,
            "oz" | "ounce" | "ounces" => Unit::Ounce,
            "lb" | "lbs" | "pound" | "pounds" => Unit::Pound,
            _ => return None,
        };
        Some(unit)
    }

    /// Canonical short symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Milliliter => "ml",
            Unit::Liter => "l",
            Unit::Teaspoon => "tsp",
            Unit::Tablespoon => "tbsp",
            Unit::FluidOunce => "fl-oz",
            Unit::Cup => "cup",
            Unit::Pint => "pint",
            Unit::Quart => "quart",
            Unit::Gallon => "gallon",
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Ounce => "oz",
            Unit::Pound => "lb",
        }
    }

    /// Size of one of this unit.
    pub fn measure(self) -> Measure {
        match self {
            Unit::Milliliter => Measure::Volume(1.0),
            Unit::Liter => Measure::Volume(1000.0),
            Unit::Teaspoon => Measure::Volume(ML_PER_CUP / 48.0),
            Unit::Tablespoon => Measure::Volume(ML_PER_CUP / 16.0),
            Unit::FluidOunce => Measure::Volume(ML_PER_CUP / 8.0),
            Unit::Cup => Measure::Volume(ML_PER_CUP),
            Unit::Pint => Measure::Volume(ML_PER_CUP * 2.0),
            Unit::Quart => Measure::Volume(ML_PER_CUP * 4.0),
            Unit::Gallon => Measure::Volume(ML_PER_CUP * 16.0),
            Unit::Gram => Measure::Mass(1.0),
            Unit::Kilogram => Measure::Mass(1000.0),
            Unit::Ounce => Measure::Mass(28.349_523_125),
            Unit::Pound => Measure::Mass(453.592_37),
        }
    }

    /// Convert `amount` of this unit to milliliters, if it is a volume.
    pub fn to_milliliters(self, amount: f64) -> Option<f64> {
        match self.measure() {
            Measure::Volume(ml) => Some(amount * ml),
            Measure::Mass(_) => None,
        }
    }

    /// Mass in grams of `amount` of this unit for a substance of `density` g/ml.
    pub fn to_grams(self, amount: f64, density: f64) -> f64 {
        match self.measure() {
            Measure::Volume(ml) => amount * ml * density,
            Measure::Mass(g) => amount * g,
        }
    }
}

impl FromStr for Unit {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| QuantityError::UnknownUnit(s.trim().to_string()))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .map(|word| word.replace('.', "").to_lowercase())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
