use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::ingredient;
use crate::error::AppError;

use super::shared::{double_option, validate_density, validate_name, validate_slug};

#[derive(Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    /// Defaults to the slug derived from `name`.
    #[schema(example = "flour")]
    pub slug: Option<String>,
    #[schema(example = "Flour")]
    pub name: String,
    /// Grams per milliliter; enables weight display.
    #[schema(example = 0.593)]
    pub density: Option<f64>,
}

#[derive(Deserialize, Default, PartialEq, ToSchema)]
pub struct UpdateIngredientRequest {
    pub name: Option<String>,
    /// Absent keeps the density, `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub density: Option<Option<f64>>,
}

#[derive(Serialize, ToSchema)]
pub struct IngredientResponse {
    pub slug: String,
    pub name: String,
    pub density: Option<f64>,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(m: ingredient::Model) -> Self {
        Self {
            slug: m.slug,
            name: m.name,
            density: m.density,
        }
    }
}

/// A recipe list the ingredient appears in.
#[derive(Serialize, ToSchema)]
pub struct IngredientUsage {
    pub recipe_slug: String,
    pub recipe_name: String,
    pub list: String,
}

#[derive(Serialize, ToSchema)]
pub struct IngredientDetailResponse {
    #[serde(flatten)]
    pub ingredient: IngredientResponse,
    pub used_in: Vec<IngredientUsage>,
}

pub fn validate_create_ingredient(req: &CreateIngredientRequest) -> Result<(), AppError> {
    validate_name(&req.name, 50)?;
    if let Some(ref slug) = req.slug {
        validate_slug(slug, 50)?;
    }
    validate_density(req.density)
}

pub fn validate_update_ingredient(req: &UpdateIngredientRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name, 50)?;
    }
    if let Some(density) = req.density {
        validate_density(density)?;
    }
    Ok(())
}
