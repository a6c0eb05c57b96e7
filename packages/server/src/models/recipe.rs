use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{
    double_option, parse_image_ids, validate_amount, validate_density, validate_list,
    validate_name, validate_slug, validate_unit,
};

/// Sub-list used when an entry does not name one.
pub const DEFAULT_LIST: &str = "main";

/// Ingredient referenced inline by a recipe entry. Created when it does not
/// exist yet; an existing ingredient is left untouched.
#[derive(Deserialize, PartialEq, Debug, ToSchema)]
pub struct IngredientRef {
    /// Defaults to the slug derived from `name`.
    #[schema(example = "flour")]
    pub slug: Option<String>,
    #[schema(example = "Flour")]
    pub name: String,
    /// Grams per milliliter.
    #[schema(example = 0.593)]
    pub density: Option<f64>,
}

#[derive(Deserialize, PartialEq, Debug, ToSchema)]
pub struct RecipeIngredientInput {
    pub ingredient: IngredientRef,
    /// Sub-list name. Default: "main".
    #[schema(example = "main")]
    pub list: Option<String>,
    #[schema(example = 2.5)]
    pub amount: Option<f64>,
    #[schema(example = "cups")]
    pub unit: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    #[schema(example = "Banana Bread")]
    pub name: String,
    /// Markdown.
    #[serde(default)]
    pub directions: String,
    pub sidebar: Option<String>,
    /// Blob ids returned by `POST /images/`.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub recipe_ingredients: Vec<RecipeIngredientInput>,
}

#[derive(Deserialize, Default, PartialEq, ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub directions: Option<String>,
    /// Absent keeps the sidebar, `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub sidebar: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    /// When present, replaces every entry of the recipe.
    pub recipe_ingredients: Option<Vec<RecipeIngredientInput>>,
}

/// Body of `PUT /recipes/{slug}/ingredients/{list}/{ingredient_slug}`.
#[derive(Deserialize, ToSchema)]
pub struct SetEntryRequest {
    pub amount: Option<f64>,
    pub unit: Option<String>,
    /// Position within the list. Defaults to the end for new entries.
    pub position: Option<i32>,
}

/// One rendered line of the book view.
#[derive(Serialize, ToSchema)]
pub struct EntryResponse {
    pub ingredient_slug: String,
    pub ingredient_name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    #[schema(example = "2 1/2 cups Flour")]
    pub pretty: String,
    /// Grams. Omitted when the ingredient has no density or the unit is unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 350.73)]
    pub weight: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct IngredientListResponse {
    #[schema(example = "main")]
    pub list: String,
    pub entries: Vec<EntryResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct RecipeResponse {
    pub slug: String,
    pub name: String,
    pub directions: String,
    pub sidebar: Option<String>,
    pub images: Vec<String>,
    /// `/images/{id}` for each image.
    pub image_urls: Vec<String>,
    /// Entries grouped by list name, lists sorted by name.
    pub ingredient_lists: Vec<IngredientListResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, FromQueryResult, ToSchema)]
pub struct RecipeListItem {
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct RecipeListResponse {
    pub data: Vec<RecipeListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// Page number (1-based). Default: 1.
    pub page: Option<u64>,
    /// Items per page, 1-100. Default: 10.
    pub per_page: Option<u64>,
}

/// Split the stored comma-separated image column.
pub fn split_images(images: Option<&str>) -> Vec<String> {
    images
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Canonicalize image ids for storage; `None` when there are none.
pub fn join_images(images: &[String]) -> Result<Option<String>, AppError> {
    let ids = parse_image_ids(images)?;
    if ids.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
    ))
}

pub fn image_url(id: &str) -> String {
    format!("/images/{id}")
}

/// Canonical form of a list name as stored on an entry.
pub fn list_key(list: &str) -> String {
    list.trim().to_string()
}

impl RecipeIngredientInput {
    pub fn list_name(&self) -> String {
        self.list
            .as_deref()
            .map(list_key)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LIST.to_string())
    }

    pub fn ingredient_slug(&self) -> String {
        match &self.ingredient.slug {
            Some(slug) => slug.trim().to_string(),
            None => common::slug::slugify(self.ingredient.name.trim()),
        }
    }

    pub fn unit(&self) -> Option<String> {
        self.unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
    }
}

fn validate_entries(entries: &[RecipeIngredientInput]) -> Result<(), AppError> {
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        let slug = entry.ingredient_slug();
        validate_slug(&slug, 50)?;
        validate_name(&entry.ingredient.name, 50)?;
        validate_density(entry.ingredient.density)?;
        validate_list(&entry.list_name())?;
        validate_unit(entry.unit.as_deref())?;
        validate_amount(entry.amount)?;
        if !seen.insert((slug.clone(), entry.list_name())) {
            return Err(AppError::Validation(format!(
                "Ingredient '{slug}' appears twice in list '{}'",
                entry.list_name()
            )));
        }
    }
    Ok(())
}

pub fn validate_create_recipe(req: &CreateRecipeRequest) -> Result<(), AppError> {
    validate_name(&req.name, 100)?;
    parse_image_ids(&req.images)?;
    validate_entries(&req.recipe_ingredients)
}

pub fn validate_update_recipe(req: &UpdateRecipeRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name, 100)?;
    }
    if let Some(ref images) = req.images {
        parse_image_ids(images)?;
    }
    if let Some(ref entries) = req.recipe_ingredients {
        validate_entries(entries)?;
    }
    Ok(())
}

pub fn validate_set_entry(list: &str, req: &SetEntryRequest) -> Result<(), AppError> {
    validate_list(list)?;
    validate_unit(req.unit.as_deref())?;
    validate_amount(req.amount)?;
    if let Some(pos) = req.position
        && pos < 0
    {
        return Err(AppError::Validation("Position must be >= 0".into()));
    }
    Ok(())
}
