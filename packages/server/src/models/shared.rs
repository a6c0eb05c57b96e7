use common::slug::is_slug;
use common::storage::BlobId;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 10)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 5)]
    pub total_pages: u64,
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed display name of at most `max` Unicode characters.
pub fn validate_name(name: &str, max: usize) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > max {
        return Err(AppError::Validation(format!(
            "Name must be 1-{max} characters"
        )));
    }
    Ok(())
}

/// Validate an explicitly supplied slug.
pub fn validate_slug(slug: &str, max: usize) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > max {
        return Err(AppError::Validation(format!(
            "Slug must be 1-{max} characters"
        )));
    }
    if !is_slug(slug) {
        return Err(AppError::Validation(format!(
            "Slug '{slug}' may only contain lowercase letters, digits and underscores"
        )));
    }
    Ok(())
}

/// Validate an optional unit string (at most 20 characters).
pub fn validate_unit(unit: Option<&str>) -> Result<(), AppError> {
    if let Some(unit) = unit
        && unit.chars().count() > 20
    {
        return Err(AppError::Validation(
            "Unit must be at most 20 characters".into(),
        ));
    }
    Ok(())
}

/// Validate a sub-list name (1-100 characters).
pub fn validate_list(list: &str) -> Result<(), AppError> {
    if list.trim().is_empty() || list.chars().count() > 100 {
        return Err(AppError::Validation(
            "List name must be 1-100 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_amount(amount: Option<f64>) -> Result<(), AppError> {
    if let Some(amount) = amount {
        common::quantity::validate_amount(amount)?;
    }
    Ok(())
}

pub fn validate_density(density: Option<f64>) -> Result<(), AppError> {
    if let Some(density) = density {
        common::quantity::validate_density(density)?;
    }
    Ok(())
}

/// Parse image references into canonical blob ids.
pub fn parse_image_ids(images: &[String]) -> Result<Vec<BlobId>, AppError> {
    images
        .iter()
        .map(|raw| {
            BlobId::parse(raw.trim())
                .map_err(|_| AppError::Validation(format!("Invalid image id: {raw}")))
        })
        .collect()
}
