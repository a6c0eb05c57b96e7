use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::slug::slugify;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{ingredient, recipe, recipe_ingredient};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::ingredient::*;
use crate::models::shared::validate_slug;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Ingredients",
    operation_id = "listIngredients",
    summary = "List all ingredients",
    responses(
        (status = 200, description = "Ingredients ordered by name", body = Vec<IngredientResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let ingredients = ingredient::Entity::find()
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Slug)
        .all(&state.db)
        .await?;
    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Ingredients",
    operation_id = "createIngredient",
    summary = "Create an ingredient",
    description = "The slug defaults to one derived from the name. A density in g/ml enables weight display for volumetric entries.",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created", body = IngredientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Slug already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateIngredientRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_ingredient(&payload)?;

    let name = payload.name.trim().to_string();
    let slug = match payload.slug {
        Some(slug) => slug,
        None => slugify(&name),
    };
    validate_slug(&slug, 50)?;

    if ingredient::Entity::find_by_id(slug.clone())
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "An ingredient with slug '{slug}' already exists"
        )));
    }

    let model = ingredient::ActiveModel {
        slug: Set(slug),
        name: Set(name),
        density: Set(payload.density),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(IngredientResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = "Ingredients",
    operation_id = "getIngredient",
    summary = "Get an ingredient and where it is used",
    params(("slug" = String, Path, description = "Ingredient slug")),
    responses(
        (status = 200, description = "Ingredient details", body = IngredientDetailResponse),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<IngredientDetailResponse>, AppError> {
    let model = find_ingredient(&state.db, &slug).await?;

    let entries = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::IngredientSlug.eq(slug.as_str()))
        .order_by_asc(recipe_ingredient::Column::RecipeSlug)
        .order_by_asc(recipe_ingredient::Column::List)
        .all(&state.db)
        .await?;

    let recipe_slugs: Vec<String> = entries.iter().map(|e| e.recipe_slug.clone()).collect();
    let names: HashMap<String, String> = if recipe_slugs.is_empty() {
        HashMap::new()
    } else {
        recipe::Entity::find()
            .filter(recipe::Column::Slug.is_in(recipe_slugs))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|r| (r.slug, r.name))
            .collect()
    };

    let used_in = entries
        .into_iter()
        .map(|e| IngredientUsage {
            recipe_name: names
                .get(&e.recipe_slug)
                .cloned()
                .unwrap_or_else(|| e.recipe_slug.clone()),
            recipe_slug: e.recipe_slug,
            list: e.list,
        })
        .collect();

    Ok(Json(IngredientDetailResponse {
        ingredient: model.into(),
        used_in,
    }))
}

#[utoipa::path(
    patch,
    path = "/{slug}",
    tag = "Ingredients",
    operation_id = "updateIngredient",
    summary = "Update an ingredient",
    description = "Partially updates an ingredient. The slug never changes. `density: null` clears the density, which hides weights for every recipe using it.",
    params(("slug" = String, Path, description = "Ingredient slug")),
    request_body = UpdateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated", body = IngredientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(slug))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<UpdateIngredientRequest>,
) -> Result<Json<IngredientResponse>, AppError> {
    validate_update_ingredient(&payload)?;

    let existing = find_ingredient(&state.db, &slug).await?;
    if payload == UpdateIngredientRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: ingredient::ActiveModel = existing.into();
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(density) = payload.density {
        active.density = Set(density);
    }

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Ingredients",
    operation_id = "deleteIngredient",
    summary = "Delete an ingredient",
    description = "Deletes the ingredient and removes it from every recipe. The recipes themselves are kept.",
    params(("slug" = String, Path, description = "Ingredient slug")),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_ingredient(&txn, &slug).await?;

    let removed = recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::IngredientSlug.eq(slug.as_str()))
        .exec(&txn)
        .await?;
    ingredient::Entity::delete_by_id(slug.clone())
        .exec(&txn)
        .await?;

    txn.commit().await?;
    tracing::info!(%slug, entries = removed.rows_affected, "Ingredient deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_ingredient<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<ingredient::Model, AppError> {
    ingredient::Entity::find_by_id(slug.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))
}
