use std::collections::{BTreeMap, HashMap};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::quantity::{QuantityEntry, Weight};
use common::slug::slugify;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{ingredient, recipe, recipe_ingredient};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::recipe::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Recipes",
    operation_id = "createRecipe",
    summary = "Create a recipe",
    description = "Creates a recipe whose slug is derived from its name. Ingredients referenced by the entries are created when missing; existing ones are left unchanged. Entries without a list go to `main`.",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Slug already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_recipe(&payload)?;

    let name = payload.name.trim().to_string();
    let slug = slugify(&name);
    let images = join_images(&payload.images)?;

    let txn = state.db.begin().await?;

    if recipe::Entity::find_by_id(slug.clone())
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "A recipe with slug '{slug}' already exists"
        )));
    }

    let now = chrono::Utc::now();
    let new_recipe = recipe::ActiveModel {
        slug: Set(slug.clone()),
        name: Set(name),
        directions: Set(payload.directions),
        sidebar: Set(normalize_sidebar(payload.sidebar)),
        images: Set(images),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let model = new_recipe.insert(&txn).await?;

    replace_entries(&txn, &slug, &payload.recipe_ingredients).await?;
    txn.commit().await?;

    tracing::info!(slug = %model.slug, "Recipe created");
    let response = load_recipe_response(&state.db, model).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List recipes",
    description = "Returns one page of recipes ordered by name. `per_page` is clamped to 1-100; a page past the end is empty.",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "Page of recipes", body = RecipeListResponse),
        (status = 400, description = "Malformed query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RecipeListQuery>,
) -> Result<Json<RecipeListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

    let select = recipe::Entity::find();

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    // Pages past the end skip the query; their offset may not fit the driver's i64.
    let offset = (page - 1)
        .checked_mul(per_page)
        .filter(|offset| *offset < total && i64::try_from(*offset).is_ok());
    let Some(offset) = offset else {
        return Ok(Json(RecipeListResponse {
            data: Vec::new(),
            pagination: Pagination {
                page,
                per_page,
                total,
                total_pages,
            },
        }));
    };

    let data = select
        .order_by_asc(recipe::Column::Name)
        .order_by_asc(recipe::Column::Slug)
        .select_only()
        .column(recipe::Column::Slug)
        .column(recipe::Column::Name)
        .column(recipe::Column::CreatedAt)
        .column(recipe::Column::UpdatedAt)
        .offset(Some(offset))
        .limit(Some(per_page))
        .into_model::<RecipeListItem>()
        .all(&state.db)
        .await?;

    Ok(Json(RecipeListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = "Recipes",
    operation_id = "getRecipe",
    summary = "Get a recipe",
    description = "Returns the recipe with its image URLs and ingredient entries grouped by list. Each entry carries its rendered quantity and, when the ingredient's density is known, its weight in grams.",
    params(("slug" = String, Path, description = "Recipe slug")),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RecipeResponse>, AppError> {
    let model = find_recipe(&state.db, &slug).await?;
    Ok(Json(load_recipe_response(&state.db, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{slug}",
    tag = "Recipes",
    operation_id = "updateRecipe",
    summary = "Update a recipe",
    description = "Partially updates a recipe. The slug never changes, even when the name does. `sidebar: null` clears the sidebar. A `recipe_ingredients` array replaces every existing entry.",
    params(("slug" = String, Path, description = "Recipe slug")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(slug))]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    validate_update_recipe(&payload)?;

    if payload == UpdateRecipeRequest::default() {
        let existing = find_recipe(&state.db, &slug).await?;
        return Ok(Json(load_recipe_response(&state.db, existing).await?));
    }

    let txn = state.db.begin().await?;

    let existing = find_recipe(&txn, &slug).await?;
    let mut active: recipe::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(directions) = payload.directions {
        active.directions = Set(directions);
    }
    if let Some(sidebar) = payload.sidebar {
        active.sidebar = Set(normalize_sidebar(sidebar));
    }
    if let Some(ref images) = payload.images {
        active.images = Set(join_images(images)?);
    }
    if let Some(ref entries) = payload.recipe_ingredients {
        replace_entries(&txn, &slug, entries).await?;
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(load_recipe_response(&state.db, model).await?))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Recipes",
    operation_id = "deleteRecipe",
    summary = "Delete a recipe",
    description = "Deletes the recipe and all of its ingredient entries. Ingredients and uploaded images are kept.",
    params(("slug" = String, Path, description = "Recipe slug")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_recipe(&txn, &slug).await?;

    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeSlug.eq(slug.as_str()))
        .exec(&txn)
        .await?;
    recipe::Entity::delete_by_id(slug.clone()).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(%slug, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{slug}/ingredients/{list}/{ingredient_slug}",
    tag = "Recipe Ingredients",
    operation_id = "setRecipeEntry",
    summary = "Add or replace one ingredient entry",
    description = "Upserts the entry for an existing ingredient in the named list. New entries go to the end of the list unless a position is given.",
    params(
        ("slug" = String, Path, description = "Recipe slug"),
        ("list" = String, Path, description = "List name, e.g. `main`"),
        ("ingredient_slug" = String, Path, description = "Ingredient slug"),
    ),
    request_body = SetEntryRequest,
    responses(
        (status = 200, description = "Entry stored", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Recipe or ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(slug, list, ingredient_slug))]
pub async fn put_entry(
    State(state): State<AppState>,
    Path((slug, list, ingredient_slug)): Path<(String, String, String)>,
    AppJson(payload): AppJson<SetEntryRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    validate_set_entry(&list, &payload)?;
    let list = list_key(&list);
    let unit = payload
        .unit
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    let txn = state.db.begin().await?;

    let recipe_model = find_recipe(&txn, &slug).await?;
    ingredient::Entity::find_by_id(ingredient_slug.clone())
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))?;

    let existing = recipe_ingredient::Entity::find_by_id((
        slug.clone(),
        ingredient_slug.clone(),
        list.clone(),
    ))
    .one(&txn)
    .await?;

    match existing {
        Some(entry) => {
            let mut active: recipe_ingredient::ActiveModel = entry.into();
            active.amount = Set(payload.amount);
            active.unit = Set(unit);
            if let Some(pos) = payload.position {
                active.position = Set(pos);
            }
            active.update(&txn).await?;
        }
        None => {
            let position = match payload.position {
                Some(pos) => pos,
                None => next_entry_position(&txn, &slug, &list).await?,
            };
            recipe_ingredient::ActiveModel {
                recipe_slug: Set(slug.clone()),
                ingredient_slug: Set(ingredient_slug),
                list: Set(list),
                amount: Set(payload.amount),
                unit: Set(unit),
                position: Set(position),
            }
            .insert(&txn)
            .await?;
        }
    }

    let model = touch_recipe(&txn, recipe_model).await?;
    txn.commit().await?;

    Ok(Json(load_recipe_response(&state.db, model).await?))
}

#[utoipa::path(
    delete,
    path = "/{slug}/ingredients/{list}/{ingredient_slug}",
    tag = "Recipe Ingredients",
    operation_id = "deleteRecipeEntry",
    summary = "Remove one ingredient entry",
    description = "Removes the entry. The ingredient itself is kept.",
    params(
        ("slug" = String, Path, description = "Recipe slug"),
        ("list" = String, Path, description = "List name"),
        ("ingredient_slug" = String, Path, description = "Ingredient slug"),
    ),
    responses(
        (status = 204, description = "Entry removed"),
        (status = 404, description = "Recipe or entry not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug, list, ingredient_slug))]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path((slug, list, ingredient_slug)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let list = list_key(&list);
    let txn = state.db.begin().await?;

    let recipe_model = find_recipe(&txn, &slug).await?;
    let res = recipe_ingredient::Entity::delete_by_id((slug, ingredient_slug, list))
        .exec(&txn)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("Entry not found".into()));
    }

    touch_recipe(&txn, recipe_model).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_recipe<C: ConnectionTrait>(db: &C, slug: &str) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(slug.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))
}

async fn touch_recipe<C: ConnectionTrait>(
    db: &C,
    model: recipe::Model,
) -> Result<recipe::Model, AppError> {
    let mut active: recipe::ActiveModel = model.into();
    active.updated_at = Set(chrono::Utc::now());
    Ok(active.update(db).await?)
}

async fn next_entry_position<C: ConnectionTrait>(
    db: &C,
    recipe_slug: &str,
    list: &str,
) -> Result<i32, AppError> {
    let max_pos: Option<i32> = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeSlug.eq(recipe_slug))
        .filter(recipe_ingredient::Column::List.eq(list))
        .select_only()
        .column_as(recipe_ingredient::Column::Position.max(), "max_pos")
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();
    max_pos
        .unwrap_or(-1)
        .checked_add(1)
        .ok_or_else(|| AppError::Validation("Position overflow".into()))
}

/// Replace every entry of a recipe, creating missing ingredients.
async fn replace_entries<C: ConnectionTrait>(
    db: &C,
    recipe_slug: &str,
    entries: &[RecipeIngredientInput],
) -> Result<(), AppError> {
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeSlug.eq(recipe_slug))
        .exec(db)
        .await?;

    let mut positions: HashMap<String, i32> = HashMap::new();
    for input in entries {
        let ingredient_slug = input.ingredient_slug();
        ensure_ingredient(db, &ingredient_slug, input).await?;

        let list = input.list_name();
        let position = positions.entry(list.clone()).or_insert(0);
        recipe_ingredient::ActiveModel {
            recipe_slug: Set(recipe_slug.to_string()),
            ingredient_slug: Set(ingredient_slug),
            list: Set(list),
            amount: Set(input.amount),
            unit: Set(input.unit()),
            position: Set(*position),
        }
        .insert(db)
        .await?;
        *position += 1;
    }
    Ok(())
}

async fn ensure_ingredient<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    input: &RecipeIngredientInput,
) -> Result<(), AppError> {
    let exists = ingredient::Entity::find_by_id(slug.to_string())
        .one(db)
        .await?
        .is_some();
    if !exists {
        ingredient::ActiveModel {
            slug: Set(slug.to_string()),
            name: Set(input.ingredient.name.trim().to_string()),
            density: Set(input.ingredient.density),
        }
        .insert(db)
        .await?;
        tracing::debug!(%slug, "Ingredient created from recipe entry");
    }
    Ok(())
}

async fn load_recipe_response<C: ConnectionTrait>(
    db: &C,
    model: recipe::Model,
) -> Result<RecipeResponse, AppError> {
    let entries = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeSlug.eq(model.slug.as_str()))
        .order_by_asc(recipe_ingredient::Column::List)
        .order_by_asc(recipe_ingredient::Column::Position)
        .order_by_asc(recipe_ingredient::Column::IngredientSlug)
        .all(db)
        .await?;

    let slugs: Vec<String> = entries.iter().map(|e| e.ingredient_slug.clone()).collect();
    let ingredients: HashMap<String, (String, Option<f64>)> = if slugs.is_empty() {
        HashMap::new()
    } else {
        ingredient::Entity::find()
            .filter(ingredient::Column::Slug.is_in(slugs))
            .all(db)
            .await?
            .into_iter()
            .map(|i| (i.slug, (i.name, i.density)))
            .collect()
    };

    let ingredient_lists = build_book_view(entries.into_iter().map(BookLine::from), &ingredients)?;
    let images = split_images(model.images.as_deref());
    let image_urls = images.iter().map(|id| image_url(id)).collect();

    Ok(RecipeResponse {
        slug: model.slug,
        name: model.name,
        directions: model.directions,
        sidebar: model.sidebar,
        images,
        image_urls,
        ingredient_lists,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// The columns of a stored entry the book view needs.
struct BookLine {
    list: String,
    ingredient_slug: String,
    amount: Option<f64>,
    unit: Option<String>,
}

impl From<recipe_ingredient::Model> for BookLine {
    fn from(m: recipe_ingredient::Model) -> Self {
        Self {
            list: m.list,
            ingredient_slug: m.ingredient_slug,
            amount: m.amount,
            unit: m.unit,
        }
    }
}

/// Group entries by list name and render each quantity.
///
/// `ingredients` maps a slug to its name and density.
fn build_book_view(
    entries: impl IntoIterator<Item = BookLine>,
    ingredients: &HashMap<String, (String, Option<f64>)>,
) -> Result<Vec<IngredientListResponse>, AppError> {
    let mut lists: BTreeMap<String, Vec<EntryResponse>> = BTreeMap::new();

    for entry in entries {
        let (name, density) = match ingredients.get(&entry.ingredient_slug) {
            Some((name, density)) => (name.clone(), *density),
            None => (entry.ingredient_slug.clone(), None),
        };
        let quantity = QuantityEntry::new(entry.amount, entry.unit, name, density).map_err(|e| {
            AppError::Internal(format!(
                "Stored entry {}/{} is invalid: {e}",
                entry.list, entry.ingredient_slug
            ))
        })?;

        lists.entry(entry.list).or_default().push(EntryResponse {
            ingredient_slug: entry.ingredient_slug,
            ingredient_name: quantity.ingredient_name().to_string(),
            amount: quantity.amount(),
            unit: quantity.unit().map(str::to_string),
            pretty: quantity.pretty().to_string(),
            weight: quantity.display_weight().map(Weight::grams),
        });
    }

    Ok(lists
        .into_iter()
        .map(|(list, entries)| IngredientListResponse { list, entries })
        .collect())
}

fn normalize_sidebar(sidebar: Option<String>) -> Option<String> {
    sidebar.filter(|s| !s.trim().is_empty())
}
