use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/recipes", recipe_routes())
        .nest("/ingredients", ingredient_routes())
}

fn recipe_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::recipe::list_recipes,
            handlers::recipe::create_recipe
        ))
        .routes(routes!(
            handlers::recipe::get_recipe,
            handlers::recipe::update_recipe,
            handlers::recipe::delete_recipe
        ))
        .routes(routes!(
            handlers::recipe::put_entry,
            handlers::recipe::delete_entry
        ))
}

fn ingredient_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::ingredient::list_ingredients,
            handlers::ingredient::create_ingredient
        ))
        .routes(routes!(
            handlers::ingredient::get_ingredient,
            handlers::ingredient::update_ingredient,
            handlers::ingredient::delete_ingredient
        ))
}
