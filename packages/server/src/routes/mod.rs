mod v1;

use axum::routing::post;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::StorageConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::health::health))
        .nest("/v1", v1::routes())
}

/// Image blob endpoints, mounted at the root next to `/api`.
pub fn image_routes(storage: &StorageConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::image::upload_image))
        .route("/images", post(handlers::image::upload_image))
        .routes(routes!(
            handlers::image::get_image,
            handlers::image::replace_image,
            handlers::image::delete_image
        ))
        .layer(handlers::image::image_body_limit(storage.max_blob_size))
}
