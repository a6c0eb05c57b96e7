use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use common::storage::FilesystemBlobStore;
use cookbook_server::config::{
    AppConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use cookbook_server::state::AppState;

/// Blob size limit used by every test server.
pub const MAX_BLOB_SIZE: u64 = 1024 * 1024;

pub mod routes {
    pub const HEALTH: &str = "/api/health";
    pub const RECIPES: &str = "/api/v1/recipes";
    pub const INGREDIENTS: &str = "/api/v1/ingredients";
    pub const IMAGES: &str = "/images/";

    pub fn recipe(slug: &str) -> String {
        format!("/api/v1/recipes/{slug}")
    }

    pub fn recipe_entry(slug: &str, list: &str, ingredient: &str) -> String {
        format!("/api/v1/recipes/{slug}/ingredients/{list}/{ingredient}")
    }

    pub fn ingredient(slug: &str) -> String {
        format!("/api/v1/ingredients/{slug}")
    }

    pub fn image(id: &str) -> String {
        format!("/images/{id}")
    }
}

/// A running test server backed by a throwaway sqlite file and image dir.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("cookbook.db").display());

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig::default(),
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: 5,
            },
            storage: StorageConfig {
                dir: dir.path().join("images"),
                max_blob_size: MAX_BLOB_SIZE,
            },
        };

        let db = cookbook_server::database::init_db(&app_config.database)
            .await
            .expect("Failed to initialize test database");
        let blob_store =
            FilesystemBlobStore::new(app_config.storage.dir.clone(), MAX_BLOB_SIZE)
                .await
                .expect("Failed to create blob store");

        let state = AppState {
            db: db.clone(),
            blob_store: Arc::new(blob_store),
            config: Arc::new(app_config),
        };

        let app = cookbook_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// GET returning the raw bytes, for binary payloads.
    pub async fn get_bytes(&self, path: &str) -> (u16, reqwest::header::HeaderMap, Vec<u8>) {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        (status, headers, bytes)
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn put_bytes(&self, path: &str, bytes: Vec<u8>) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Multipart upload with the given field name.
    pub async fn upload_field(&self, field: &str, file_bytes: Vec<u8>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name("photo.jpg")
            .mime_str("image/jpeg")
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part(field.to_string(), part);

        let res = self
            .client
            .post(self.url(routes::IMAGES))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Upload an image and return its id.
    pub async fn upload_image(&self, file_bytes: Vec<u8>) -> String {
        let res = self.upload_field("file", file_bytes).await;
        assert_eq!(res.status, 200, "Upload failed: {}", res.text);
        res.text
    }

    /// Create a recipe from a name and `(ingredient name, density, amount, unit, list)` rows.
    pub async fn create_recipe(
        &self,
        name: &str,
        entries: &[(&str, Option<f64>, Option<f64>, Option<&str>, Option<&str>)],
    ) -> TestResponse {
        let recipe_ingredients: Vec<Value> = entries
            .iter()
            .map(|(ingredient, density, amount, unit, list)| {
                serde_json::json!({
                    "ingredient": {"name": ingredient, "density": density},
                    "amount": amount,
                    "unit": unit,
                    "list": list,
                })
            })
            .collect();

        let res = self
            .post(
                routes::RECIPES,
                &serde_json::json!({
                    "name": name,
                    "directions": "Mix and bake.",
                    "recipe_ingredients": recipe_ingredients,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "Recipe creation failed: {}", res.text);
        res
    }

    pub async fn create_ingredient(&self, name: &str, density: Option<f64>) -> String {
        let res = self
            .post(
                routes::INGREDIENTS,
                &serde_json::json!({"name": name, "density": density}),
            )
            .await;
        assert_eq!(res.status, 201, "Ingredient creation failed: {}", res.text);
        res.body["slug"].as_str().unwrap().to_string()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            content_type,
            text,
            body,
        }
    }

    /// Entries of the named list in a recipe response.
    pub fn list(&self, name: &str) -> &Vec<Value> {
        self.body["ingredient_lists"]
            .as_array()
            .expect("response should contain ingredient_lists")
            .iter()
            .find(|l| l["list"] == name)
            .unwrap_or_else(|| panic!("list '{name}' missing: {}", self.text))["entries"]
            .as_array()
            .expect("list should contain entries")
    }
}
