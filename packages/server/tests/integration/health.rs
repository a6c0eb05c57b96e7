use crate::common::{TestApp, routes};

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_lists_image_and_recipe_paths() {
    let app = TestApp::spawn().await;

    let res = app.get("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().expect("paths object");
    assert!(paths.contains_key("/api/v1/recipes"));
    assert!(paths.contains_key("/api/v1/recipes/{slug}"));
    assert!(paths.contains_key("/images/{id}"));
}
