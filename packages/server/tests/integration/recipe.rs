use cookbook_server::entity::recipe_ingredient;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use crate::common::{TestApp, routes};

mod recipe_creation {
    use super::*;

    #[tokio::test]
    async fn create_derives_slug_and_renders_book_view() {
        let app = TestApp::spawn().await;

        let res = app
            .create_recipe(
                "Mom's Banana Bread",
                &[
                    ("Flour", Some(0.593), Some(2.5), Some("cups"), None),
                    ("Baking Soda", None, Some(1.0), Some("tsp"), None),
                    ("Brown Sugar", Some(0.93), Some(0.25), Some("cup"), Some("topping")),
                ],
            )
            .await;

        assert_eq!(res.body["slug"], "mom_s_banana_bread");
        assert_eq!(res.body["name"], "Mom's Banana Bread");

        let lists: Vec<&str> = res.body["ingredient_lists"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["list"].as_str().unwrap())
            .collect();
        assert_eq!(lists, vec!["main", "topping"]);

        let main = res.list("main");
        assert_eq!(main[0]["pretty"], "2 1/2 cups Flour");
        assert_eq!(main[0]["weight"], 350.74);
        assert_eq!(main[1]["pretty"], "1 tsp Baking Soda");
        assert!(main[1].get("weight").is_none(), "no density, no weight");

        let topping = res.list("topping");
        assert_eq!(topping[0]["pretty"], "1/4 cup Brown Sugar");
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let app = TestApp::spawn().await;
        app.create_recipe("Pancakes", &[]).await;

        let res = app
            .post(routes::RECIPES, &json!({"name": "PANCAKES", "directions": ""}))
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn missing_ingredients_are_created() {
        let app = TestApp::spawn().await;
        app.create_recipe("Toast", &[("Rye Bread", None, Some(2.0), Some("slices"), None)])
            .await;

        let res = app.get(&routes::ingredient("rye_bread")).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Rye Bread");
        assert_eq!(res.body["used_in"][0]["recipe_slug"], "toast");
    }

    #[tokio::test]
    async fn existing_ingredient_is_not_overwritten() {
        let app = TestApp::spawn().await;
        app.create_ingredient("Sugar", Some(0.85)).await;

        app.create_recipe("Tea", &[("Sugar", Some(2.0), Some(1.0), Some("tsp"), None)])
            .await;

        let res = app.get(&routes::ingredient("sugar")).await;
        assert_eq!(res.body["density"], 0.85);
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::RECIPES, &json!({"name": "   ", "directions": "x"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn negative_amount_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::RECIPES,
                &json!({
                    "name": "Bad",
                    "recipe_ingredients": [{"ingredient": {"name": "Salt"}, "amount": -1.0}],
                }),
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.post_raw(routes::RECIPES, "{not json").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn images_are_exposed_as_urls() {
        let app = TestApp::spawn().await;
        let id = app.upload_image(b"jpeg".to_vec()).await;

        let res = app
            .post(
                routes::RECIPES,
                &json!({"name": "Pie", "directions": "Bake.", "images": [id]}),
            )
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["images"][0], id.as_str());
        assert_eq!(res.body["image_urls"][0], format!("/images/{id}"));
    }

    #[tokio::test]
    async fn non_uuid_image_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::RECIPES, &json!({"name": "Pie", "images": ["cat.jpg"]}))
            .await;

        assert_eq!(res.status, 400);
    }
}

mod recipe_listing {
    use super::*;

    #[tokio::test]
    async fn default_page_size_is_ten() {
        let app = TestApp::spawn().await;
        for i in 0..12 {
            app.create_recipe(&format!("Recipe {i:02}"), &[]).await;
        }

        let res = app.get(routes::RECIPES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 10);
        assert_eq!(res.body["data"][0]["slug"], "recipe_00");
        assert_eq!(res.body["pagination"]["total"], 12);
        assert_eq!(res.body["pagination"]["total_pages"], 2);

        let res = app.get(&format!("{}?page=2", routes::RECIPES)).await;
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let app = TestApp::spawn().await;
        app.create_recipe("Only", &[]).await;

        let res = app.get(&format!("{}?page=9", routes::RECIPES)).await;

        assert_eq!(res.status, 200);
        assert!(res.body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn page_beyond_any_offset_is_empty() {
        let app = TestApp::spawn().await;
        app.create_recipe("Only", &[]).await;

        let res = app
            .get(&format!("{}?page={}", routes::RECIPES, u64::MAX))
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["data"].as_array().unwrap().is_empty());
        assert_eq!(res.body["pagination"]["page"], u64::MAX);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["pagination"]["total_pages"], 1);
    }

    #[tokio::test]
    async fn per_page_is_clamped() {
        let app = TestApp::spawn().await;
        app.create_recipe("A", &[]).await;
        app.create_recipe("B", &[]).await;

        let res = app.get(&format!("{}?per_page=0", routes::RECIPES)).await;

        assert_eq!(res.body["pagination"]["per_page"], 1);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_page_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.get(&format!("{}?page=abc", routes::RECIPES)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod recipe_update {
    use super::*;

    #[tokio::test]
    async fn rename_keeps_slug() {
        let app = TestApp::spawn().await;
        app.create_recipe("Soup", &[]).await;

        let res = app
            .patch(&routes::recipe("soup"), &json!({"name": "Tomato Soup"}))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["slug"], "soup");
        assert_eq!(res.body["name"], "Tomato Soup");
    }

    #[tokio::test]
    async fn sidebar_null_clears_and_absent_keeps() {
        let app = TestApp::spawn().await;
        app.create_recipe("Salad", &[]).await;
        app.patch(&routes::recipe("salad"), &json!({"sidebar": "Serve cold"}))
            .await;

        let res = app
            .patch(&routes::recipe("salad"), &json!({"directions": "Toss."}))
            .await;
        assert_eq!(res.body["sidebar"], "Serve cold");

        let res = app
            .patch(&routes::recipe("salad"), &json!({"sidebar": null}))
            .await;
        assert!(res.body["sidebar"].is_null());
        assert_eq!(res.body["directions"], "Toss.");
    }

    #[tokio::test]
    async fn recipe_ingredients_replace_all_entries() {
        let app = TestApp::spawn().await;
        app.create_recipe(
            "Stew",
            &[
                ("Beef", None, Some(1.0), Some("lb"), None),
                ("Carrot", None, Some(2.0), None, None),
            ],
        )
        .await;

        let res = app
            .patch(
                &routes::recipe("stew"),
                &json!({"recipe_ingredients": [
                    {"ingredient": {"name": "Lamb"}, "amount": 2, "unit": "lb"}
                ]}),
            )
            .await;

        assert_eq!(res.status, 200);
        let main = res.list("main");
        assert_eq!(main.len(), 1);
        assert_eq!(main[0]["pretty"], "2 lb Lamb");
    }

    #[tokio::test]
    async fn update_missing_recipe_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .patch(&routes::recipe("nope"), &json!({"name": "Anything"}))
            .await;

        assert_eq!(res.status, 404);
    }
}

mod recipe_entries {
    use super::*;

    #[tokio::test]
    async fn put_entry_adds_then_updates() {
        let app = TestApp::spawn().await;
        app.create_recipe("Cookies", &[("Flour", Some(0.593), Some(1.0), Some("cup"), None)])
            .await;
        app.create_ingredient("Butter", Some(0.911)).await;

        let path = routes::recipe_entry("cookies", "main", "butter");
        let res = app.put(&path, &json!({"amount": 0.5, "unit": "cup"})).await;
        assert_eq!(res.status, 200);
        let main = res.list("main");
        assert_eq!(main.len(), 2);
        assert_eq!(main[1]["pretty"], "1/2 cup Butter");

        let res = app.put(&path, &json!({"amount": 1, "unit": "tbsp"})).await;
        let main = res.list("main");
        assert_eq!(main.len(), 2);
        assert_eq!(main[1]["pretty"], "1 tbsp Butter");
        assert_eq!(main[1]["weight"], 13.47);
    }

    #[tokio::test]
    async fn list_segment_is_trimmed() {
        let app = TestApp::spawn().await;
        app.create_recipe("Cookies", &[("Flour", None, Some(1.0), Some("cup"), None)])
            .await;
        app.create_ingredient("Butter", None).await;

        let res = app
            .put(
                &routes::recipe_entry("cookies", "%20main%20", "butter"),
                &json!({"amount": 0.5, "unit": "cup"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["ingredient_lists"].as_array().unwrap().len(), 1);
        assert_eq!(res.list("main").len(), 2);

        let res = app
            .delete(&routes::recipe_entry("cookies", "%20main", "butter"))
            .await;
        assert_eq!(res.status, 204);
    }

    #[tokio::test]
    async fn put_entry_requires_existing_ingredient() {
        let app = TestApp::spawn().await;
        app.create_recipe("Cookies", &[]).await;

        let res = app
            .put(
                &routes::recipe_entry("cookies", "main", "unobtainium"),
                &json!({"amount": 1}),
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_entry_keeps_ingredient() {
        let app = TestApp::spawn().await;
        app.create_recipe("Cookies", &[("Salt", None, Some(0.5), Some("tsp"), None)])
            .await;

        let res = app
            .delete(&routes::recipe_entry("cookies", "main", "salt"))
            .await;
        assert_eq!(res.status, 204);

        let res = app.get(&routes::recipe("cookies")).await;
        assert!(res.body["ingredient_lists"].as_array().unwrap().is_empty());
        assert_eq!(app.get(&routes::ingredient("salt")).await.status, 200);

        let res = app
            .delete(&routes::recipe_entry("cookies", "main", "salt"))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn unknown_unit_hides_weight() {
        let app = TestApp::spawn().await;

        let res = app
            .create_recipe("Soup", &[("Parsley", Some(0.1), Some(2.0), Some("sprigs"), None)])
            .await;

        let main = res.list("main");
        assert_eq!(main[0]["pretty"], "2 sprigs Parsley");
        assert!(main[0].get("weight").is_none());
    }
}

mod recipe_deletion {
    use super::*;

    #[tokio::test]
    async fn delete_cascades_to_entries_only() {
        let app = TestApp::spawn().await;
        app.create_recipe("Omelette", &[("Egg", None, Some(3.0), None, None)])
            .await;

        let res = app.delete(&routes::recipe("omelette")).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get(&routes::recipe("omelette")).await.status, 404);
        let egg = app.get(&routes::ingredient("egg")).await;
        assert_eq!(egg.status, 200);
        assert!(egg.body["used_in"].as_array().unwrap().is_empty());

        let left = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeSlug.eq("omelette"))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(left, 0);
    }

    #[tokio::test]
    async fn delete_missing_recipe_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::recipe("ghost")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
