use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One ingredient line in a named list ("main", "topping", ...) of a recipe.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_ingredient")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub recipe_slug: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ingredient_slug: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub list: String,

    #[sea_orm(belongs_to, from = "recipe_slug", to = "slug")]
    pub recipe: HasOne<super::recipe::Entity>,
    #[sea_orm(belongs_to, from = "ingredient_slug", to = "slug")]
    pub ingredient: HasOne<super::ingredient::Entity>,

    pub amount: Option<f64>,
    pub unit: Option<String>,

    #[sea_orm(default_value = 0)]
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
