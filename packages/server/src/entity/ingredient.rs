use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub slug: String,

    pub name: String,
    pub density: Option<f64>, // in grams per milliliter

    #[sea_orm(has_many)]
    pub entries: HasMany<super::recipe_ingredient::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
