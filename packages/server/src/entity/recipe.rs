use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub slug: String,

    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub directions: String, // in Markdown
    #[sea_orm(column_type = "Text", nullable)]
    pub sidebar: Option<String>,
    /// Comma-separated blob ids of the recipe's images.
    #[sea_orm(column_type = "Text", nullable)]
    pub images: Option<String>,

    #[sea_orm(has_many)]
    pub entries: HasMany<super::recipe_ingredient::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
