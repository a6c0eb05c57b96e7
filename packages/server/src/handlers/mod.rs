pub mod health;
pub mod image;
pub mod ingredient;
pub mod recipe;
