mod dish_name;
mod document;
mod extract;
mod render;
mod station;

pub use document::MenuDocument;
pub use extract::{extract, Dish, MenuDigest, StationMenu};
pub use render::{menu_message, NO_MEALS_NOTICE};
pub use station::StationSpec;
