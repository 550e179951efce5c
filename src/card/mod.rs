pub mod catalog;
pub mod types;

pub use catalog::{CardCatalog, CatalogError};
pub use types::{Card, CardType};
