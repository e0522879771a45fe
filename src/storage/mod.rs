mod articles;
mod schema;
mod types;

pub use schema::{ArticleStore, StoreOptions, IN_MEMORY};
pub use types::{Article, StoreError};
