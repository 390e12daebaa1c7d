//! SQLite persistence for chat game sessions.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::StoreError;
pub use models::{NewSessionRow, SessionRow};
pub use repository::SqliteStore;
