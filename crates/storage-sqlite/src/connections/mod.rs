//! SQLite storage implementation for broker connections.

mod model;
mod repository;

pub use model::ConnectionDB;
pub use repository::ConnectionRepository;
