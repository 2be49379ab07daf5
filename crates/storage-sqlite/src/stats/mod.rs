//! SQLite storage implementation for daily statistics.

mod model;
mod repository;

pub use model::DailyStatDB;
pub use repository::DailyStatRepository;
