pub mod database;
pub mod models;
pub mod token_repository;

pub use database::Database;
pub use models::Token;
pub use token_repository::TokenRepository;
