pub mod handler;
pub mod user_repository;
