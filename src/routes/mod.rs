pub mod enrich;
pub mod health;
pub mod history;
pub mod upload;
