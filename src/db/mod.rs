pub mod models;
pub mod room_repo;
pub mod schema;
