pub mod admin;
pub mod cards;
pub mod health;
pub mod leaderboard;
pub mod rooms;
pub mod routes;
pub mod sponsors;
pub mod subscription;
pub mod users;
