pub mod cards;
pub mod cleanup;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
