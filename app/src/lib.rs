pub mod config;
pub mod core;
pub mod database;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod repos;
pub mod routes;
pub mod services;
pub mod utils;
