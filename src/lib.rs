pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod pricing;
pub mod response;
pub mod roles;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod validate;
