pub mod application_service;
pub mod auth_service;
pub mod cart_service;
pub mod order_service;
pub mod profile_service;
