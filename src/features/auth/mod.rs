pub mod dtos;
pub mod handlers;
pub mod model;
pub mod models;
pub mod password;
pub mod routes;
pub mod services;
pub mod session;

pub use services::AuthService;
