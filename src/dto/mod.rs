pub mod auth;
pub mod clients;
pub mod custom;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod uploads;
pub mod users;
