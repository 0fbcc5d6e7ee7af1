pub mod analytics;
pub mod auth;
pub mod studies;
pub mod users;
