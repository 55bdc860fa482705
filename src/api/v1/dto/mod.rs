pub mod auth;
pub mod feed;
