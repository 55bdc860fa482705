pub mod account;
pub mod auth;
pub mod feed;
pub mod id_codec;
