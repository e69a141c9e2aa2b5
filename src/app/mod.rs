pub mod auth;
pub mod comments;
pub mod error;
pub mod images;
pub mod likes;
pub mod posts;
pub mod tokens;
