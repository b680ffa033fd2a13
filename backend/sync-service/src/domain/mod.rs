pub mod hashtags;
pub mod models;
pub mod search;
