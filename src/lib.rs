pub mod adlist;
pub mod config;
pub mod dict;
pub mod intset;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
