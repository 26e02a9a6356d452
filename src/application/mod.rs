//! Application services layer.

pub mod error;
pub mod jobs;
pub mod layout;
pub mod render;
pub mod repos;
