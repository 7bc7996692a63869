pub mod api;
pub mod bridge;
