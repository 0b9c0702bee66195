pub mod api;
pub mod views;
