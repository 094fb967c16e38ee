pub mod combine;
pub mod config;
pub mod info;
