pub mod app;
pub mod app_version;
