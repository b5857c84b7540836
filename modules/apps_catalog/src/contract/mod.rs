pub mod client;
pub mod error;
pub mod model;

pub use client::AppsCatalogApi;
pub use error::AppsCatalogError;
pub use model::{App, JobType, NewApp, NewAppVersion, Runtime};
