#![warn(clippy::unwrap_used)]

pub mod dataset_rest;
pub mod rest;
pub mod server;
pub mod swagger;
pub mod targeting_rest;

pub use rest::AppState;
pub use server::ApiServer;
pub use swagger::ApiDoc;
