pub mod catalog;
pub mod error;
pub mod http;
pub mod intake;

pub use catalog::{CatalogClient, CatalogWriter};
pub use error::ServiceError;
pub use http::RequestExecutor;
pub use intake::IntakeClient;
