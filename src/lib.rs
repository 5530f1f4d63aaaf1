pub mod data_source;
pub mod databases;
pub mod http;
pub mod http_client;
pub mod resource_id;
pub mod timeouts;
pub mod token;

pub use data_source::{DATA_SOURCE_NAME, DatabaseDataSource, FeatureMode};
pub use resource_id::{ClusterId, DatabaseId, ParseError};
