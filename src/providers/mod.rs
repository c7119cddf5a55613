pub mod oracle_api;
pub mod util;

pub use oracle_api::HttpBackend;
