pub mod config;
pub mod error;
pub mod logging;

pub use config::FasalConfig;
pub use error::AdvisoryError;
pub use logging::{init_logging, init_logging_to_dir};
