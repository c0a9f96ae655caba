pub mod api_config;
#[cfg(feature = "cli")]
pub mod cli;

pub use api_config::ApiConfig;
#[cfg(feature = "cli")]
pub use cli::CliConfig;
