pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::ApiConfig;
pub use crate::core::{
    client::LeadsApiClient,
    importer::{CsvImporter, ImportReport},
    ImportSummary, Lead, LeadQuery, LeadsApi,
};
pub use utils::error::{LeadsError, Result};
