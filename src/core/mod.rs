pub mod client;
pub mod importer;

pub use crate::domain::model::{
    FailedLead, ImportSummary, Lead, LeadQuery, RowError, RowErrorKind,
};
pub use crate::domain::ports::{ConfigProvider, LeadsApi};
pub use crate::utils::error::Result;
