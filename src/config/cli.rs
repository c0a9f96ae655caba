use clap::{CommandFactory, Parser};
use std::path::PathBuf;

const CSV_FORMAT_HELP: &str = "\
CSV format:
  Required columns: nome_completo, telefone, origem, tipo_contratacao, responsavel
  Optional columns: email, cidade, regiao, operadora_atual, status, observacoes

The API endpoint and key are read from LEADS_API_URL and LEADS_API_KEY,
or from the TOML file named by LEADS_API_CONFIG.

Example:
  leads-import leads.csv";

#[derive(Debug, Clone, Parser)]
#[command(name = "leads-import")]
#[command(about = "Import leads from a CSV file into the leads API in a single batch")]
#[command(after_help = CSV_FORMAT_HELP)]
pub struct CliConfig {
    /// Path to the CSV file to import
    #[arg(value_name = "CSV_FILE")]
    pub csv_file: Option<PathBuf>,
}

impl CliConfig {
    /// Full help text, shown when the CSV path is missing.
    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}
