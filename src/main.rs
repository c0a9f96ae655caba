use clap::Parser;
use leads_client::utils::logger;
use leads_client::{ApiConfig, CliConfig, CsvImporter, LeadsApiClient, LeadsError};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();
    logger::init_from_env();

    let Some(csv_file) = cli.csv_file else {
        println!("{}", CliConfig::usage());
        std::process::exit(1);
    };

    let client = match ApiConfig::load().and_then(|config| {
        tracing::debug!("API config: {:?}", config);
        LeadsApiClient::new(&config)
    }) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting import of {}", csv_file.display());
    let importer = CsvImporter::new(client);
    let mut stdout = std::io::stdout();

    // File and transport failures end this import, not with a failing exit code.
    match importer.import_file(&csv_file, &mut stdout).await {
        Ok(_) => tracing::info!("✅ Import finished"),
        Err(e @ LeadsError::FileNotFound { .. }) => {
            tracing::error!("❌ {}", e);
            println!("Error: {}", e);
        }
        Err(e) => {
            tracing::error!("❌ Import failed: {}", e);
            println!("Error while processing file: {}", e);
        }
    }
}
