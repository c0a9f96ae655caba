use anyhow::{Context, Result};
use chrono::{Duration, Local};
use leads_client::utils::logger;
use leads_client::{ApiConfig, Lead, LeadQuery, LeadsApi, LeadsApiClient};
use serde_json::Value;

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_from_env();

    let config = ApiConfig::load().context("loading API configuration")?;
    let api = LeadsApiClient::new(&config).context("building API client")?;
    tracing::info!("Using leads API at {}", api.base_url());

    println!("=== 1: Health check ===");
    print_json(&api.health_check().await?)?;

    println!("\n=== 2: Create a single lead ===");
    let callback = Local::now().date_naive() + Duration::days(3);
    let lead = Lead::new(
        "João da Silva",
        "11987654321",
        "tráfego pago",
        "Pessoa Física",
        "Luiza",
    )
    .with_email("joao@example.com")
    .with_city("São Paulo")
    .with_region("SP")
    .with_next_callback_date(callback)
    .with_notes("Test lead created by leads-demo");
    let created = api.create_lead(&lead).await?;
    print_json(&created)?;

    if created.get("success").and_then(Value::as_bool) == Some(true) {
        println!("\n✓ Lead created");
    } else {
        println!("\n✗ Lead was not created");
    }

    println!("\n=== 3: Query leads ===");
    let query = LeadQuery::new().status("Novo").limit(5);
    print_json(&api.get_leads(&query).await?)?;

    println!("\n=== 4: Create leads in batch ===");
    let batch = vec![
        Lead::new("Maria Santos", "11912345678", "indicação", "MEI", "Nick")
            .with_email("maria@example.com"),
        Lead::new("Pedro Oliveira", "11923456789", "orgânico", "CNPJ", "Luiza"),
    ];
    print_json(&api.create_leads_batch(&batch).await?)?;

    if let Some(id) = created.pointer("/data/id").and_then(Value::as_str) {
        println!("\n=== 5: Update the lead created in step 2 ===");
        let mut fields = serde_json::Map::new();
        fields.insert("status".to_string(), Value::from("Em contato"));
        print_json(&api.update_lead(id, &fields).await?)?;
    }

    Ok(())
}
