use crate::core::{ConfigProvider, Lead, LeadQuery, LeadsApi};
use crate::utils::error::{LeadsError, Result};
use crate::utils::validation;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// HTTP client for the leads API.
///
/// Holds no state besides the base URL and a `reqwest::Client` whose default
/// headers carry the credentials, so it can be shared freely.
#[derive(Debug, Clone)]
pub struct LeadsApiClient {
    base_url: Url,
    client: Client,
}

#[derive(Serialize)]
struct BatchPayload<'a> {
    leads: &'a [Lead],
}

impl LeadsApiClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        validation::validate_url("base_url", config.base_url())?;
        let base_url = Url::parse(config.base_url().trim_end_matches('/')).map_err(|e| {
            LeadsError::InvalidConfigValue {
                field: "base_url".to_string(),
                value: config.base_url().to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let mut api_key = HeaderValue::from_str(config.api_key())?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout_seconds() {
            builder = builder.timeout(std::time::Duration::from_secs(timeout));
        }

        Ok(Self {
            base_url,
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends path segments to the base URL, keeping any prefix it has
    /// (e.g. `/functions/v1/leads-api`). Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends the request and parses the body as JSON regardless of status.
    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        tracing::debug!(
            "📡 {} responded with status {}",
            response.url().path(),
            response.status()
        );
        let body = response.json::<Value>().await?;
        Ok(body)
    }
}

#[async_trait]
impl LeadsApi for LeadsApiClient {
    async fn create_lead(&self, lead: &Lead) -> Result<Value> {
        let url = self.endpoint(&["leads"]);
        tracing::debug!("📡 POST {}", url);

        let payload = lead.with_default_status();
        self.send_json(self.client.post(url).json(&payload)).await
    }

    async fn get_leads(&self, query: &LeadQuery) -> Result<Value> {
        let url = self.endpoint(&["leads"]);
        tracing::debug!("📡 GET {} with {:?}", url, query);

        self.send_json(self.client.get(url).query(&query.to_query_pairs()))
            .await
    }

    async fn update_lead(&self, id: &str, fields: &Map<String, Value>) -> Result<Value> {
        let url = self.endpoint(&["leads", id]);
        tracing::debug!("📡 PUT {} ({} fields)", url, fields.len());

        self.send_json(self.client.put(url).json(fields)).await
    }

    async fn create_leads_batch(&self, leads: &[Lead]) -> Result<Value> {
        let url = self.endpoint(&["leads", "batch"]);
        tracing::debug!("📡 POST {} with {} leads", url, leads.len());

        self.send_json(self.client.post(url).json(&BatchPayload { leads }))
            .await
    }

    async fn health_check(&self) -> Result<Value> {
        let url = self.endpoint(&["health"]);
        tracing::debug!("📡 GET {}", url);

        self.send_json(self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    const PREFIX: &str = "/functions/v1/leads-api";
    const KEY: &str = "test-anon-key";

    fn client_for(server: &MockServer) -> LeadsApiClient {
        let config = ApiConfig::new(server.url(PREFIX), KEY);
        LeadsApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let config = ApiConfig::new("https://example.com/functions/v1/leads-api/", KEY);
        let client = LeadsApiClient::new(&config).unwrap();

        assert_eq!(
            client.endpoint(&["leads", "batch"]).as_str(),
            "https://example.com/functions/v1/leads-api/leads/batch"
        );
        assert_eq!(
            client.endpoint(&["leads", "a b/c"]).as_str(),
            "https://example.com/functions/v1/leads-api/leads/a%20b%2Fc"
        );
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        let config = ApiConfig::new("not a url", KEY);
        assert!(matches!(
            LeadsApiClient::new(&config),
            Err(LeadsError::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_rejects_base_url_without_http_scheme() {
        for base_url in ["mailto:leads@example.com", "ftp://example.com/leads-api"] {
            let config = ApiConfig::new(base_url, KEY);
            assert!(matches!(
                LeadsApiClient::new(&config),
                Err(LeadsError::InvalidConfigValue { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_create_lead_drops_blank_fields_set_directly() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("{}/leads", PREFIX))
                .json_body(json!({
                    "nome_completo": "Ana",
                    "telefone": "119999",
                    "origem": "site",
                    "tipo_contratacao": "MEI",
                    "responsavel": "Nick",
                    "status": "Novo"
                }));
            then.status(201).json_body(json!({"success": true}));
        });

        let mut lead = Lead::new("Ana", "119999", "site", "MEI", "Nick");
        lead.email = Some(String::new());
        lead.status = Some(" ".to_string());
        client_for(&server).create_lead(&lead).await.unwrap();

        api_mock.assert();
    }

    #[tokio::test]
    async fn test_health_check_sends_credentials() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path(format!("{}/health", PREFIX))
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", KEY))
                .header("apikey", KEY);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"status": "ok"}));
        });

        let result = client_for(&server).health_check().await.unwrap();

        api_mock.assert();
        assert_eq!(result, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_create_lead_sends_required_fields_and_default_status() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("{}/leads", PREFIX))
                .json_body(json!({
                    "nome_completo": "João da Silva",
                    "telefone": "11987654321",
                    "origem": "tráfego pago",
                    "tipo_contratacao": "Pessoa Física",
                    "responsavel": "Luiza",
                    "status": "Novo"
                }));
            then.status(201)
                .json_body(json!({"success": true, "data": {"id": "abc"}}));
        });

        let lead = Lead::new(
            "João da Silva",
            "11987654321",
            "tráfego pago",
            "Pessoa Física",
            "Luiza",
        );
        let result = client_for(&server).create_lead(&lead).await.unwrap();

        api_mock.assert();
        assert_eq!(result["data"]["id"], "abc");
    }

    #[tokio::test]
    async fn test_create_lead_adds_only_supplied_optional_fields() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("{}/leads", PREFIX))
                .json_body(json!({
                    "nome_completo": "Ana",
                    "telefone": "119999",
                    "origem": "site",
                    "tipo_contratacao": "MEI",
                    "responsavel": "Nick",
                    "status": "Novo",
                    "email": "ana@example.com"
                }));
            then.status(201).json_body(json!({"success": true}));
        });

        let lead = Lead::new("Ana", "119999", "site", "MEI", "Nick")
            .with_email("ana@example.com")
            .with_city("  ");
        client_for(&server).create_lead(&lead).await.unwrap();

        api_mock.assert();
    }

    #[tokio::test]
    async fn test_error_status_body_is_returned_verbatim() {
        let server = MockServer::start();
        let error_body = json!({
            "success": false,
            "error": "Dados inválidos",
            "details": ["Campo \"telefone\" é obrigatório e deve ser uma string"]
        });
        let api_mock = server.mock(|when, then| {
            when.method(POST).path(format!("{}/leads", PREFIX));
            then.status(400).json_body(error_body.clone());
        });

        let lead = Lead::new("Ana", "", "site", "MEI", "Nick");
        let result = client_for(&server).create_lead(&lead).await.unwrap();

        api_mock.assert();
        assert_eq!(result, error_body);
    }

    #[tokio::test]
    async fn test_get_leads_sends_limit_and_filters() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path(format!("{}/leads", PREFIX))
                .query_param("limit", "5")
                .query_param("status", "Novo")
                .query_param("responsavel", "Luiza");
            then.status(200)
                .json_body(json!({"success": true, "data": [], "count": 0}));
        });

        let query = LeadQuery::new().status("Novo").owner("Luiza").limit(5);
        let result = client_for(&server).get_leads(&query).await.unwrap();

        api_mock.assert();
        assert_eq!(result["count"], 0);
    }

    #[tokio::test]
    async fn test_get_leads_default_limit() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path(format!("{}/leads", PREFIX))
                .query_param("limit", "100");
            then.status(200).json_body(json!({"success": true, "data": []}));
        });

        client_for(&server)
            .get_leads(&LeadQuery::default())
            .await
            .unwrap();

        api_mock.assert();
    }

    #[tokio::test]
    async fn test_update_lead_puts_fields_as_body() {
        let server = MockServer::start();
        let lead_id = "3f6c2a1e-9d4b-4c1a-8e2f-0a1b2c3d4e5f";
        let api_mock = server.mock(|when, then| {
            when.method(PUT)
                .path(format!("{}/leads/{}", PREFIX, lead_id))
                .json_body(json!({"status": "Em contato", "email": null}));
            then.status(200).json_body(json!({"success": true}));
        });

        let mut fields = Map::new();
        fields.insert("status".to_string(), json!("Em contato"));
        fields.insert("email".to_string(), Value::Null);

        let result = client_for(&server)
            .update_lead(lead_id, &fields)
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(result["success"], true);
    }

    #[tokio::test]
    async fn test_create_leads_batch_wraps_leads() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("{}/leads/batch", PREFIX))
                .json_body(json!({
                    "leads": [
                        {
                            "nome_completo": "Maria Santos",
                            "telefone": "11912345678",
                            "origem": "indicação",
                            "tipo_contratacao": "MEI",
                            "responsavel": "Nick",
                            "email": "maria@example.com"
                        },
                        {
                            "nome_completo": "Pedro Oliveira",
                            "telefone": "11923456789",
                            "origem": "orgânico",
                            "tipo_contratacao": "CNPJ",
                            "responsavel": "Luiza"
                        }
                    ]
                }));
            then.status(200).json_body(json!({
                "success": true,
                "results": {"success": [{"index": 0}, {"index": 1}], "failed": []}
            }));
        });

        let leads = vec![
            Lead::new("Maria Santos", "11912345678", "indicação", "MEI", "Nick")
                .with_email("maria@example.com"),
            Lead::new("Pedro Oliveira", "11923456789", "orgânico", "CNPJ", "Luiza"),
        ];
        let result = client_for(&server)
            .create_leads_batch(&leads)
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(result["results"]["success"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_error() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path(format!("{}/health", PREFIX));
            then.status(502).body("<html>Bad Gateway</html>");
        });

        let result = client_for(&server).health_check().await;

        api_mock.assert();
        assert!(matches!(result, Err(LeadsError::Http(_))));
    }
}
