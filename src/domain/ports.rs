use crate::domain::model::{Lead, LeadQuery};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn api_key(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
}

/// Operations offered by the remote leads API.
///
/// Every method returns the response body as parsed JSON, whatever the HTTP
/// status was. Callers inspect `success`/`error` themselves.
#[async_trait]
pub trait LeadsApi: Send + Sync {
    async fn create_lead(&self, lead: &Lead) -> Result<Value>;
    async fn get_leads(&self, query: &LeadQuery) -> Result<Value>;
    async fn update_lead(&self, id: &str, fields: &Map<String, Value>) -> Result<Value>;
    async fn create_leads_batch(&self, leads: &[Lead]) -> Result<Value>;
    async fn health_check(&self) -> Result<Value>;
}
