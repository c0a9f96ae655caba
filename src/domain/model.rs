use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Status the API assigns to a freshly created lead.
pub const DEFAULT_STATUS: &str = "Novo";

pub const DEFAULT_QUERY_LIMIT: u32 = 100;

/// A sales prospect as the leads API accepts it.
///
/// Optional fields are `None` when not provided and are left out of the JSON
/// payload entirely, so the server applies its own defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lead {
    #[serde(rename = "nome_completo")]
    pub full_name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "origem")]
    pub origin: String,
    #[serde(rename = "tipo_contratacao")]
    pub contract_type: String,
    #[serde(rename = "responsavel")]
    pub owner: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "cidade", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "regiao", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "operadora_atual", skip_serializing_if = "Option::is_none")]
    pub current_carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "proximo_retorno", skip_serializing_if = "Option::is_none")]
    pub next_callback: Option<String>,
    #[serde(rename = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Lead {
    pub fn new(
        full_name: impl Into<String>,
        phone: impl Into<String>,
        origin: impl Into<String>,
        contract_type: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            phone: phone.into(),
            origin: origin.into(),
            contract_type: contract_type.into(),
            owner: owner.into(),
            email: None,
            city: None,
            region: None,
            current_carrier: None,
            status: None,
            next_callback: None,
            notes: None,
        }
    }

    pub fn with_email(mut self, email: impl AsRef<str>) -> Self {
        self.email = present(email.as_ref());
        self
    }

    pub fn with_city(mut self, city: impl AsRef<str>) -> Self {
        self.city = present(city.as_ref());
        self
    }

    pub fn with_region(mut self, region: impl AsRef<str>) -> Self {
        self.region = present(region.as_ref());
        self
    }

    pub fn with_current_carrier(mut self, carrier: impl AsRef<str>) -> Self {
        self.current_carrier = present(carrier.as_ref());
        self
    }

    pub fn with_status(mut self, status: impl AsRef<str>) -> Self {
        self.status = present(status.as_ref());
        self
    }

    /// Accepts anything the server parses: ISO 8601 or `YYYY-MM-DD`.
    pub fn with_next_callback(mut self, when: impl AsRef<str>) -> Self {
        self.next_callback = present(when.as_ref());
        self
    }

    pub fn with_next_callback_date(mut self, date: NaiveDate) -> Self {
        self.next_callback = Some(date.format("%Y-%m-%d").to_string());
        self
    }

    pub fn with_notes(mut self, notes: impl AsRef<str>) -> Self {
        self.notes = present(notes.as_ref());
        self
    }

    /// Copy of this lead with blank optional values dropped and `status` set
    /// to [`DEFAULT_STATUS`] when nothing is left in it.
    pub fn with_default_status(&self) -> Self {
        let mut lead = self.clone();
        for field in [
            &mut lead.email,
            &mut lead.city,
            &mut lead.region,
            &mut lead.current_carrier,
            &mut lead.status,
            &mut lead.next_callback,
            &mut lead.notes,
        ] {
            *field = field.as_deref().and_then(present);
        }
        if lead.status.is_none() {
            lead.status = Some(DEFAULT_STATUS.to_string());
        }
        lead
    }
}

/// Trimmed value, or `None` when the input is blank.
pub fn present(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Filters for `GET /leads`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadQuery {
    pub status: Option<String>,
    pub owner: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub limit: u32,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self {
            status: None,
            owner: None,
            phone: None,
            email: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl LeadQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: impl AsRef<str>) -> Self {
        self.status = present(status.as_ref());
        self
    }

    pub fn owner(mut self, owner: impl AsRef<str>) -> Self {
        self.owner = present(owner.as_ref());
        self
    }

    pub fn phone(mut self, phone: impl AsRef<str>) -> Self {
        self.phone = present(phone.as_ref());
        self
    }

    pub fn email(mut self, email: impl AsRef<str>) -> Self {
        self.email = present(email.as_ref());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// `limit` is always sent; the filters only when set.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];

        let filters = [
            ("status", &self.status),
            ("responsavel", &self.owner),
            ("telefone", &self.phone),
            ("email", &self.email),
        ];
        for (key, value) in filters {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }

        pairs
    }
}

/// Why a CSV row was left out of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowErrorKind {
    /// Column absent from the header/row, or its value is blank.
    MissingField(&'static str),
    /// The record itself could not be decoded.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub kind: RowErrorKind,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RowErrorKind::MissingField(field) => {
                write!(f, "Line {}: missing required field '{}'", self.line, field)
            }
            RowErrorKind::Malformed(reason) => {
                write!(f, "Line {}: could not process row: {}", self.line, reason)
            }
        }
    }
}

/// One entry of `results.failed` in a batch response, resolved back to the
/// CSV line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedLead {
    pub batch_index: Option<usize>,
    pub line: Option<usize>,
    pub detail: String,
}

impl fmt::Display for FailedLead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.batch_index) {
            (Some(line), _) => write!(f, "Line {}: {}", line, self.detail),
            (None, Some(index)) => write!(f, "Batch item {}: {}", index, self.detail),
            (None, None) => write!(f, "Unknown item: {}", self.detail),
        }
    }
}

/// Outcome of one batch import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: Vec<FailedLead>,
    /// Set when the server rejected the request as a whole.
    pub server_error: Option<String>,
}

impl ImportSummary {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}
