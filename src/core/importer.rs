use crate::core::{FailedLead, ImportSummary, Lead, LeadsApi, RowError, RowErrorKind};
use crate::domain::model::present;
use crate::utils::error::{LeadsError, Result};
use csv::StringRecord;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 5] = [
    "nome_completo",
    "telefone",
    "origem",
    "tipo_contratacao",
    "responsavel",
];

pub const OPTIONAL_COLUMNS: [&str; 6] = [
    "email",
    "cidade",
    "regiao",
    "operadora_atual",
    "status",
    "observacoes",
];

/// Leads parsed from a CSV file plus the rows that were rejected.
///
/// `lines[i]` is the file line `leads[i]` came from, so batch indices
/// reported by the server can be traced back to the file even when invalid
/// rows were skipped in between.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLeads {
    pub leads: Vec<Lead>,
    pub lines: Vec<usize>,
    pub errors: Vec<RowError>,
}

/// Row errors found in the file and, when a batch was sent, its summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub row_errors: Vec<RowError>,
    pub summary: Option<ImportSummary>,
}

/// Header name to column position. Later duplicates win.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        Self(
            headers
                .iter()
                .enumerate()
                .map(|(index, name)| (name.to_string(), index))
                .collect(),
        )
    }

    fn get<'r>(&self, row: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.0.get(name).and_then(|&index| row.get(index))
    }
}

/// Parses CSV text into leads, collecting one error per rejected row.
///
/// Row `n` of the data (0-based) is reported as line `n + 2`, the header
/// being line 1. Only I/O failures abort the parse.
pub fn parse_leads<R: Read>(reader: R) -> Result<ParsedLeads> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns = Columns::from_headers(reader.headers()?);
    let mut parsed = ParsedLeads::default();

    for (index, record) in reader.records().enumerate() {
        let line = index + 2;

        let row = match record {
            Ok(row) => row,
            Err(e) => {
                if let csv::ErrorKind::Io(_) = e.kind() {
                    return Err(e.into());
                }
                parsed.errors.push(RowError {
                    line,
                    kind: RowErrorKind::Malformed(e.to_string()),
                });
                continue;
            }
        };

        match lead_from_row(&columns, &row) {
            Ok(lead) => {
                parsed.leads.push(lead);
                parsed.lines.push(line);
            }
            Err(kind) => parsed.errors.push(RowError { line, kind }),
        }
    }

    Ok(parsed)
}

fn lead_from_row(columns: &Columns, row: &StringRecord) -> std::result::Result<Lead, RowErrorKind> {
    let required = |name: &'static str| {
        columns
            .get(row, name)
            .and_then(present)
            .ok_or(RowErrorKind::MissingField(name))
    };
    let optional = |name: &str| columns.get(row, name).and_then(present);

    Ok(Lead {
        full_name: required("nome_completo")?,
        phone: required("telefone")?,
        origin: required("origem")?,
        contract_type: required("tipo_contratacao")?,
        owner: required("responsavel")?,
        email: optional("email"),
        city: optional("cidade"),
        region: optional("regiao"),
        current_carrier: optional("operadora_atual"),
        status: optional("status"),
        next_callback: None,
        notes: optional("observacoes"),
    })
}

/// Reads the `results` section of a batch response.
///
/// Missing or oddly shaped sections count as zero; `failed[].index` is mapped
/// through `lines` to the originating file line.
pub fn summarize_batch(response: &Value, lines: &[usize]) -> ImportSummary {
    let results = response.get("results");

    let succeeded = results
        .and_then(|r| r.get("success"))
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    let failed = results
        .and_then(|r| r.get("failed"))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| failed_lead(entry, lines))
                .collect()
        })
        .unwrap_or_default();

    let server_error = match response.get("success") {
        Some(Value::Bool(false)) => Some(server_error_message(response)),
        _ => None,
    };

    ImportSummary {
        submitted: lines.len(),
        succeeded,
        failed,
        server_error,
    }
}

fn failed_lead(entry: &Value, lines: &[usize]) -> FailedLead {
    let batch_index = entry
        .get("index")
        .and_then(Value::as_u64)
        .and_then(|index| usize::try_from(index).ok());
    let line = batch_index.and_then(|index| lines.get(index).copied());
    let detail = describe(entry.get("errors").or_else(|| entry.get("error")));

    FailedLead {
        batch_index,
        line,
        detail,
    }
}

fn server_error_message(response: &Value) -> String {
    let error = describe(response.get("error"));
    match response.get("details") {
        Some(details) => format!("{} ({})", error, describe(Some(details))),
        None => error,
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(message) => message.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(Value::Null) | None => "unknown error".to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn write_row_errors<W: Write>(out: &mut W, errors: &[RowError]) -> io::Result<()> {
    writeln!(out, "=== ERRORS FOUND IN CSV ===")?;
    for error in errors {
        writeln!(out, "  - {}", error)?;
    }
    writeln!(out)
}

pub fn write_summary<W: Write>(out: &mut W, summary: &ImportSummary) -> io::Result<()> {
    writeln!(out, "\n=== IMPORT RESULT ===")?;
    writeln!(out, "Total processed: {}", summary.submitted)?;
    writeln!(out, "Succeeded: {}", summary.succeeded)?;
    writeln!(out, "Failed: {}", summary.failed_count())?;

    if let Some(error) = &summary.server_error {
        writeln!(out, "Server error: {}", error)?;
    }

    if !summary.failed.is_empty() {
        writeln!(out, "\n=== FAILED LEADS ===")?;
        for failed in &summary.failed {
            writeln!(out, "  - {}", failed)?;
        }
    }
    Ok(())
}

/// Drives one CSV import: parse, report row errors, one batch call, summary.
pub struct CsvImporter<A: LeadsApi> {
    api: A,
}

impl<A: LeadsApi> CsvImporter<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Imports `path`, writing the human-readable report to `out`.
    ///
    /// A missing file is `LeadsError::FileNotFound` and nothing is sent.
    /// Transport failures of the batch call are returned after the row
    /// errors have already been written.
    pub async fn import_file<P, W>(&self, path: P, out: &mut W) -> Result<ImportReport>
    where
        P: AsRef<Path>,
        W: Write,
    {
        let path = path.as_ref();
        let parsed = {
            let file = File::open(path).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => LeadsError::FileNotFound {
                    path: path.display().to_string(),
                },
                _ => LeadsError::Io(e),
            })?;
            parse_leads(BufReader::new(file))?
        };

        tracing::info!(
            "📥 Parsed {} valid leads and {} row errors from {}",
            parsed.leads.len(),
            parsed.errors.len(),
            path.display()
        );

        self.import_parsed(parsed, out).await
    }

    pub async fn import_parsed<W: Write>(
        &self,
        parsed: ParsedLeads,
        out: &mut W,
    ) -> Result<ImportReport> {
        let ParsedLeads {
            leads,
            lines,
            errors,
        } = parsed;

        if !errors.is_empty() {
            for error in &errors {
                tracing::warn!("⚠️ {}", error);
            }
            write_row_errors(out, &errors)?;
        }

        if leads.is_empty() {
            writeln!(out, "No valid leads found to import.")?;
            return Ok(ImportReport {
                row_errors: errors,
                summary: None,
            });
        }

        writeln!(out, "=== IMPORTING {} LEADS ===", leads.len())?;
        let response = self.api.create_leads_batch(&leads).await?;
        tracing::debug!("Batch response: {}", response);

        let summary = summarize_batch(&response, &lines);
        tracing::info!(
            "✅ Batch finished: {} succeeded, {} failed",
            summary.succeeded,
            summary.failed_count()
        );
        write_summary(out, &summary)?;

        Ok(ImportReport {
            row_errors: errors,
            summary: Some(summary),
        })
    }
}
