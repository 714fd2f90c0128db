use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::domain::Accession;
use crate::error::KiraError;

pub const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const NUCLEOTIDE_DB: &str = "nucleotide";
pub const DEFAULT_TOOL: &str = "kira-bt";

/// Caller identification required by the E-utilities usage policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrezContact {
    pub email: String,
    pub tool: String,
    pub api_key: Option<String>,
}

impl EntrezContact {
    pub fn new(email: &str) -> Result<Self, KiraError> {
        let email = email.trim();
        let valid = match email.split_once('@') {
            Some((user, domain)) => {
                !user.is_empty()
                    && !domain.is_empty()
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(KiraError::InvalidEmail(email.to_string()));
        }
        Ok(Self {
            email: email.to_string(),
            tool: DEFAULT_TOOL.to_string(),
            api_key: None,
        })
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub accession_version: String,
    pub title: String,
}

pub trait SummaryClient: Send + Sync {
    fn summaries(&self, db: &str, ids: &[Accession]) -> Result<Vec<DocumentSummary>, KiraError>;
}

impl<C: SummaryClient + ?Sized> SummaryClient for &C {
    fn summaries(&self, db: &str, ids: &[Accession]) -> Result<Vec<DocumentSummary>, KiraError> {
        (**self).summaries(db, ids)
    }
}

#[derive(Clone)]
pub struct EntrezHttpClient {
    client: Client,
    base_url: String,
    contact: EntrezContact,
}

impl EntrezHttpClient {
    pub fn new(contact: EntrezContact) -> Result<Self, KiraError> {
        Self::with_base_url(contact, EUTILS_BASE)
    }

    pub fn with_base_url(contact: EntrezContact, base_url: &str) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-bt/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::NcbiHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            contact,
        })
    }

    fn query_params(&self, db: &str, ids: &[Accession]) -> Vec<(&'static str, String)> {
        let id_list = ids
            .iter()
            .map(Accession::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let mut params = vec![
            ("db", db.to_string()),
            ("id", id_list),
            ("retmode", "json".to_string()),
            ("tool", self.contact.tool.clone()),
            ("email", self.contact.email.clone()),
        ];
        if let Some(api_key) = &self.contact.api_key {
            params.push(("api_key", api_key.clone()));
        }
        params
    }
}

impl SummaryClient for EntrezHttpClient {
    fn summaries(&self, db: &str, ids: &[Accession]) -> Result<Vec<DocumentSummary>, KiraError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/esummary.fcgi", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&self.query_params(db, ids))
            .send()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "esummary request failed".to_string());
            return Err(KiraError::NcbiStatus { status, message });
        }
        let payload: Value = response
            .json()
            .map_err(|err| KiraError::NcbiPayload(err.to_string()))?;
        parse_esummary(&payload)
    }
}

/// Extracts `accessionversion`/`title` pairs from an esummary JSON payload.
///
/// Documents flagged with a per-record `error`, or lacking either field, are
/// skipped. A top-level `error` or a missing `result` block fails the call.
pub fn parse_esummary(payload: &Value) -> Result<Vec<DocumentSummary>, KiraError> {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        return Err(KiraError::NcbiPayload(message.to_string()));
    }
    let result = payload
        .get("result")
        .ok_or_else(|| KiraError::NcbiPayload("missing `result` block".to_string()))?;
    let uids = result
        .get("uids")
        .and_then(Value::as_array)
        .ok_or_else(|| KiraError::NcbiPayload("missing `result.uids` list".to_string()))?;

    let mut summaries = Vec::new();
    for uid in uids.iter().filter_map(Value::as_str) {
        let doc = &result[uid];
        if doc.get("error").is_some() {
            continue;
        }
        let accession = doc["accessionversion"].as_str().unwrap_or_default().trim();
        let title = doc["title"].as_str().unwrap_or_default().trim();
        if accession.is_empty() || title.is_empty() {
            continue;
        }
        summaries.push(DocumentSummary {
            accession_version: accession.to_string(),
            title: title.to_string(),
        });
    }
    Ok(summaries)
}
