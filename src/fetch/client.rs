use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use urlencoding::encode;

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// Client for the two NCBI E-utilities endpoints the pipeline needs:
/// esearch (title -> PMID) and efetch (PMIDs -> PubMed XML).
pub struct EntrezClient {
    client: Client,
    base_url: String,
    email: Option<String>,
    api_key: Option<String>,
}

impl EntrezClient {
    pub fn new(
        base_url: String,
        timeout_secs: u64,
        email: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            email,
            api_key,
        }
    }

    fn auth_params(&self) -> String {
        let mut params = String::new();
        if let Some(email) = &self.email {
            params.push_str(&format!("\u{0026}email={}", encode(email)));
        }
        if let Some(key) = &self.api_key {
            params.push_str(&format!("\u{0026}api_key={}", encode(key)));
        }
        params
    }

    /// Returns Ok(Some(pmid)) on a hit, Ok(None) when the search is empty
    pub async fn esearch(&self, title: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/esearch.fcgi?db=pubmed\u{0026}retmode=json\u{0026}retmax=1\u{0026}term={}{}",
            self.base_url,
            encode(title),
            self.auth_params()
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {}", status));
        }

        let parsed: ESearchResponse = response.json().await?;
        Ok(parsed.esearchresult.idlist.into_iter().next())
    }

    /// Fetch the full PubMed XML for the given PMIDs in a single request.
    pub async fn efetch(&self, pmids: &[String]) -> Result<String> {
        let url = format!(
            "{}/efetch.fcgi?db=pubmed\u{0026}retmode=xml\u{0026}id={}{}",
            self.base_url,
            pmids.join(","),
            self.auth_params()
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {}", status));
        }

        Ok(response.text().await?)
    }
}
