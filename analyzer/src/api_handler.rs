//! Blocking client for the NCBI E-utilities efetch endpoint.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const MAX_ATTEMPTS: u32 = 3;

pub struct ApiHandler {
    client: Client,
    base_url: String,
}

impl ApiHandler {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("text/plain"));
        headers.insert(USER_AGENT, HeaderValue::from_static("analyzer/0.1"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PipelineError::Retrieval {
                status: None,
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn get_text(&self, endpoint: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.make_request_with_retry(&url, MAX_ATTEMPTS)
    }

    fn make_request_with_retry(&self, url: &str, max_attempts: u32) -> Result<String> {
        let mut attempts = 0;

        loop {
            let response =
                self.client
                    .get(url)
                    .send()
                    .map_err(|e| PipelineError::Retrieval {
                        status: None,
                        reason: e.to_string(),
                    })?;

            if response.status().is_success() {
                return response.text().map_err(|e| PipelineError::Retrieval {
                    status: None,
                    reason: e.to_string(),
                });
            } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                attempts += 1;
                if attempts >= max_attempts {
                    return Err(PipelineError::Retrieval {
                        status: Some(response.status().as_u16()),
                        reason: format!("exceeded maximum retries for URL: {url}"),
                    });
                }

                let wait_time = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!("Rate limited. Waiting {wait_time} seconds before retrying...");
                thread::sleep(Duration::from_secs(wait_time));
            } else {
                let status = response.status();
                let error_text = response.text().unwrap_or_default();
                return Err(PipelineError::Retrieval {
                    status: Some(status.as_u16()),
                    reason: format!(
                        "failed to fetch data from URL: {url}. Status: {status}. Error: {error_text}"
                    ),
                });
            }
        }
    }
}

/// Fetch one annotated nucleotide record as GenBank flat-file text.
///
/// `email` and `tool` identify the caller per the NCBI usage policy.
pub fn fetch_genbank(accession: &str, email: &str, tool: &str) -> Result<String> {
    let api = ApiHandler::new(EUTILS_BASE_URL)?;
    let endpoint = format!(
        "/efetch.fcgi?db=nucleotide&id={accession}&rettype=gb&retmode=text&tool={tool}&email={email}"
    );
    debug!("efetch {accession}");
    api.get_text(&endpoint)
}
