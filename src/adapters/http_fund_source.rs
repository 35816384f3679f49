//! Downloads the published fund price table.

use crate::adapters::csv_adapter::parse_fund_table;
use crate::domain::error::FundScoreError;
use crate::domain::fund::FundTable;
use crate::ports::market_data_port::FundSourcePort;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::info;

pub struct HttpFundSource {
    client: Client,
    url: String,
}

impl HttpFundSource {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, FundScoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FundScoreError::Http {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl FundSourcePort for HttpFundSource {
    fn fetch_fund_table(&self) -> Result<FundTable, FundScoreError> {
        info!(url = %self.url, "downloading fund table");
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| FundScoreError::Http { reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(FundScoreError::Http {
                reason: format!("request failed: {}", response.status()),
            });
        }

        let body = response
            .text()
            .map_err(|e| FundScoreError::Http { reason: e.to_string() })?;
        parse_fund_table(&body, &self.url)
    }
}
