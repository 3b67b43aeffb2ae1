use std::time::Duration;

use anyhow::Context;

use reqwest::{Client, StatusCode};

use serde::Serialize;

use url::Url;

use crate::error::{Error, Result};

const AMOUNT_LEN: usize = 12;

/// A deposit request for the payment service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    sender_id: String,
    amount_in_ethers: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    receiver_id: Option<String>,
}

impl Deposit {
    pub fn new(sender_id: &str, price: f64) -> Self {
        Self {
            sender_id: sender_id.into(),
            amount_in_ethers: format_ethers(price),
            receiver_id: None,
        }
    }

    /// Route the deposit to `receiver_id` rather than the platform
    pub fn to(mut self, receiver_id: &str) -> Self {
        self.receiver_id = Some(receiver_id.into());
        self
    }
}

/// Fixed-point amount the payment service expects, 12 decimals cut to 12 characters
fn format_ethers(price: f64) -> String {
    format!("{:.12}", price).chars().take(AMOUNT_LEN).collect()
}

#[derive(Debug)]
pub struct PaymentClient {
    client: Client,
    api_deposit_url: Url,
}

impl PaymentClient {
    pub fn new(api_base_url: Url, api_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_deposit_url = api_base_url
            .join("payments/deposit")
            .context("Failed to create deposit endpoint URL")?;

        Ok(Self {
            client,
            api_deposit_url,
        })
    }

    /// Deposit a payment. Anything but a 200 is a rejection carrying the service's response body.
    #[tracing::instrument(name = "Deposit a payment via API", skip(self))]
    pub async fn deposit(&self, deposit: &Deposit) -> Result<()> {
        let res = self
            .client
            .post(self.api_deposit_url.clone())
            .json(deposit)
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = res.text().await?;
        let detail = serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body));
        tracing::error!(%status, %detail, "Payment rejected");

        Err(Error::PaymentRejected {
            status: status.as_u16(),
            detail,
        })
    }
}
