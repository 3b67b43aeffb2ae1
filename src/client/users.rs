use std::time::Duration;

use anyhow::Context;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};

use secrecy::Secret;

use serde::{Deserialize, Serialize};

use url::Url;

use crate::error::{Error, Result};

/// A user record from the user directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub last_name: String,
    pub active: bool,
    pub role: i32,
    pub date_of_birth: String,
    pub country: String,
    pub language: String,
    pub mail: String,
    #[serde(default)]
    pub favourite_courses: Vec<String>,
}

#[derive(Debug)]
pub struct UserDirectoryClient {
    client: Client,
    api_filter_url: Url,
}

impl UserDirectoryClient {
    pub fn new(api_base_url: Url, api_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_filter_url = api_base_url
            .join("users/filter-by-ids")
            .context("Failed to create user filter endpoint URL")?;

        Ok(Self {
            client,
            api_filter_url,
        })
    }

    /// Fetch users by id, forwarding the caller's authorization
    #[tracing::instrument(name = "Fetch users via API", skip(self, authorization))]
    pub async fn fetch_users(
        &self,
        ids: &[String],
        authorization: Option<&Secret<String>>,
    ) -> Result<Vec<User>> {
        use secrecy::ExposeSecret;

        let mut req = self
            .client
            .get(self.api_filter_url.clone())
            .query(&[("ids", ids.join(","))]);
        if let Some(authorization) = authorization {
            req = req.header(AUTHORIZATION, authorization.expose_secret());
        }

        let res = req.send().await?;
        if res.status() == StatusCode::FORBIDDEN {
            return Err(Error::InvalidCredentials);
        }

        let users = res.error_for_status()?.json().await?;
        Ok(users)
    }
}
