use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use serde::Serialize;

use url::Url;

use crate::error::Result;

const COURSE_CANCELLED: &str = "Cancelled";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CourseStateChange<'a> {
    users_to_notify: &'a [String],
    course_name: &'a str,
    course_new_state: &'a str,
}

#[derive(Debug)]
pub struct NotificationClient {
    client: Client,
    api_state_change_url: Url,
}

impl NotificationClient {
    pub fn new(api_base_url: Url, api_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_state_change_url = api_base_url
            .join("notifications/course-state-change")
            .context("Failed to create course state change endpoint URL")?;

        Ok(Self {
            client,
            api_state_change_url,
        })
    }

    /// Tell `users` that `course_name` was cancelled
    #[tracing::instrument(name = "Notify course cancellation via API", skip(self))]
    pub async fn notify_cancellation(&self, users: &[String], course_name: &str) -> Result<()> {
        let body = CourseStateChange {
            users_to_notify: users,
            course_name,
            course_new_state: COURSE_CANCELLED,
        };

        self.client
            .post(self.api_state_change_url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
