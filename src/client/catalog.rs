use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use serde::{Deserialize, Serialize};

use url::Url;

use crate::error::{Error, Result};

/// Placeholder id sent when no ids are requested, so the catalog does not return everything
const NO_COURSE_ID: &str = "-";

/// A course as described by the catalog service.
/// Fields the service adds beyond the typed ones are passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub price: f64,
    /// Minimum tier required to enroll
    pub subscription_id: i32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One page of courses, with the total count of matching courses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoursePage {
    pub courses: Vec<Course>,
    pub count: u64,
}

#[derive(Debug)]
pub struct CatalogClient {
    client: Client,
    api_courses_url: Url,
}

impl CatalogClient {
    pub fn new(api_base_url: Url, api_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_courses_url = api_base_url
            .join("courses/")
            .context("Failed to create courses endpoint URL")?;

        Ok(Self {
            client,
            api_courses_url,
        })
    }

    /// Fetch the courses with the given ids
    #[tracing::instrument(name = "Fetch courses via API", skip(self))]
    pub async fn fetch_courses(
        &self,
        ids: &[String],
        limit: u32,
        offset: u32,
    ) -> Result<CoursePage> {
        let mut query: Vec<(&str, String)> = ids.iter().map(|id| ("ids", id.clone())).collect();
        if query.is_empty() {
            query.push(("ids", NO_COURSE_ID.into()));
        }
        query.push(("limit", limit.to_string()));
        query.push(("offset", offset.to_string()));

        let page = self
            .client
            .get(self.api_courses_url.clone())
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(page)
    }

    /// Fetch a single course, failing if the catalog does not know it
    pub async fn fetch_course(&self, id: &str) -> Result<Course> {
        self.fetch_courses(&[id.to_string()], 1, 0)
            .await?
            .courses
            .into_iter()
            .next()
            .ok_or(Error::CourseNotFound)
    }
}
