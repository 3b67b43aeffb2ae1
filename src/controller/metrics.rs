use actix_web::{web, HttpResponse};

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use crate::client::{CatalogClient, CoursePage};
use crate::repo::{CourseEnrollmentCount, Store};
use crate::workflow::{EnrollmentMetrics, EnrollmentQueryWorkflow};

use super::error::{RestError, RestResult};

/// Metrics window, as milliseconds since the epoch
#[derive(Debug, Deserialize)]
pub struct MetricsParams {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    min_timestamp: i64,
    max_timestamp: Option<i64>,
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CourseMetric {
    course_id: String,
    name: Option<String>,
    count: i64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct MetricsResponse {
    courses: Vec<CourseMetric>,
    count: usize,
}

fn timestamp(millis: i64) -> RestResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| RestError::ParseError(format!("timestamp {}", millis)))
}

/// Attach catalog names to the ranked counts, keeping courses the catalog does not know
fn with_course_names(metrics: EnrollmentMetrics, page: &CoursePage) -> MetricsResponse {
    let courses = metrics
        .courses
        .into_iter()
        .map(|CourseEnrollmentCount { course_id, count }| {
            let name = page
                .courses
                .iter()
                .find(|course| course.id == course_id)
                .map(|course| course.name.clone());
            CourseMetric {
                course_id,
                name,
                count,
            }
        })
        .collect();

    MetricsResponse {
        courses,
        count: metrics.count,
    }
}

/// Most enrolled courses within a time window
#[tracing::instrument(name = "Fetch enrollment metrics", skip(queries, catalog))]
async fn enrollment_metrics<D>(
    queries: web::Data<EnrollmentQueryWorkflow<D>>,
    catalog: web::Data<CatalogClient>,
    params: web::Query<MetricsParams>,
) -> RestResult<HttpResponse>
where
    D: Store,
{
    // Parse the window, an open end means "up to now"
    let min = timestamp(params.min_timestamp)?;
    let max = match params.max_timestamp {
        Some(millis) => timestamp(millis)?,
        None => Utc::now(),
    };

    // Rank the courses by enrollment count
    let metrics = queries
        .enrollment_metrics(params.limit as usize, min, max)
        .await?;

    // Look up course names, skipping the catalog when there is nothing to name
    let page = if metrics.courses.is_empty() {
        CoursePage::default()
    } else {
        let ids: Vec<String> = metrics
            .courses
            .iter()
            .map(|c| c.course_id.clone())
            .collect();
        catalog.fetch_courses(&ids, params.limit, 0).await?
    };

    Ok(HttpResponse::Ok().json(with_course_names(metrics, &page)))
}

pub fn configure<D>(cfg: &mut web::ServiceConfig)
where
    D: Store,
{
    cfg.service(web::resource("/metrics/").route(web::get().to(enrollment_metrics::<D>)));
}
