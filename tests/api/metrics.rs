use claims::assert_ok;

use reqwest::StatusCode;

use serde_json::{json, Value};

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{course, TestApp};

#[tokio::test]
async fn most_enrolled_course_is_ranked_first() {
    let app = TestApp::spawn().await;
    app.mount_course(&course("course_1", 0.0, 0)).await;

    let enrollments = app.enrollments();
    assert_ok!(enrollments.enroll("user_1", "course_1").await);
    assert_ok!(enrollments.unenroll("user_1", "course_1").await);
    assert_ok!(enrollments.enroll("user_1", "course_1").await);
    assert_ok!(enrollments.enroll("user_2", "course_1").await);
    assert_ok!(enrollments.enroll("user_1", "course_2").await);

    let res = app.metrics(1).await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let metrics: Value = res.json().await.expect("Failed to parse metrics");
    assert_eq!(
        json!({
            "courses": [{"course_id": "course_1", "name": "Course course_1", "count": 3}],
            "count": 2,
        }),
        metrics
    );
}

#[tokio::test]
async fn no_enrollments_skip_the_catalog() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.catalog_server)
        .await;

    let res = app.metrics(10).await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let metrics: Value = res.json().await.expect("Failed to parse metrics");
    assert_eq!(json!({"courses": [], "count": 0}), metrics);
}

#[tokio::test]
async fn window_excludes_later_enrollments() {
    let app = TestApp::spawn().await;
    assert_ok!(app.enrollments().enroll("user_1", "course_1").await);

    let res = app
        .request(reqwest::Method::GET, "subscriptions/metrics/")
        .query(&[("min_timestamp", 0), ("max_timestamp", 1000)])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let metrics: Value = res.json().await.expect("Failed to parse metrics");
    assert_eq!(0, metrics["count"]);
}

#[tokio::test]
async fn invalid_timestamp_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let res = app
        .request(reqwest::Method::GET, "subscriptions/metrics/")
        .query(&[("max_timestamp", i64::MAX)])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
}
