use claims::assert_ok;

use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;

use reqwest::StatusCode;

use serde_json::{json, Value};

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{course, TestApp};

const UNKNOWN_WALLET: &str = "wallet not found";

fn user_json(id: &str) -> Value {
    json!({
        "id": id,
        "username": Username().fake::<String>(),
        "name": FirstName().fake::<String>(),
        "lastName": LastName().fake::<String>(),
        "active": true,
        "role": 1,
        "dateOfBirth": "1990-01-01",
        "country": "Argentina",
        "language": "Spanish",
        "mail": SafeEmail().fake::<String>(),
    })
}

async fn course_user_ids(app: &TestApp, course_id: &str) -> Value {
    app.course_user_ids(course_id)
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse user ids")
}

#[tokio::test]
async fn free_course_enrollment_skips_payment() {
    let app = TestApp::spawn().await;
    app.mount_course(&course("course_1", 0.0, 0)).await;
    app.accept_payments(0).await;
    app.subscribe("user_1", 0).await.unwrap();

    let res = app
        .enroll("user_1", "course_1")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CREATED, res.status());
    let enrollment: Value = res.json().await.expect("Failed to parse enrollment");
    assert_eq!("course_1", enrollment["course_id"]);
    assert_eq!(true, enrollment["active"]);
    assert_eq!(json!(["user_1"]), course_user_ids(&app, "course_1").await);
}

#[tokio::test]
async fn paid_course_charges_discounted_price_to_creator() {
    let app = TestApp::spawn().await;
    app.mount_course(&course("course_1", 100.0, 1)).await;

    Mock::given(path("/payments/deposit"))
        .and(body_json(json!({
            "senderId": "user_1",
            "amountInEthers": "75.000000000",
            "receiverId": "creator_1",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.payment_server)
        .await;
    // Ubademy Pass subscription payment
    Mock::given(path("/payments/deposit"))
        .and(body_partial_json(json!({"amountInEthers": "34.990000000"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.payment_server)
        .await;

    assert_eq!(
        StatusCode::CREATED,
        app.subscribe("user_1", 2).await.unwrap().status()
    );
    let res = app
        .enroll("user_1", "course_1")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CREATED, res.status());
}

#[tokio::test]
async fn failed_payment_leaves_no_enrollment() {
    let app = TestApp::spawn().await;
    app.mount_course(&course("course_1", 100.0, 0)).await;
    app.subscribe("user_1", 0).await.unwrap();

    Mock::given(path("/payments/deposit"))
        .respond_with(ResponseTemplate::new(400).set_body_string(UNKNOWN_WALLET))
        .expect(1)
        .mount(&app.payment_server)
        .await;

    let res = app
        .enroll("user_1", "course_1")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    let body: Value = res.json().await.expect("Failed to parse error");
    assert_eq!(UNKNOWN_WALLET, body["detail"]);
    assert_eq!(json!([]), course_user_ids(&app, "course_1").await);
}

#[tokio::test]
async fn default_tier_cannot_enroll_in_plus_course() {
    let app = TestApp::spawn().await;
    app.mount_course(&course("course_1", 10.0, 1)).await;
    app.accept_payments(0).await;
    app.subscribe("user_1", 0).await.unwrap();

    let res = app
        .enroll("user_1", "course_1")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());
}

#[tokio::test]
async fn enrolling_without_subscription_is_not_found() {
    let app = TestApp::spawn().await;
    app.mount_course(&course("course_1", 0.0, 0)).await;

    let res = app
        .enroll("user_1", "course_1")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());
}

#[tokio::test]
async fn enrolling_in_unknown_course_is_not_found() {
    let app = TestApp::spawn().await;
    app.subscribe("user_1", 0).await.unwrap();

    let empty_page = json!({"courses": [], "count": 0});
    Mock::given(path("/courses/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page))
        .mount(&app.catalog_server)
        .await;

    let res = app
        .enroll("user_1", "missing")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());
    let body: Value = res.json().await.expect("Failed to parse error");
    assert_eq!("The course you specified does not exist.", body["detail"]);
}

#[tokio::test]
async fn enrolling_twice_is_a_conflict() {
    let app = TestApp::spawn().await;
    app.mount_course(&course("course_1", 0.0, 0)).await;
    app.subscribe("user_1", 0).await.unwrap();

    assert_eq!(
        StatusCode::CREATED,
        app.enroll("user_1", "course_1").await.unwrap().status()
    );
    let res = app
        .enroll("user_1", "course_1")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CONFLICT, res.status());
}

#[tokio::test]
async fn unenroll_deactivates_and_then_fails() {
    let app = TestApp::spawn().await;
    assert_ok!(app.enrollments().enroll("user_1", "course_1").await);

    let res = app
        .unenroll("user_1", "course_1")
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());
    let enrollment: Value = res.json().await.expect("Failed to parse enrollment");
    assert_eq!(false, enrollment["active"]);

    let res = app
        .unenroll("user_1", "course_1")
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::NOT_FOUND, res.status());
}

#[tokio::test]
async fn unenroll_reaches_users_named_like_route_segments() {
    let app = TestApp::spawn().await;

    for user_id in ["course", "user", "cancel-fee"] {
        assert_ok!(app.enrollments().enroll(user_id, "c1").await);

        let res = app
            .unenroll(user_id, "c1")
            .await
            .expect("Failed to execute request");

        assert_eq!(StatusCode::OK, res.status(), "unenrolling {}", user_id);
        let enrollment: Value = res.json().await.expect("Failed to parse enrollment");
        assert_eq!(user_id, enrollment["user_id"]);
        assert_eq!(false, enrollment["active"]);
    }
}

#[tokio::test]
async fn cancelling_a_course_unenrolls_and_notifies_students() {
    let app = TestApp::spawn().await;
    assert_ok!(app.enrollments().enroll("user_1", "course_1").await);
    assert_ok!(app.enrollments().enroll("user_2", "course_1").await);

    Mock::given(method("POST"))
        .and(path("/notifications/course-state-change"))
        .and(body_json(json!({
            "usersToNotify": ["user_1", "user_2"],
            "courseName": "Rust 101",
            "courseNewState": "Cancelled",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.notification_server)
        .await;

    let res = app
        .cancel_course("course_1", "Rust 101")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NO_CONTENT, res.status());
    assert_eq!(json!([]), course_user_ids(&app, "course_1").await);
}

#[tokio::test]
async fn cancelling_succeeds_when_notification_fails() {
    let app = TestApp::spawn().await;
    assert_ok!(app.enrollments().enroll("user_1", "course_1").await);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&app.notification_server)
        .await;

    let res = app
        .cancel_course("course_1", "Rust 101")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NO_CONTENT, res.status());
    assert_eq!(json!([]), course_user_ids(&app, "course_1").await);
}

#[tokio::test]
async fn cancelling_a_course_without_students_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app
        .cancel_course("course_1", "Rust 101")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());
}

#[tokio::test]
async fn cancel_fee_sums_what_each_student_paid() {
    let app = TestApp::spawn().await;
    app.accept_payments(1).await;
    app.subscribe("user_1", 0).await.unwrap();
    app.subscribe("user_2", 2).await.unwrap();
    assert_ok!(app.enrollments().enroll("user_1", "course_1").await);
    assert_ok!(app.enrollments().enroll("user_2", "course_1").await);

    let res = app
        .cancel_fee("course_1", 100.0, 0)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let fee: f64 = res.json().await.expect("Failed to parse fee");
    assert_eq!(150.0, fee);
}

#[tokio::test]
async fn cancel_fee_without_students_is_zero() {
    let app = TestApp::spawn().await;

    let res = app
        .cancel_fee("course_1", 100.0, 0)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let fee: f64 = res.json().await.expect("Failed to parse fee");
    assert_eq!(0.0, fee);
}

#[tokio::test]
async fn course_user_ids_can_include_former_students() {
    let app = TestApp::spawn().await;
    assert_ok!(app.enrollments().enroll("user_1", "course_1").await);
    assert_ok!(app.enrollments().enroll("user_2", "course_1").await);
    assert_ok!(app.enrollments().unenroll("user_2", "course_1").await);

    let all: Value = app
        .request(
            reqwest::Method::GET,
            "subscriptions/course_1/enrollments/course/id-only",
        )
        .query(&[("only_active", "false")])
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse user ids");

    assert_eq!(json!(["user_1"]), course_user_ids(&app, "course_1").await);
    assert_eq!(json!(["user_1", "user_2"]), all);
}

#[tokio::test]
async fn course_users_are_fetched_with_caller_credentials() {
    let app = TestApp::spawn().await;
    assert_ok!(app.enrollments().enroll("user_1", "course_1").await);
    assert_ok!(app.enrollments().enroll("user_2", "course_1").await);

    Mock::given(method("GET"))
        .and(path("/users/filter-by-ids"))
        .and(query_param("ids", "user_1,user_2"))
        .and(header("Authorization", "Bearer token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([user_json("user_1"), user_json("user_2")])),
        )
        .expect(1)
        .mount(&app.users_server)
        .await;

    let res = app
        .course_users("course_1")
        .header("Authorization", "Bearer token")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let users: Value = res.json().await.expect("Failed to parse users");
    assert_eq!("user_2", users[1]["id"]);
}

#[tokio::test]
async fn course_users_rejected_by_directory_are_forbidden() {
    let app = TestApp::spawn().await;
    assert_ok!(app.enrollments().enroll("user_1", "course_1").await);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&app.users_server)
        .await;

    let res = app
        .course_users("course_1")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::FORBIDDEN, res.status());
}

#[tokio::test]
async fn course_without_students_lists_no_users() {
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.users_server)
        .await;

    let res = app
        .course_users("course_1")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let users: Value = res.json().await.expect("Failed to parse users");
    assert_eq!(json!([]), users);
}

#[tokio::test]
async fn user_courses_are_split_into_catalog_pages() {
    let app = TestApp::spawn().await;
    app.mount_course(&course("course_1", 0.0, 0)).await;
    app.mount_course(&course("course_2", 0.0, 0)).await;
    assert_ok!(app.enrollments().enroll("user_1", "course_1").await);
    assert_ok!(app.enrollments().enroll("user_1", "course_2").await);
    assert_ok!(app.enrollments().unenroll("user_1", "course_2").await);

    let res = app
        .user_courses("user_1")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let pages: Value = res.json().await.expect("Failed to parse course pages");
    assert_eq!("course_1", pages["enrolled"]["courses"][0]["id"]);
    assert_eq!("course_2", pages["unenrolled"]["courses"][0]["id"]);
    assert_eq!("A course", pages["enrolled"]["courses"][0]["description"]);
}

#[tokio::test]
async fn user_without_history_has_empty_pages() {
    let app = TestApp::spawn().await;

    let res = app
        .user_courses("user_1")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let pages: Value = res.json().await.expect("Failed to parse course pages");
    assert_eq!(
        json!({
            "enrolled": {"courses": [], "count": 0},
            "unenrolled": {"courses": [], "count": 0},
        }),
        pages
    );
}
