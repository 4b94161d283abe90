use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, Role, UserRegistration};
use server::{ServerState, TokenIssuer, router};

const PASSWORD: &str = "correct horse battery";
const TEST_COST: u32 = 4;

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .password_cost(TEST_COST)
        .build()
        .await
        .unwrap();
    engine
        .create_account(
            &UserRegistration {
                name: "Desk".to_string(),
                username: "staff".to_string(),
                email: "staff@rent.example".to_string(),
                password: PASSWORD.to_string(),
                phone_number: "+36 1 234 5678".to_string(),
                licence_id: None,
                address: None,
            },
            Role::Staff,
        )
        .await
        .unwrap();

    router(ServerState::new(
        engine,
        TokenIssuer::new("test secret", Duration::hours(1)),
    ))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router, identifier: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"identifier": identifier, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["succeeded"], true);
    body["token"].as_str().unwrap().to_string()
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({
            "name": format!("{username} renter"),
            "username": username,
            "email": format!("{username}@rent.example"),
            "password": PASSWORD,
            "phoneNumber": "+36 30 123 4567",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["succeeded"], true);
    login(app, username).await
}

async fn create_car(app: &Router, token: &str, plate: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/cars",
        Some(token),
        Some(json!({
            "brand": "Suzuki",
            "model": "Swift",
            "fuelType": "Petrol",
            "requiredLicence": "B",
            "licencePlate": plate,
            "hasValidVignette": true,
            "pricePerKilometer": 50,
            "isAutomatic": false,
            "actualKilometers": 1000,
            "inProperCondition": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["value"]["id"].as_str().unwrap().to_string()
}

async fn book(app: &Router, token: &str, car_id: &str, start: &str, end: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/rents",
        Some(token),
        Some(json!({"carId": car_id, "plannedStart": start, "plannedEnd": end})),
    )
    .await
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, _) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["succeeded"], false);

    let (status, _) = send(&app, Method::GET, "/users/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "staff").await;
    let (status, body) = send(&app, Method::GET, "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "staff");
    assert_eq!(body["role"], "Staff");
}

#[tokio::test]
async fn wrong_password_is_an_envelope() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"identifier": "staff", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["succeeded"], false);
    assert_eq!(body["errors"], json!(["Invalid credentials"]));
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn registration_errors_come_back_in_rule_order() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({
            "name": "",
            "username": "ok_name",
            "email": "broken",
            "password": PASSWORD,
            "phoneNumber": "+36 30 123 4567",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["succeeded"], false);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0], "name is required");
}

#[tokio::test]
async fn cars_are_readable_without_login() {
    let app = app().await;
    let staff = login(&app, "staff").await;
    let car_id = create_car(&app, &staff, "ABC-123").await;

    let (status, body) = send(&app, Method::GET, "/cars", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, &format!("/cars/{car_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Available");
    assert_eq!(body["pricePerKilometer"], 50);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/cars/{car_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rental_lifecycle_ends_in_a_receipt() {
    let app = app().await;
    let staff = login(&app, "staff").await;
    let renter = register(&app, "rita").await;
    let car_id = create_car(&app, &staff, "ABC-123").await;

    let (status, body) = book(&app, &renter, &car_id, "2024-06-01", "2024-06-03").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let rent_id = body["value"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["value"]["status"], "Pending");
    assert_eq!(body["value"]["plannedStart"], "2024-06-01");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/rents/{rent_id}/approve"),
        Some(&renter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["succeeded"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/rents/{rent_id}/approve"),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/rents/{rent_id}/hand-over"),
        Some(&staff),
        Some(json!({"actualStart": "2024-06-01T10:00:00+02:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["startingKilometer"], 1000);
    assert_eq!(body["actualStart"], "2024-06-01T08:00:00Z");

    let (_, car) = send(&app, Method::GET, &format!("/cars/{car_id}"), None, None).await;
    assert_eq!(car["status"], "Rented");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/rents/{rent_id}/take-back"),
        Some(&staff),
        Some(json!({"actualEnd": "2024-06-03T09:00:00Z", "endingKilometer": 1200})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "Returned");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/rents/{rent_id}/receipt"),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["value"]["totalCost"], 10_000);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/rents/{rent_id}/receipt"),
        Some(&renter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCost"], 10_000);

    let (_, stats) = send(&app, Method::GET, "/statistics", Some(&staff), None).await;
    assert_eq!(stats["rentsInvoiced"], 1);
    assert_eq!(stats["revenueTotal"], 10_000);
    let (status, _) = send(&app, Method::GET, "/statistics", Some(&renter), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn double_booking_is_a_conflict() {
    let app = app().await;
    let staff = login(&app, "staff").await;
    let renter = register(&app, "rita").await;
    let car_id = create_car(&app, &staff, "ABC-123").await;

    let (status, _) = book(&app, &renter, &car_id, "2024-06-01", "2024-06-05").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = book(&app, &renter, &car_id, "2024-06-03", "2024-06-04").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["errors"],
        json!(["car is already booked from 2024-06-01 to 2024-06-05"])
    );

    let (status, _) = book(&app, &renter, &car_id, "2024-06-05", "2024-06-06").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = book(&app, &renter, &car_id, "2024-07-02", "2024-07-01").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"],
        json!(["planned end must be after planned start"])
    );

    let (status, body) = send(&app, Method::GET, "/rents?limit=1", Some(&renter), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rents"].as_array().unwrap().len(), 1);
    let cursor = body["nextCursor"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/rents?limit=1&cursor={cursor}"),
        Some(&renter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rents"].as_array().unwrap().len(), 1);
    assert!(body["nextCursor"].is_null());
}

#[tokio::test]
async fn waiting_list_over_http() {
    let app = app().await;
    let staff = login(&app, "staff").await;
    let renter = register(&app, "rita").await;
    let car_id = create_car(&app, &staff, "ABC-123").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/cars/{car_id}/waiting-list"),
        Some(&renter),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let entry_id = body["value"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["value"]["queuePosition"], 1);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/cars/{car_id}/waiting-list"),
        Some(&renter),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/cars/{car_id}/waiting-list/notify"),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], entry_id.as_str());
    assert_eq!(body["status"], "Notified");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/waiting-list/{entry_id}/confirm"),
        Some(&renter),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Booked");
}
