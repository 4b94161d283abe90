use std::path::PathBuf;

use api_types::{
    FuelType, RequiredLicence,
    car::{CarCreate, CarQuery},
    rent::{RentCreate, RentHandOver, RentQuery, RentStatus, RentTakeBack},
    user::UserRegister,
};
use chrono::{DateTime, Duration, NaiveDate};
use migration::MigratorTrait;
use sea_orm::Database;
use uuid::Uuid;

use client::{Client, ClientError, Session};
use engine::{Engine, Role, UserRegistration};
use server::{ServerState, TokenIssuer, spawn_with_listener};

const PASSWORD: &str = "correct horse battery";
const TEST_COST: u32 = 4;

async fn spawn_server() -> String {
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

    let state = ServerState::new(engine, TokenIssuer::new("test secret", Duration::hours(1)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = spawn_with_listener(state, listener).unwrap();
    format!("http://{addr}/")
}

fn session_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("rental-client-{}", Uuid::new_v4()))
        .join("session.json")
}

fn client(base_url: &str) -> Client {
    Client::new(base_url, Session::empty(session_path())).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn car(plate: &str) -> CarCreate {
    CarCreate {
        brand: "Suzuki".to_string(),
        model: "Swift".to_string(),
        fuel_type: FuelType::Petrol,
        required_licence: RequiredLicence::B,
        licence_plate: plate.to_string(),
        has_valid_vignette: true,
        price_per_kilometer: 50,
        is_automatic: false,
        actual_kilometers: 1000,
        in_proper_condition: true,
        depot_id: None,
    }
}

fn registration(username: &str) -> UserRegister {
    UserRegister {
        name: format!("{username} renter"),
        username: username.to_string(),
        email: format!("{username}@rent.example"),
        password: PASSWORD.to_string(),
        phone_number: "+36 30 123 4567".to_string(),
        licence_id: None,
        address: None,
    }
}

#[tokio::test]
async fn login_persists_the_session() {
    let base_url = spawn_server().await;
    let path = session_path();
    let mut staff = Client::new(&base_url, Session::empty(&path)).unwrap();

    let result = staff.login("staff", PASSWORD).await.unwrap();
    assert!(result.succeeded);
    assert!(staff.session().is_staff());
    assert_eq!(staff.me().await.unwrap().username.as_deref(), Some("staff"));

    let restored = Session::init(&path, chrono::Utc::now()).unwrap();
    assert_eq!(restored.token(), staff.session().token());

    staff.logout().unwrap();
    assert!(!path.exists());
    assert!(matches!(
        staff.me().await,
        Err(ClientError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let base_url = spawn_server().await;
    let mut anonymous = client(&base_url);

    let err = anonymous.login("staff", "nope").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(err.messages(), ["Invalid credentials"]);
    assert_eq!(anonymous.session().token(), None);
}

#[tokio::test]
async fn rent_lifecycle_over_http() {
    let base_url = spawn_server().await;

    let mut staff = client(&base_url);
    staff.login("staff", PASSWORD).await.unwrap();
    let car_id = staff.create_car(&car("ABC-123")).await.unwrap().value.unwrap().id;

    let anonymous = client(&base_url);
    let registered = anonymous.register(&registration("rita")).await.unwrap();
    assert!(registered.succeeded);

    let mut rita = client(&base_url);
    rita.login("rita", PASSWORD).await.unwrap();
    assert!(!rita.session().is_staff());

    let rent = rita
        .create_rent(&RentCreate {
            car_id,
            renter_id: None,
            planned_start: date(2024, 6, 1),
            planned_end: date(2024, 6, 4),
            invoice_request: false,
        })
        .await
        .unwrap()
        .value
        .unwrap();
    assert_eq!(rent.status, RentStatus::Pending);
    assert_eq!(Some(rent.renter_id), rita.session().user_id());

    assert!(matches!(
        rita.approve_rent(rent.id).await,
        Err(ClientError::Forbidden(_))
    ));

    let approved = staff.approve_rent(rent.id).await.unwrap();
    assert_eq!(approved.status, RentStatus::Approved);

    let handed = staff
        .hand_over(
            rent.id,
            &RentHandOver {
                actual_start: Some(DateTime::parse_from_rfc3339("2024-06-01T10:00:00+02:00").unwrap()),
            },
        )
        .await
        .unwrap();
    assert_eq!(handed.status, RentStatus::HandedOver);
    assert_eq!(
        handed.actual_start.map(|at| at.to_rfc3339()),
        Some("2024-06-01T08:00:00+00:00".to_string())
    );

    let returned = staff
        .take_back(
            rent.id,
            &RentTakeBack {
                actual_end: None,
                ending_kilometer: 1200,
                in_proper_condition: Some(true),
            },
        )
        .await
        .unwrap();
    assert_eq!(returned.status, RentStatus::Returned);

    let receipt = staff.issue_receipt(rent.id).await.unwrap().value.unwrap();
    assert_eq!(receipt.total_cost, 10_000);
    assert_eq!(rita.receipt_for_rent(rent.id).await.unwrap(), receipt);

    let mine = rita.rents(&RentQuery::default()).await.unwrap();
    assert_eq!(mine.rents.len(), 1);
    assert_eq!(mine.rents[0].status, RentStatus::Invoiced);

    let stats = staff.statistics().await.unwrap();
    assert_eq!(stats.cars_total, 1);
}

#[tokio::test]
async fn conflicts_and_validation_surface_as_variants() {
    let base_url = spawn_server().await;
    let mut staff = client(&base_url);
    staff.login("staff", PASSWORD).await.unwrap();
    let car_id = staff.create_car(&car("XYZ-987")).await.unwrap().value.unwrap().id;

    let booking = |start: NaiveDate, end: NaiveDate| RentCreate {
        car_id,
        renter_id: None,
        planned_start: start,
        planned_end: end,
        invoice_request: false,
    };

    let anonymous = client(&base_url);
    anonymous.register(&registration("olga")).await.unwrap();
    let mut olga = client(&base_url);
    olga.login("olga", PASSWORD).await.unwrap();

    olga.create_rent(&booking(date(2024, 7, 1), date(2024, 7, 5)))
        .await
        .unwrap();
    assert!(matches!(
        olga.create_rent(&booking(date(2024, 7, 4), date(2024, 7, 8))).await,
        Err(ClientError::Conflict(_))
    ));
    olga.create_rent(&booking(date(2024, 7, 5), date(2024, 7, 8)))
        .await
        .unwrap();

    assert!(matches!(
        olga.create_rent(&booking(date(2024, 8, 5), date(2024, 8, 1))).await,
        Err(ClientError::Validation(_))
    ));
    assert!(matches!(
        olga.rent(Uuid::new_v4()).await,
        Err(ClientError::NotFound(_))
    ));

    let free = anonymous
        .cars(&CarQuery {
            start_date: Some(date(2024, 7, 2)),
            end_date: Some(date(2024, 7, 3)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(free.is_empty());
}
