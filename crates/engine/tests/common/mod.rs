#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Car, CarInput, Engine, FuelType, RequiredLicence, Role, User, UserRegistration,
};
use migration::MigratorTrait;

/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub const TEST_COST: u32 = 4;

pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub admin: User,
    pub staff: User,
    pub renter: User,
}

pub async fn engine_with_db(notify_timeout: Option<chrono::Duration>) -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .password_cost(TEST_COST)
        .notify_timeout(notify_timeout)
        .build()
        .await
        .unwrap();

    let admin = engine
        .create_account(&registration("admin"), Role::Admin)
        .await
        .unwrap();
    let staff = engine
        .create_account(&registration("staff"), Role::Staff)
        .await
        .unwrap();
    let renter = engine.register(&registration("rita")).await.unwrap();

    Fixture {
        engine,
        db,
        admin,
        staff,
        renter,
    }
}

pub fn registration(username: &str) -> UserRegistration {
    UserRegistration {
        name: format!("{username} user"),
        username: username.to_string(),
        email: format!("{username}@rent.example"),
        password: "correct horse battery".to_string(),
        phone_number: "+36 30 123 4567".to_string(),
        licence_id: None,
        address: None,
    }
}

pub fn car_input(plate: &str, price_per_kilometer: i64, actual_kilometers: i64) -> CarInput {
    CarInput {
        brand: "Suzuki".to_string(),
        model: "Swift".to_string(),
        fuel_type: FuelType::Petrol,
        required_licence: RequiredLicence::B,
        licence_plate: plate.to_string(),
        has_valid_vignette: true,
        price_per_kilometer,
        is_automatic: false,
        actual_kilometers,
        in_proper_condition: true,
        depot_id: None,
    }
}

pub async fn car(fixture: &Fixture, plate: &str) -> Car {
    fixture
        .engine
        .create_car(fixture.staff.id, &car_input(plate, 50, 1000))
        .await
        .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
