use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelType {
    Diesel,
    Petrol,
    Hybrid,
    Electric,
}

/// Driving licence category required to rent a car.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredLicence {
    #[serde(rename = "AM")]
    Am,
    A1,
    A2,
    A,
    B,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Renter,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Renter => "Renter",
            Self::Staff => "Staff",
            Self::Admin => "Admin",
        }
    }
}

pub mod result {
    use super::*;

    /// Uniform outcome of an operation without payload.
    ///
    /// Expected business failures (validation, invalid transitions, bad
    /// credentials) are reported here instead of as transport errors.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ServiceResult {
        pub succeeded: bool,
        pub errors: Vec<String>,
    }

    impl ServiceResult {
        pub fn success() -> Self {
            Self {
                succeeded: true,
                errors: Vec::new(),
            }
        }

        pub fn failure(errors: Vec<String>) -> Self {
            Self {
                succeeded: false,
                errors,
            }
        }
    }

    /// Outcome of a create operation, carrying the created value on success.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CreateResult<T> {
        pub succeeded: bool,
        pub errors: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub value: Option<T>,
    }

    impl<T> CreateResult<T> {
        pub fn success(value: T) -> Self {
            Self {
                succeeded: true,
                errors: Vec::new(),
                value: Some(value),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LoginResult {
        pub succeeded: bool,
        pub errors: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub token: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub user: Option<super::user::UserGet>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RegistrationResult {
        pub succeeded: bool,
        pub errors: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub user_id: Option<Uuid>,
    }
}

pub mod address {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AddressDto {
        pub zip: String,
        pub city: String,
        pub street: String,
        pub house_number: String,
    }
}

pub mod car {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum CarStatus {
        Available,
        Rented,
        Deleted,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CarCreate {
        pub brand: String,
        pub model: String,
        pub fuel_type: FuelType,
        pub required_licence: RequiredLicence,
        pub licence_plate: String,
        pub has_valid_vignette: bool,
        /// Price per driven kilometer in minor units (cents).
        pub price_per_kilometer: i64,
        pub is_automatic: bool,
        pub actual_kilometers: i64,
        pub in_proper_condition: bool,
        pub depot_id: Option<Uuid>,
    }

    /// Partial update; absent fields are left unchanged.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CarUpdate {
        pub brand: Option<String>,
        pub model: Option<String>,
        pub fuel_type: Option<FuelType>,
        pub required_licence: Option<RequiredLicence>,
        pub licence_plate: Option<String>,
        pub has_valid_vignette: Option<bool>,
        pub price_per_kilometer: Option<i64>,
        pub is_automatic: Option<bool>,
        pub actual_kilometers: Option<i64>,
        pub in_proper_condition: Option<bool>,
        pub depot_id: Option<Uuid>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CarGet {
        pub id: Uuid,
        pub brand: String,
        pub model: String,
        pub fuel_type: FuelType,
        pub required_licence: RequiredLicence,
        pub licence_plate: String,
        pub has_valid_vignette: bool,
        pub price_per_kilometer: i64,
        pub is_automatic: bool,
        pub actual_kilometers: i64,
        pub in_proper_condition: bool,
        pub depot_id: Option<Uuid>,
        pub status: CarStatus,
    }

    /// Query string for `GET /cars`.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CarQuery {
        pub include_deleted: Option<bool>,
        pub depot_id: Option<Uuid>,
        pub fuel_type: Option<FuelType>,
        /// With `end_date`, only cars free for `[start_date, end_date)`.
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
    }
}

pub mod user {
    use super::*;

    pub use super::address::AddressDto;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserRegister {
        pub name: String,
        pub username: String,
        pub email: String,
        pub password: String,
        pub phone_number: String,
        pub licence_id: Option<String>,
        pub address: Option<AddressDto>,
    }

    /// A walk-in renter registered by staff, without an account.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GuestCreate {
        pub name: String,
        pub email: String,
        pub phone_number: String,
        pub licence_id: Option<String>,
        pub address: Option<AddressDto>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserUpdate {
        pub name: Option<String>,
        pub email: Option<String>,
        pub password: Option<String>,
        pub phone_number: Option<String>,
        pub licence_id: Option<String>,
        pub address: Option<AddressDto>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Login {
        /// Username or email.
        pub identifier: String,
        pub password: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RoleUpdate {
        pub role: Role,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserGet {
        pub id: Uuid,
        pub name: String,
        pub username: Option<String>,
        pub email: String,
        pub phone_number: String,
        pub licence_id: Option<String>,
        pub address: Option<AddressDto>,
        pub role: Role,
        pub registered: bool,
    }
}

pub mod depot {
    use super::*;

    pub use super::address::AddressDto;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DepotCreate {
        pub name: String,
        pub address: AddressDto,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DepotUpdate {
        pub name: Option<String>,
        pub address: Option<AddressDto>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DepotGet {
        pub id: Uuid,
        pub name: String,
        pub address: AddressDto,
    }
}

pub mod rent {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum RentStatus {
        Pending,
        Approved,
        Rejected,
        HandedOver,
        Returned,
        Invoiced,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RentCreate {
        pub car_id: Uuid,
        /// Staff may book on behalf of a renter; renters always book for
        /// themselves.
        pub renter_id: Option<Uuid>,
        pub planned_start: NaiveDate,
        pub planned_end: NaiveDate,
        #[serde(default)]
        pub invoice_request: bool,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct RentReject {
        pub reason: Option<String>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RentHandOver {
        /// If absent, server uses now().
        pub actual_start: Option<DateTime<FixedOffset>>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RentTakeBack {
        /// If absent, server uses now().
        pub actual_end: Option<DateTime<FixedOffset>>,
        pub ending_kilometer: i64,
        pub in_proper_condition: Option<bool>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RentGet {
        pub id: Uuid,
        pub renter_id: Uuid,
        pub car_id: Uuid,
        pub status: RentStatus,
        pub planned_start: NaiveDate,
        pub planned_end: NaiveDate,
        pub actual_start: Option<DateTime<Utc>>,
        pub actual_end: Option<DateTime<Utc>>,
        pub starting_kilometer: Option<i64>,
        pub ending_kilometer: Option<i64>,
        pub approver_id: Option<Uuid>,
        pub issuer_id: Option<Uuid>,
        pub recipient_id: Option<Uuid>,
        pub rejection_reason: Option<String>,
        pub invoice_request: bool,
        pub issued_at: Option<DateTime<Utc>>,
    }

    /// Query string for `GET /rents`.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RentQuery {
        pub status: Option<RentStatus>,
        pub car_id: Option<Uuid>,
        pub renter_id: Option<Uuid>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RentListResponse {
        pub rents: Vec<RentGet>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}

pub mod receipt {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceiptGet {
        pub id: Uuid,
        pub rent_id: Uuid,
        /// Total in minor units (cents).
        pub total_cost: i64,
        pub issue_date: DateTime<Utc>,
        pub issuer_id: Uuid,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceiptCorrect {
        pub total_cost: i64,
    }
}

pub mod waiting_list {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum WaitingListStatus {
        Active,
        Notified,
        Booked,
        Canceled,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WaitingListJoin {
        /// Staff may enqueue on behalf of a user.
        pub user_id: Option<Uuid>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WaitingListEntryGet {
        pub id: Uuid,
        pub car_id: Uuid,
        pub user_id: Uuid,
        pub queue_position: i64,
        pub status: WaitingListStatus,
        pub created_at: DateTime<Utc>,
        pub notified_at: Option<DateTime<Utc>>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpiredEntries {
        pub expired: u64,
    }
}

pub mod stats {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Statistics {
        pub cars_total: u64,
        pub cars_available: u64,
        pub cars_rented: u64,
        pub cars_deleted: u64,
        pub rents_pending: u64,
        pub rents_approved: u64,
        pub rents_rejected: u64,
        pub rents_handed_over: u64,
        pub rents_returned: u64,
        pub rents_invoiced: u64,
        pub waiting_list_open: u64,
        /// Sum of all receipts in minor units.
        pub revenue_total: i64,
        pub kilometers_driven: i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_keeps_error_order() {
        let result = result::ServiceResult::failure(vec!["first".to_string(), "second".to_string()]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"succeeded": false, "errors": ["first", "second"]})
        );
    }

    #[test]
    fn failed_login_omits_token() {
        let result = result::LoginResult {
            succeeded: false,
            errors: vec!["invalid credentials".to_string()],
            token: None,
            user: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("token").is_none());
    }

    #[test]
    fn rent_dates_use_camel_case_and_plain_dates() {
        let create = rent::RentCreate {
            car_id: Uuid::nil(),
            renter_id: None,
            planned_start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            planned_end: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            invoice_request: false,
        };
        let json = serde_json::to_value(&create).unwrap();
        assert_eq!(json["plannedStart"], "2024-06-01");
        assert_eq!(json["plannedEnd"], "2024-06-03");
    }

    #[test]
    fn licence_am_uses_upper_case_code() {
        let json = serde_json::to_string(&RequiredLicence::Am).unwrap();
        assert_eq!(json, "\"AM\"");
    }
}
