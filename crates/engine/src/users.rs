//! Users: registered renters, walk-in guests and staff accounts.
//!
//! Usernames and emails are stored in their normalized form (see
//! `util::normalize_identity`), so lookups and unique indexes never depend on
//! the caller's casing. Guests carry neither a username nor a password and
//! cannot log in.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    Address, AddressInput, EngineError, addresses,
    util::{normalize_identity, normalize_optional_text, normalize_text, parse_uuid},
    validation::{Constraint, Rule, Validate, Value},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Renter,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Renter => "renter",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }

    /// Staff and admins run the rental desk.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "renter" => Ok(Self::Renter),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            other => Err(EngineError::Validation(vec![format!(
                "invalid role: {other}"
            )])),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub(crate) password_hash: Option<String>,
    pub phone_number: String,
    pub licence_id: Option<String>,
    pub address: Option<Address>,
    pub role: Role,
    /// `false` for guests created at the desk.
    pub registered: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A self-registered renter. `password_hash` must already be hashed.
    pub fn registered(input: &UserRegistration, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: normalize_text(&input.name),
            username: Some(normalize_identity(&input.username)),
            email: normalize_identity(&input.email),
            password_hash: Some(password_hash),
            phone_number: normalize_text(&input.phone_number),
            licence_id: normalize_optional_text(input.licence_id.as_deref()),
            address: input.address.as_ref().map(Address::new),
            role: Role::Renter,
            registered: true,
            created_at: Utc::now(),
        }
    }

    pub fn guest(input: &GuestInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: normalize_text(&input.name),
            username: None,
            email: normalize_identity(&input.email),
            password_hash: None,
            phone_number: normalize_text(&input.phone_number),
            licence_id: normalize_optional_text(input.licence_id.as_deref()),
            address: input.address.as_ref().map(Address::new),
            role: Role::Renter,
            registered: false,
            created_at: Utc::now(),
        }
    }

    pub fn can_log_in(&self) -> bool {
        self.registered && self.password_hash.is_some()
    }
}

/// Self-registration form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserRegistration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub licence_id: Option<String>,
    pub address: Option<AddressInput>,
}

const REGISTRATION_RULES: &[Rule] = &[
    Rule::new("name", Constraint::Required, "name is required"),
    Rule::new(
        "name",
        Constraint::Length { min: 0, max: 100 },
        "name must be at most 100 characters",
    ),
    Rule::new("username", Constraint::Required, "username is required"),
    Rule::new(
        "username",
        Constraint::Length { min: 3, max: 32 },
        "username must be between 3 and 32 characters",
    ),
    Rule::new("email", Constraint::Required, "email is required"),
    Rule::new("email", Constraint::Email, "email is not a valid address"),
    Rule::new("password", Constraint::Required, "password is required"),
    Rule::new(
        "password",
        Constraint::Length { min: 8, max: 128 },
        "password must be between 8 and 128 characters",
    ),
    Rule::new("phoneNumber", Constraint::Required, "phone number is required"),
    Rule::new("phoneNumber", Constraint::Phone, "phone number is not valid"),
    Rule::new(
        "licenceId",
        Constraint::Length { min: 0, max: 20 },
        "licence id must be at most 20 characters",
    ),
];

impl Validate for UserRegistration {
    fn rules() -> &'static [Rule] {
        REGISTRATION_RULES
    }

    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "name" => Value::Text(Some(&self.name)),
            "username" => Value::Text(Some(&self.username)),
            "email" => Value::Text(Some(&self.email)),
            "password" => Value::Text(Some(&self.password)),
            "phoneNumber" => Value::Text(Some(&self.phone_number)),
            "licenceId" => Value::Text(self.licence_id.as_deref()),
            _ => Value::Text(None),
        }
    }
}

/// A walk-in renter registered by staff, without credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuestInput {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub licence_id: Option<String>,
    pub address: Option<AddressInput>,
}

const GUEST_RULES: &[Rule] = &[
    Rule::new("name", Constraint::Required, "name is required"),
    Rule::new(
        "name",
        Constraint::Length { min: 0, max: 100 },
        "name must be at most 100 characters",
    ),
    Rule::new("email", Constraint::Required, "email is required"),
    Rule::new("email", Constraint::Email, "email is not a valid address"),
    Rule::new("phoneNumber", Constraint::Required, "phone number is required"),
    Rule::new("phoneNumber", Constraint::Phone, "phone number is not valid"),
    Rule::new(
        "licenceId",
        Constraint::Length { min: 0, max: 20 },
        "licence id must be at most 20 characters",
    ),
];

impl Validate for GuestInput {
    fn rules() -> &'static [Rule] {
        GUEST_RULES
    }

    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "name" => Value::Text(Some(&self.name)),
            "email" => Value::Text(Some(&self.email)),
            "phoneNumber" => Value::Text(Some(&self.phone_number)),
            "licenceId" => Value::Text(self.licence_id.as_deref()),
            _ => Value::Text(None),
        }
    }
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub licence_id: Option<String>,
    pub address: Option<AddressInput>,
}

const PATCH_RULES: &[Rule] = &[
    Rule::new(
        "name",
        Constraint::Length { min: 1, max: 100 },
        "name must be between 1 and 100 characters",
    ),
    Rule::new("email", Constraint::Email, "email is not a valid address"),
    Rule::new(
        "password",
        Constraint::Length { min: 8, max: 128 },
        "password must be between 8 and 128 characters",
    ),
    Rule::new("phoneNumber", Constraint::Phone, "phone number is not valid"),
    Rule::new(
        "licenceId",
        Constraint::Length { min: 0, max: 20 },
        "licence id must be at most 20 characters",
    ),
];

impl Validate for UserPatch {
    fn rules() -> &'static [Rule] {
        PATCH_RULES
    }

    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "name" => Value::Text(self.name.as_deref()),
            "email" => Value::Text(self.email.as_deref()),
            "password" => Value::Text(self.password.as_deref()),
            "phoneNumber" => Value::Text(self.phone_number.as_deref()),
            "licenceId" => Value::Text(self.licence_id.as_deref()),
            _ => Value::Text(None),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub password: Option<String>,
    pub phone_number: String,
    pub licence_id: Option<String>,
    pub address_id: Option<String>,
    pub role: String,
    pub registered: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::addresses::Entity",
        from = "Column::AddressId",
        to = "super::addresses::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Addresses,
}

impl Related<super::addresses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addresses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(value: &User) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            username: ActiveValue::Set(value.username.clone()),
            email: ActiveValue::Set(value.email.clone()),
            password: ActiveValue::Set(value.password_hash.clone()),
            phone_number: ActiveValue::Set(value.phone_number.clone()),
            licence_id: ActiveValue::Set(value.licence_id.clone()),
            address_id: ActiveValue::Set(value.address.as_ref().map(|a| a.id.to_string())),
            role: ActiveValue::Set(value.role.as_str().to_string()),
            registered: ActiveValue::Set(value.registered),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<(Model, Option<addresses::Model>)> for User {
    type Error = EngineError;

    fn try_from((model, address): (Model, Option<addresses::Model>)) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "user")?,
            name: model.name,
            username: model.username,
            email: model.email,
            password_hash: model.password,
            phone_number: model.phone_number,
            licence_id: model.licence_id,
            address: address.map(Address::try_from).transpose()?,
            role: Role::try_from(model.role.as_str())?,
            registered: model.registered,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    fn registration() -> UserRegistration {
        UserRegistration {
            name: "Rita Renter".to_string(),
            username: " Rita ".to_string(),
            email: "Rita@Example.com".to_string(),
            password: "correct horse".to_string(),
            phone_number: "+36 30 123 4567".to_string(),
            licence_id: Some("AB123456".to_string()),
            address: None,
        }
    }

    #[test]
    fn registered_user_is_normalized_renter() {
        let user = User::registered(&registration(), "hash".to_string());
        assert_eq!(user.username.as_deref(), Some("rita"));
        assert_eq!(user.email, "rita@example.com");
        assert_eq!(user.role, Role::Renter);
        assert!(user.registered);
        assert!(user.can_log_in());
    }

    #[test]
    fn guest_cannot_log_in() {
        let guest = User::guest(&GuestInput {
            name: "Walk In".to_string(),
            email: "walk@in.example".to_string(),
            phone_number: "123456".to_string(),
            licence_id: None,
            address: None,
        });
        assert!(!guest.registered);
        assert!(!guest.can_log_in());
        assert_eq!(guest.username, None);
    }

    #[test]
    fn registration_rules_in_order() {
        let mut input = registration();
        input.username = "ab".to_string();
        input.password = "short".to_string();
        assert_eq!(
            validate(&input).unwrap_err(),
            EngineError::Validation(vec![
                "username must be between 3 and 32 characters".to_string(),
                "password must be between 8 and 128 characters".to_string(),
            ])
        );
    }

    #[test]
    fn empty_patch_is_valid() {
        assert!(validate(&UserPatch::default()).is_ok());
    }

    #[test]
    fn role_round_trip_and_staff_check() {
        for role in [Role::Renter, Role::Staff, Role::Admin] {
            assert_eq!(Role::try_from(role.as_str()).unwrap(), role);
        }
        assert!(!Role::Renter.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(Role::try_from("owner").is_err());
    }
}
