//! The module contains `Car` and its storage model.
//!
//! Cars are never removed from the table: `delete_car` flips the `deleted`
//! flag so historic rents and receipts keep a valid reference.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents,
    util::{normalize_plate, normalize_text, parse_optional_uuid, parse_uuid},
    validation::{Constraint, Rule, Validate, Value},
};

/// Upper bound for any odometer reading.
pub const MAX_KILOMETERS: i64 = 10_000_000;

/// Upper bound for a per-kilometer price, in cents.
///
/// Together with [`MAX_KILOMETERS`] this keeps every receipt total within
/// `i64`.
pub const MAX_PRICE_PER_KILOMETER: i64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FuelType {
    Diesel,
    Petrol,
    Hybrid,
    Electric,
}

impl FuelType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diesel => "diesel",
            Self::Petrol => "petrol",
            Self::Hybrid => "hybrid",
            Self::Electric => "electric",
        }
    }
}

impl TryFrom<&str> for FuelType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "diesel" => Ok(Self::Diesel),
            "petrol" => Ok(Self::Petrol),
            "hybrid" => Ok(Self::Hybrid),
            "electric" => Ok(Self::Electric),
            other => Err(EngineError::Validation(vec![format!(
                "invalid fuel type: {other}"
            )])),
        }
    }
}

/// Driving licence category needed to rent the car.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequiredLicence {
    Am,
    A1,
    A2,
    A,
    B,
}

impl RequiredLicence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl TryFrom<&str> for RequiredLicence {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "AM" => Ok(Self::Am),
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            other => Err(EngineError::Validation(vec![format!(
                "invalid licence category: {other}"
            )])),
        }
    }
}

/// Status reported for a car; derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CarStatus {
    Available,
    Rented,
    Deleted,
}

impl CarStatus {
    pub fn derive(deleted: bool, handed_over: bool) -> Self {
        if deleted {
            Self::Deleted
        } else if handed_over {
            Self::Rented
        } else {
            Self::Available
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Car {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub fuel_type: FuelType,
    pub required_licence: RequiredLicence,
    pub licence_plate: String,
    pub has_valid_vignette: bool,
    pub price_per_kilometer: MoneyCents,
    pub is_automatic: bool,
    pub actual_kilometers: i64,
    pub in_proper_condition: bool,
    pub depot_id: Option<Uuid>,
    pub deleted: bool,
    pub status: CarStatus,
    pub created_at: DateTime<Utc>,
}

impl Car {
    pub fn new(input: &CarInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            brand: normalize_text(&input.brand),
            model: normalize_text(&input.model),
            fuel_type: input.fuel_type,
            required_licence: input.required_licence,
            licence_plate: normalize_plate(&input.licence_plate),
            has_valid_vignette: input.has_valid_vignette,
            price_per_kilometer: MoneyCents::new(input.price_per_kilometer),
            is_automatic: input.is_automatic,
            actual_kilometers: input.actual_kilometers,
            in_proper_condition: input.in_proper_condition,
            depot_id: input.depot_id,
            deleted: false,
            status: CarStatus::Available,
            created_at: Utc::now(),
        }
    }

    /// Apply the fields present in `patch`.
    pub fn apply(&mut self, patch: &CarPatch) {
        if let Some(brand) = &patch.brand {
            self.brand = normalize_text(brand);
        }
        if let Some(model) = &patch.model {
            self.model = normalize_text(model);
        }
        if let Some(fuel_type) = patch.fuel_type {
            self.fuel_type = fuel_type;
        }
        if let Some(required_licence) = patch.required_licence {
            self.required_licence = required_licence;
        }
        if let Some(plate) = &patch.licence_plate {
            self.licence_plate = normalize_plate(plate);
        }
        if let Some(vignette) = patch.has_valid_vignette {
            self.has_valid_vignette = vignette;
        }
        if let Some(price) = patch.price_per_kilometer {
            self.price_per_kilometer = MoneyCents::new(price);
        }
        if let Some(automatic) = patch.is_automatic {
            self.is_automatic = automatic;
        }
        if let Some(km) = patch.actual_kilometers {
            self.actual_kilometers = km;
        }
        if let Some(condition) = patch.in_proper_condition {
            self.in_proper_condition = condition;
        }
        if let Some(depot_id) = patch.depot_id {
            self.depot_id = Some(depot_id);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarInput {
    pub brand: String,
    pub model: String,
    pub fuel_type: FuelType,
    pub required_licence: RequiredLicence,
    pub licence_plate: String,
    pub has_valid_vignette: bool,
    /// Minor units per kilometer.
    pub price_per_kilometer: i64,
    pub is_automatic: bool,
    pub actual_kilometers: i64,
    pub in_proper_condition: bool,
    pub depot_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CarPatch {
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

const CAR_RULES: &[Rule] = &[
    Rule::new("brand", Constraint::Required, "brand is required"),
    Rule::new(
        "brand",
        Constraint::Length { min: 0, max: 50 },
        "brand must be at most 50 characters",
    ),
    Rule::new("model", Constraint::Required, "model is required"),
    Rule::new(
        "model",
        Constraint::Length { min: 0, max: 50 },
        "model must be at most 50 characters",
    ),
    Rule::new("licencePlate", Constraint::Required, "licence plate is required"),
    Rule::new(
        "licencePlate",
        Constraint::Length { min: 0, max: 15 },
        "licence plate must be at most 15 characters",
    ),
    Rule::new(
        "pricePerKilometer",
        Constraint::Range {
            min: 1,
            max: i64::MAX,
        },
        "price per kilometer must be greater than 0",
    ),
    Rule::new(
        "pricePerKilometer",
        Constraint::Range {
            min: i64::MIN,
            max: MAX_PRICE_PER_KILOMETER,
        },
        "price per kilometer must be at most 1000000",
    ),
    Rule::new(
        "actualKilometers",
        Constraint::Range {
            min: 0,
            max: i64::MAX,
        },
        "actual kilometers must not be negative",
    ),
    Rule::new(
        "actualKilometers",
        Constraint::Range {
            min: i64::MIN,
            max: MAX_KILOMETERS,
        },
        "actual kilometers must be at most 10000000",
    ),
];

const CAR_PATCH_RULES: &[Rule] = &[
    Rule::new(
        "brand",
        Constraint::Length { min: 1, max: 50 },
        "brand must be between 1 and 50 characters",
    ),
    Rule::new(
        "model",
        Constraint::Length { min: 1, max: 50 },
        "model must be between 1 and 50 characters",
    ),
    Rule::new(
        "licencePlate",
        Constraint::Length { min: 1, max: 15 },
        "licence plate must be between 1 and 15 characters",
    ),
    Rule::new(
        "pricePerKilometer",
        Constraint::Range {
            min: 1,
            max: i64::MAX,
        },
        "price per kilometer must be greater than 0",
    ),
    Rule::new(
        "pricePerKilometer",
        Constraint::Range {
            min: i64::MIN,
            max: MAX_PRICE_PER_KILOMETER,
        },
        "price per kilometer must be at most 1000000",
    ),
    Rule::new(
        "actualKilometers",
        Constraint::Range {
            min: 0,
            max: i64::MAX,
        },
        "actual kilometers must not be negative",
    ),
    Rule::new(
        "actualKilometers",
        Constraint::Range {
            min: i64::MIN,
            max: MAX_KILOMETERS,
        },
        "actual kilometers must be at most 10000000",
    ),
];

impl Validate for CarInput {
    fn rules() -> &'static [Rule] {
        CAR_RULES
    }

    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "brand" => Value::Text(Some(&self.brand)),
            "model" => Value::Text(Some(&self.model)),
            "licencePlate" => Value::Text(Some(&self.licence_plate)),
            "pricePerKilometer" => Value::Number(Some(self.price_per_kilometer)),
            "actualKilometers" => Value::Number(Some(self.actual_kilometers)),
            _ => Value::Text(None),
        }
    }
}

impl Validate for CarPatch {
    fn rules() -> &'static [Rule] {
        CAR_PATCH_RULES
    }

    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "brand" => Value::Text(self.brand.as_deref()),
            "model" => Value::Text(self.model.as_deref()),
            "licencePlate" => Value::Text(self.licence_plate.as_deref()),
            "pricePerKilometer" => Value::Number(self.price_per_kilometer),
            "actualKilometers" => Value::Number(self.actual_kilometers),
            _ => Value::Text(None),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub brand: String,
    pub model: String,
    pub fuel_type: String,
    pub required_licence: String,
    pub licence_plate: String,
    pub has_valid_vignette: bool,
    pub price_per_kilometer: i64,
    pub is_automatic: bool,
    pub actual_kilometers: i64,
    pub in_proper_condition: bool,
    pub depot_id: Option<String>,
    pub deleted: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::depots::Entity",
        from = "Column::DepotId",
        to = "super::depots::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Depots,
    #[sea_orm(has_many = "super::rents::Entity")]
    Rents,
}

impl Related<super::depots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Depots.def()
    }
}

impl Related<super::rents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Car> for ActiveModel {
    fn from(value: &Car) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            brand: ActiveValue::Set(value.brand.clone()),
            model: ActiveValue::Set(value.model.clone()),
            fuel_type: ActiveValue::Set(value.fuel_type.as_str().to_string()),
            required_licence: ActiveValue::Set(value.required_licence.as_str().to_string()),
            licence_plate: ActiveValue::Set(value.licence_plate.clone()),
            has_valid_vignette: ActiveValue::Set(value.has_valid_vignette),
            price_per_kilometer: ActiveValue::Set(value.price_per_kilometer.cents()),
            is_automatic: ActiveValue::Set(value.is_automatic),
            actual_kilometers: ActiveValue::Set(value.actual_kilometers),
            in_proper_condition: ActiveValue::Set(value.in_proper_condition),
            depot_id: ActiveValue::Set(value.depot_id.map(|id| id.to_string())),
            deleted: ActiveValue::Set(value.deleted),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

/// `handed_over` tells whether the car currently has a rent out on the road.
impl TryFrom<(Model, bool)> for Car {
    type Error = EngineError;

    fn try_from((model, handed_over): (Model, bool)) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "car")?,
            brand: model.brand,
            model: model.model,
            fuel_type: FuelType::try_from(model.fuel_type.as_str())?,
            required_licence: RequiredLicence::try_from(model.required_licence.as_str())?,
            licence_plate: model.licence_plate,
            has_valid_vignette: model.has_valid_vignette,
            price_per_kilometer: MoneyCents::new(model.price_per_kilometer),
            is_automatic: model.is_automatic,
            actual_kilometers: model.actual_kilometers,
            in_proper_condition: model.in_proper_condition,
            depot_id: parse_optional_uuid(model.depot_id.as_deref(), "depot")?,
            deleted: model.deleted,
            status: CarStatus::derive(model.deleted, handed_over),
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    fn input() -> CarInput {
        CarInput {
            brand: "Suzuki".to_string(),
            model: "Swift".to_string(),
            fuel_type: FuelType::Petrol,
            required_licence: RequiredLicence::B,
            licence_plate: " aa-bb-123 ".to_string(),
            has_valid_vignette: true,
            price_per_kilometer: 50,
            is_automatic: false,
            actual_kilometers: 1000,
            in_proper_condition: true,
            depot_id: None,
        }
    }

    #[test]
    fn new_car_normalizes_plate() {
        let car = Car::new(&input());
        assert_eq!(car.licence_plate, "AA-BB-123");
        assert_eq!(car.status, CarStatus::Available);
        assert_eq!(car.price_per_kilometer, MoneyCents::new(50));
    }

    #[test]
    fn zero_price_and_long_plate_are_rejected() {
        let mut input = input();
        input.price_per_kilometer = 0;
        input.licence_plate = "X".repeat(16);
        assert_eq!(
            validate(&input).unwrap_err(),
            EngineError::Validation(vec![
                "licence plate must be at most 15 characters".to_string(),
                "price per kilometer must be greater than 0".to_string(),
            ])
        );
    }

    #[test]
    fn odometer_and_price_are_capped() {
        let mut input = input();
        input.price_per_kilometer = MAX_PRICE_PER_KILOMETER + 1;
        input.actual_kilometers = i64::MAX;
        assert_eq!(
            validate(&input).unwrap_err(),
            EngineError::Validation(vec![
                "price per kilometer must be at most 1000000".to_string(),
                "actual kilometers must be at most 10000000".to_string(),
            ])
        );

        input.price_per_kilometer = MAX_PRICE_PER_KILOMETER;
        input.actual_kilometers = MAX_KILOMETERS;
        assert!(validate(&input).is_ok());
        assert!(
            MoneyCents::new(MAX_PRICE_PER_KILOMETER)
                .per_unit(MAX_KILOMETERS)
                .is_some()
        );
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut car = Car::new(&input());
        car.apply(&CarPatch {
            in_proper_condition: Some(false),
            actual_kilometers: Some(1500),
            ..Default::default()
        });
        assert!(!car.in_proper_condition);
        assert_eq!(car.actual_kilometers, 1500);
        assert_eq!(car.brand, "Suzuki");
    }

    #[test]
    fn status_precedence() {
        assert_eq!(CarStatus::derive(true, true), CarStatus::Deleted);
        assert_eq!(CarStatus::derive(false, true), CarStatus::Rented);
        assert_eq!(CarStatus::derive(false, false), CarStatus::Available);
    }
}
