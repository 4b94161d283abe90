//! Postal addresses.
//!
//! An address row belongs to exactly one user or depot. Replacing the owner's
//! address overwrites the row in place; rows are never shared.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{normalize_text, parse_uuid},
    validation::{Constraint, Rule, Validate, Value},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    pub id: Uuid,
    pub zip: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
}

/// Address fields as submitted by a caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressInput {
    pub zip: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
}

const ADDRESS_RULES: &[Rule] = &[
    Rule::new("zip", Constraint::Required, "zip is required"),
    Rule::new(
        "zip",
        Constraint::Length { min: 2, max: 10 },
        "zip must be between 2 and 10 characters",
    ),
    Rule::new("city", Constraint::Required, "city is required"),
    Rule::new(
        "city",
        Constraint::Length { min: 0, max: 100 },
        "city must be at most 100 characters",
    ),
    Rule::new("street", Constraint::Required, "street is required"),
    Rule::new(
        "street",
        Constraint::Length { min: 0, max: 100 },
        "street must be at most 100 characters",
    ),
    Rule::new("houseNumber", Constraint::Required, "house number is required"),
    Rule::new(
        "houseNumber",
        Constraint::Length { min: 0, max: 20 },
        "house number must be at most 20 characters",
    ),
];

impl Validate for AddressInput {
    fn rules() -> &'static [Rule] {
        ADDRESS_RULES
    }

    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "zip" => Value::Text(Some(&self.zip)),
            "city" => Value::Text(Some(&self.city)),
            "street" => Value::Text(Some(&self.street)),
            "houseNumber" => Value::Text(Some(&self.house_number)),
            _ => Value::Text(None),
        }
    }
}

impl Address {
    pub fn new(input: &AddressInput) -> Self {
        Self::with_id(Uuid::new_v4(), input)
    }

    pub fn with_id(id: Uuid, input: &AddressInput) -> Self {
        Self {
            id,
            zip: normalize_text(&input.zip),
            city: normalize_text(&input.city),
            street: normalize_text(&input.street),
            house_number: normalize_text(&input.house_number),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub zip: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Address> for ActiveModel {
    fn from(value: &Address) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            zip: ActiveValue::Set(value.zip.clone()),
            city: ActiveValue::Set(value.city.clone()),
            street: ActiveValue::Set(value.street.clone()),
            house_number: ActiveValue::Set(value.house_number.clone()),
        }
    }
}

impl TryFrom<Model> for Address {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "address")?,
            zip: model.zip,
            city: model.city,
            street: model.street,
            house_number: model.house_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    #[test]
    fn new_address_trims_fields() {
        let address = Address::new(&AddressInput {
            zip: " 1111 ".to_string(),
            city: "Budapest ".to_string(),
            street: " Fő utca".to_string(),
            house_number: "1".to_string(),
        });
        assert_eq!(address.zip, "1111");
        assert_eq!(address.city, "Budapest");
        assert_eq!(address.street, "Fő utca");
    }

    #[test]
    fn empty_address_reports_all_required_fields() {
        let err = validate(&AddressInput::default()).unwrap_err();
        let EngineError::Validation(messages) = err else {
            panic!("expected validation error");
        };
        assert_eq!(messages[0], "zip is required");
        assert!(messages.contains(&"house number is required".to_string()));
    }
}
