//! Depots: pick-up and drop-off locations cars are assigned to.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    Address, AddressInput, EngineError, addresses,
    util::{normalize_text, parse_uuid},
    validation::{Constraint, Rule, Validate, Value},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Depot {
    pub id: Uuid,
    pub name: String,
    pub address: Address,
}

impl Depot {
    pub fn new(input: &DepotInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: normalize_text(&input.name),
            address: Address::new(&input.address),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepotInput {
    pub name: String,
    pub address: AddressInput,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepotPatch {
    pub name: Option<String>,
    pub address: Option<AddressInput>,
}

const DEPOT_RULES: &[Rule] = &[
    Rule::new("name", Constraint::Required, "depot name is required"),
    Rule::new(
        "name",
        Constraint::Length { min: 0, max: 100 },
        "depot name must be at most 100 characters",
    ),
];

const DEPOT_PATCH_RULES: &[Rule] = &[Rule::new(
    "name",
    Constraint::Length { min: 1, max: 100 },
    "depot name must be between 1 and 100 characters",
)];

impl Validate for DepotInput {
    fn rules() -> &'static [Rule] {
        DEPOT_RULES
    }

    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "name" => Value::Text(Some(&self.name)),
            _ => Value::Text(None),
        }
    }
}

impl Validate for DepotPatch {
    fn rules() -> &'static [Rule] {
        DEPOT_PATCH_RULES
    }

    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "name" => Value::Text(self.name.as_deref()),
            _ => Value::Text(None),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "depots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub address_id: String,
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
    #[sea_orm(has_many = "super::cars::Entity")]
    Cars,
}

impl Related<super::addresses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addresses.def()
    }
}

impl Related<super::cars::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cars.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Depot> for ActiveModel {
    fn from(value: &Depot) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            address_id: ActiveValue::Set(value.address.id.to_string()),
        }
    }
}

impl TryFrom<(Model, addresses::Model)> for Depot {
    type Error = EngineError;

    fn try_from((model, address): (Model, addresses::Model)) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "depot")?,
            name: model.name,
            address: Address::try_from(address)?,
        })
    }
}
