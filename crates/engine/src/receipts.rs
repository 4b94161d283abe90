//! Receipts: the financial settlement of a returned rent.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, Rent, ResultEngine, RentStatus, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub id: Uuid,
    pub rent_id: Uuid,
    pub total_cost: MoneyCents,
    pub issue_date: DateTime<Utc>,
    pub issuer_id: Uuid,
}

impl Receipt {
    /// Settle `rent` at `price_per_kilometer`.
    ///
    /// The total is the driven distance (`ending - starting` kilometer) times
    /// the car's rate. The rent must be `Returned`.
    pub fn for_rent(
        rent: &Rent,
        price_per_kilometer: MoneyCents,
        issuer_id: Uuid,
        issue_date: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if rent.status != RentStatus::Returned {
            return Err(EngineError::InvalidTransition(format!(
                "cannot invoice rent in status {}",
                rent.status.as_str()
            )));
        }
        let kilometers = rent.billable_kilometers().ok_or_else(|| {
            EngineError::InvalidTransition("rent has no recorded kilometers".to_string())
        })?;
        let total_cost = price_per_kilometer
            .per_unit(kilometers)
            .ok_or_else(|| EngineError::InvalidAmount("receipt total out of range".to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            rent_id: rent.id,
            total_cost,
            issue_date,
            issuer_id,
        })
    }

    /// Staff correction of the total. Totals are never negative.
    pub fn correct(&mut self, total_cost: MoneyCents) -> ResultEngine<()> {
        if total_cost < MoneyCents::ZERO {
            return Err(EngineError::Validation(vec![
                "total cost must not be negative".to_string(),
            ]));
        }
        self.total_cost = total_cost;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub rent_id: String,
    pub total_cost: i64,
    pub issue_date: DateTimeUtc,
    pub issuer_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rents::Entity",
        from = "Column::RentId",
        to = "super::rents::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Rents,
}

impl Related<super::rents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Receipt> for ActiveModel {
    fn from(value: &Receipt) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            rent_id: ActiveValue::Set(value.rent_id.to_string()),
            total_cost: ActiveValue::Set(value.total_cost.cents()),
            issue_date: ActiveValue::Set(value.issue_date),
            issuer_id: ActiveValue::Set(value.issuer_id.to_string()),
        }
    }
}

impl TryFrom<Model> for Receipt {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "receipt")?,
            rent_id: parse_uuid(&model.rent_id, "rent")?,
            total_cost: MoneyCents::new(model.total_cost),
            issue_date: model.issue_date,
            issuer_id: parse_uuid(&model.issuer_id, "issuer")?,
        })
    }
}
