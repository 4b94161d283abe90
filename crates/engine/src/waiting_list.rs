//! Per-car FIFO waiting list.
//!
//! Entries for one car are ordered by `queue_position`, which only grows:
//! a new entry takes `max(position) + 1` and positions are never reused,
//! even after the entry is canceled or booked.
//!
//! ```text
//! Active ──notify──▶ Notified ──confirm──▶ Booked
//!    │                  │
//!    └──────cancel──────┴──cancel / timeout──▶ Canceled
//! ```

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaitingListStatus {
    Active,
    Notified,
    Booked,
    Canceled,
}

impl WaitingListStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Notified => "notified",
            Self::Booked => "booked",
            Self::Canceled => "canceled",
        }
    }

    /// Still waiting for the car.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::Notified)
    }
}

impl TryFrom<&str> for WaitingListStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "notified" => Ok(Self::Notified),
            "booked" => Ok(Self::Booked),
            "canceled" => Ok(Self::Canceled),
            other => Err(EngineError::Validation(vec![format!(
                "invalid waiting list status: {other}"
            )])),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitingListEntry {
    pub id: Uuid,
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub queue_position: i64,
    pub status: WaitingListStatus,
    pub created_at: DateTime<Utc>,
    pub notified_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl WaitingListEntry {
    pub fn new(car_id: Uuid, user_id: Uuid, queue_position: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            car_id,
            user_id,
            queue_position,
            status: WaitingListStatus::Active,
            created_at: now,
            notified_at: None,
            updated_at: now,
        }
    }

    fn transition(
        &mut self,
        allowed: &[WaitingListStatus],
        next: WaitingListStatus,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        if !allowed.contains(&self.status) {
            return Err(EngineError::InvalidTransition(format!(
                "waiting list entry is {}, cannot become {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn notify(&mut self, now: DateTime<Utc>) -> ResultEngine<()> {
        self.transition(
            &[WaitingListStatus::Active],
            WaitingListStatus::Notified,
            now,
        )?;
        self.notified_at = Some(now);
        Ok(())
    }

    pub fn confirm(&mut self, now: DateTime<Utc>) -> ResultEngine<()> {
        self.transition(
            &[WaitingListStatus::Notified],
            WaitingListStatus::Booked,
            now,
        )
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> ResultEngine<()> {
        self.transition(
            &[WaitingListStatus::Active, WaitingListStatus::Notified],
            WaitingListStatus::Canceled,
            now,
        )
    }

    /// A notified entry whose offer is older than `timeout`.
    ///
    /// Without a timeout nothing ever expires.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Option<Duration>) -> bool {
        match (self.status, self.notified_at, timeout) {
            (WaitingListStatus::Notified, Some(notified_at), Some(timeout)) => {
                now - notified_at >= timeout
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "waiting_list")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub car_id: String,
    pub user_id: String,
    pub queue_position: i64,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub notified_at: Option<DateTimeUtc>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cars::Entity",
        from = "Column::CarId",
        to = "super::cars::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Cars,
}

impl Related<super::cars::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cars.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&WaitingListEntry> for ActiveModel {
    fn from(value: &WaitingListEntry) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            car_id: ActiveValue::Set(value.car_id.to_string()),
            user_id: ActiveValue::Set(value.user_id.to_string()),
            queue_position: ActiveValue::Set(value.queue_position),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            created_at: ActiveValue::Set(value.created_at),
            notified_at: ActiveValue::Set(value.notified_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for WaitingListEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "waiting list entry")?,
            car_id: parse_uuid(&model.car_id, "car")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            queue_position: model.queue_position,
            status: WaitingListStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            notified_at: model.notified_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn entry() -> WaitingListEntry {
        WaitingListEntry::new(Uuid::new_v4(), Uuid::new_v4(), 1, at(8))
    }

    #[test]
    fn notify_then_confirm() {
        let mut entry = entry();
        entry.notify(at(9)).unwrap();
        assert_eq!(entry.status, WaitingListStatus::Notified);
        assert_eq!(entry.notified_at, Some(at(9)));
        entry.confirm(at(10)).unwrap();
        assert_eq!(entry.status, WaitingListStatus::Booked);
        assert_eq!(entry.updated_at, at(10));
    }

    #[test]
    fn active_entry_cannot_be_confirmed() {
        let mut entry = entry();
        assert_eq!(
            entry.confirm(at(9)).unwrap_err(),
            EngineError::InvalidTransition(
                "waiting list entry is active, cannot become booked".to_string()
            )
        );
    }

    #[test]
    fn booked_entry_cannot_be_canceled() {
        let mut entry = entry();
        entry.notify(at(9)).unwrap();
        entry.confirm(at(10)).unwrap();
        assert!(entry.cancel(at(11)).is_err());
    }

    #[test]
    fn expiry_needs_timeout_and_notification() {
        let mut entry = entry();
        let timeout = Some(Duration::hours(2));
        assert!(!entry.is_expired(at(20), timeout));

        entry.notify(at(9)).unwrap();
        assert!(!entry.is_expired(at(10), timeout));
        assert!(entry.is_expired(at(11), timeout));
        assert!(!entry.is_expired(at(23), None));
    }
}
