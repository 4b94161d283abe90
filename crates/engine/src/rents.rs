//! Rents and their lifecycle.
//!
//! A rent moves through a fixed state machine:
//!
//! ```text
//! Pending ──approve──▶ Approved ──hand_over──▶ HandedOver ──take_back──▶ Returned ──invoice──▶ Invoiced
//!    │
//!    └──reject / cancel──▶ Rejected
//! ```
//!
//! The methods on [`Rent`] are pure: they check the transition and the
//! cross-field invariants (`planned_end > planned_start`, kilometers and
//! timestamps never running backwards) and mutate the value. Persisting the
//! result and touching the car is the job of the engine operations.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    cars::MAX_KILOMETERS,
    util::{parse_optional_uuid, parse_uuid},
};

/// Reason stored when a renter withdraws their own request.
pub const CANCELED_BY_RENTER: &str = "canceled by renter";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RentStatus {
    Pending,
    Approved,
    Rejected,
    HandedOver,
    Returned,
    Invoiced,
}

impl RentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::HandedOver => "handed_over",
            Self::Returned => "returned",
            Self::Invoiced => "invoiced",
        }
    }

    /// Open rents still hold their reservation window on the car.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Approved | Self::HandedOver)
    }

    pub const OPEN: [RentStatus; 3] = [Self::Pending, Self::Approved, Self::HandedOver];
}

impl TryFrom<&str> for RentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "handed_over" => Ok(Self::HandedOver),
            "returned" => Ok(Self::Returned),
            "invoiced" => Ok(Self::Invoiced),
            other => Err(EngineError::Validation(vec![format!(
                "invalid rent status: {other}"
            )])),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rent {
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
    pub created_at: DateTime<Utc>,
}

impl Rent {
    pub fn new(
        renter_id: Uuid,
        car_id: Uuid,
        planned_start: NaiveDate,
        planned_end: NaiveDate,
        invoice_request: bool,
    ) -> ResultEngine<Self> {
        if planned_end <= planned_start {
            return Err(EngineError::Validation(vec![
                "planned end must be after planned start".to_string(),
            ]));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            renter_id,
            car_id,
            status: RentStatus::Pending,
            planned_start,
            planned_end,
            actual_start: None,
            actual_end: None,
            starting_kilometer: None,
            ending_kilometer: None,
            approver_id: None,
            issuer_id: None,
            recipient_id: None,
            rejection_reason: None,
            invoice_request,
            issued_at: None,
            created_at: Utc::now(),
        })
    }

    /// Whether this rent still reserves `[start, end)` on its car.
    ///
    /// Windows are half-open, so a rent ending on day D and another starting
    /// on day D do not collide.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.status.is_open() && self.planned_start < end && start < self.planned_end
    }

    fn expect_status(&self, expected: RentStatus, action: &str) -> ResultEngine<()> {
        if self.status != expected {
            return Err(EngineError::InvalidTransition(format!(
                "cannot {action} rent in status {}",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    pub fn approve(&mut self, approver_id: Uuid) -> ResultEngine<()> {
        self.expect_status(RentStatus::Pending, "approve")?;
        if self.actual_start.is_some()
            || self.actual_end.is_some()
            || self.starting_kilometer.is_some()
            || self.ending_kilometer.is_some()
        {
            return Err(EngineError::InvalidTransition(
                "cannot approve a rent that already has usage recorded".to_string(),
            ));
        }
        self.status = RentStatus::Approved;
        self.approver_id = Some(approver_id);
        Ok(())
    }

    /// `reason` may be absent; an empty reason is stored as absent.
    pub fn reject(&mut self, approver_id: Uuid, reason: Option<String>) -> ResultEngine<()> {
        self.expect_status(RentStatus::Pending, "reject")?;
        self.status = RentStatus::Rejected;
        self.approver_id = Some(approver_id);
        self.rejection_reason = reason.filter(|r| !r.trim().is_empty());
        Ok(())
    }

    /// A renter withdrawing their own pending request.
    pub fn cancel(&mut self, renter_id: Uuid) -> ResultEngine<()> {
        if self.renter_id != renter_id {
            return Err(EngineError::Forbidden(
                "only the renter can cancel this rent".to_string(),
            ));
        }
        self.expect_status(RentStatus::Pending, "cancel")?;
        self.status = RentStatus::Rejected;
        self.rejection_reason = Some(CANCELED_BY_RENTER.to_string());
        Ok(())
    }

    /// Release the car. `starting_kilometer` is the car's odometer at the desk.
    pub fn hand_over(
        &mut self,
        issuer_id: Uuid,
        actual_start: DateTime<Utc>,
        starting_kilometer: i64,
    ) -> ResultEngine<()> {
        self.expect_status(RentStatus::Approved, "hand over")?;
        if starting_kilometer < 0 {
            return Err(EngineError::Validation(vec![
                "starting kilometer must not be negative".to_string(),
            ]));
        }
        self.status = RentStatus::HandedOver;
        self.issuer_id = Some(issuer_id);
        self.actual_start = Some(actual_start);
        self.starting_kilometer = Some(starting_kilometer);
        Ok(())
    }

    pub fn take_back(
        &mut self,
        recipient_id: Uuid,
        actual_end: DateTime<Utc>,
        ending_kilometer: i64,
    ) -> ResultEngine<()> {
        self.expect_status(RentStatus::HandedOver, "take back")?;

        let mut errors = Vec::new();
        if let Some(start) = self.actual_start
            && actual_end < start
        {
            errors.push("actual end must not be before actual start".to_string());
        }
        if let Some(start_km) = self.starting_kilometer
            && ending_kilometer < start_km
        {
            errors.push("ending kilometer must not be less than starting kilometer".to_string());
        }
        if ending_kilometer > MAX_KILOMETERS {
            errors.push("ending kilometer must be at most 10000000".to_string());
        }
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        self.status = RentStatus::Returned;
        self.recipient_id = Some(recipient_id);
        self.actual_end = Some(actual_end);
        self.ending_kilometer = Some(ending_kilometer);
        Ok(())
    }

    pub fn mark_invoiced(&mut self, issued_at: DateTime<Utc>) -> ResultEngine<()> {
        self.expect_status(RentStatus::Returned, "invoice")?;
        self.status = RentStatus::Invoiced;
        self.issued_at = Some(issued_at);
        Ok(())
    }

    /// Kilometers driven; `None` until the car is back.
    pub fn billable_kilometers(&self) -> Option<i64> {
        match (self.starting_kilometer, self.ending_kilometer) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub renter_id: String,
    pub car_id: String,
    pub status: String,
    pub planned_start: Date,
    pub planned_end: Date,
    pub actual_start: Option<DateTimeUtc>,
    pub actual_end: Option<DateTimeUtc>,
    pub starting_kilometer: Option<i64>,
    pub ending_kilometer: Option<i64>,
    pub approver_id: Option<String>,
    pub issuer_id: Option<String>,
    pub recipient_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub invoice_request: bool,
    pub issued_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
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
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RenterId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Renters,
    #[sea_orm(has_one = "super::receipts::Entity")]
    Receipts,
}

impl Related<super::cars::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cars.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Renters.def()
    }
}

impl Related<super::receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Rent> for ActiveModel {
    fn from(rent: &Rent) -> Self {
        Self {
            id: ActiveValue::Set(rent.id.to_string()),
            renter_id: ActiveValue::Set(rent.renter_id.to_string()),
            car_id: ActiveValue::Set(rent.car_id.to_string()),
            status: ActiveValue::Set(rent.status.as_str().to_string()),
            planned_start: ActiveValue::Set(rent.planned_start),
            planned_end: ActiveValue::Set(rent.planned_end),
            actual_start: ActiveValue::Set(rent.actual_start),
            actual_end: ActiveValue::Set(rent.actual_end),
            starting_kilometer: ActiveValue::Set(rent.starting_kilometer),
            ending_kilometer: ActiveValue::Set(rent.ending_kilometer),
            approver_id: ActiveValue::Set(rent.approver_id.map(|id| id.to_string())),
            issuer_id: ActiveValue::Set(rent.issuer_id.map(|id| id.to_string())),
            recipient_id: ActiveValue::Set(rent.recipient_id.map(|id| id.to_string())),
            rejection_reason: ActiveValue::Set(rent.rejection_reason.clone()),
            invoice_request: ActiveValue::Set(rent.invoice_request),
            issued_at: ActiveValue::Set(rent.issued_at),
            created_at: ActiveValue::Set(rent.created_at),
        }
    }
}

impl TryFrom<Model> for Rent {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "rent")?,
            renter_id: parse_uuid(&model.renter_id, "renter")?,
            car_id: parse_uuid(&model.car_id, "car")?,
            status: RentStatus::try_from(model.status.as_str())?,
            planned_start: model.planned_start,
            planned_end: model.planned_end,
            actual_start: model.actual_start,
            actual_end: model.actual_end,
            starting_kilometer: model.starting_kilometer,
            ending_kilometer: model.ending_kilometer,
            approver_id: parse_optional_uuid(model.approver_id.as_deref(), "approver")?,
            issuer_id: parse_optional_uuid(model.issuer_id.as_deref(), "issuer")?,
            recipient_id: parse_optional_uuid(model.recipient_id.as_deref(), "recipient")?,
            rejection_reason: model.rejection_reason,
            invoice_request: model.invoice_request,
            issued_at: model.issued_at,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rent() -> Rent {
        Rent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            date(2024, 6, 1),
            date(2024, 6, 3),
            false,
        )
        .unwrap()
    }

    #[test]
    fn end_must_follow_start() {
        let err = Rent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            date(2024, 6, 3),
            date(2024, 6, 3),
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(vec!["planned end must be after planned start".to_string()])
        );
    }

    #[test]
    fn full_lifecycle() {
        let staff = Uuid::new_v4();
        let mut rent = rent();

        rent.approve(staff).unwrap();
        assert_eq!(rent.status, RentStatus::Approved);
        assert_eq!(rent.approver_id, Some(staff));

        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        rent.hand_over(staff, start, 1000).unwrap();
        assert_eq!(rent.status, RentStatus::HandedOver);

        let end = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        rent.take_back(staff, end, 1200).unwrap();
        assert_eq!(rent.status, RentStatus::Returned);
        assert_eq!(rent.billable_kilometers(), Some(200));

        rent.mark_invoiced(end).unwrap();
        assert_eq!(rent.status, RentStatus::Invoiced);
        assert_eq!(rent.issued_at, Some(end));
    }

    #[test]
    fn take_back_rejects_backwards_odometer_and_clock() {
        let staff = Uuid::new_v4();
        let mut rent = rent();
        rent.approve(staff).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        rent.hand_over(staff, start, 1000).unwrap();

        let before = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let err = rent.take_back(staff, before, 999).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(vec![
                "actual end must not be before actual start".to_string(),
                "ending kilometer must not be less than starting kilometer".to_string(),
            ])
        );
        assert_eq!(rent.status, RentStatus::HandedOver);
    }

    #[test]
    fn take_back_caps_the_odometer() {
        let staff = Uuid::new_v4();
        let mut rent = rent();
        rent.approve(staff).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        rent.hand_over(staff, start, 0).unwrap();

        let end = Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap();
        assert_eq!(
            rent.take_back(staff, end, i64::MAX).unwrap_err(),
            EngineError::Validation(vec!["ending kilometer must be at most 10000000".to_string()])
        );
        assert_eq!(rent.status, RentStatus::HandedOver);

        rent.take_back(staff, end, MAX_KILOMETERS).unwrap();
        assert_eq!(rent.billable_kilometers(), Some(MAX_KILOMETERS));
    }

    #[test]
    fn cannot_reject_an_approved_rent() {
        let staff = Uuid::new_v4();
        let mut rent = rent();
        rent.approve(staff).unwrap();
        assert_eq!(
            rent.reject(staff, Some("late".to_string())).unwrap_err(),
            EngineError::InvalidTransition("cannot reject rent in status approved".to_string())
        );
    }

    #[test]
    fn cancel_is_limited_to_own_pending_rent() {
        let mut rent = rent();
        assert!(matches!(
            rent.cancel(Uuid::new_v4()),
            Err(EngineError::Forbidden(_))
        ));
        let renter = rent.renter_id;
        rent.cancel(renter).unwrap();
        assert_eq!(rent.status, RentStatus::Rejected);
        assert_eq!(rent.rejection_reason.as_deref(), Some(CANCELED_BY_RENTER));
    }

    #[test]
    fn blank_reject_reason_is_dropped() {
        let mut rent = rent();
        rent.reject(Uuid::new_v4(), Some("  ".to_string())).unwrap();
        assert_eq!(rent.rejection_reason, None);
    }

    #[test]
    fn overlap_is_half_open_and_ignores_closed_rents() {
        let mut rent = rent();
        assert!(rent.overlaps(date(2024, 6, 2), date(2024, 6, 5)));
        assert!(rent.overlaps(date(2024, 5, 30), date(2024, 6, 2)));
        assert!(!rent.overlaps(date(2024, 6, 3), date(2024, 6, 5)));
        assert!(!rent.overlaps(date(2024, 5, 28), date(2024, 6, 1)));

        rent.reject(Uuid::new_v4(), None).unwrap();
        assert!(!rent.overlaps(date(2024, 6, 2), date(2024, 6, 5)));
    }
}
