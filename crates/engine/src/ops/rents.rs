use base64::Engine as _;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{EngineError, Rent, RentStatus, ResultEngine, User, cars, rents};

use super::{Engine, with_tx};

/// A booking request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RentRequest {
    /// Who the car is booked for. Renters may only book for themselves and
    /// can leave this empty; staff book on behalf of any user.
    pub renter_id: Option<Uuid>,
    pub car_id: Uuid,
    pub planned_start: NaiveDate,
    pub planned_end: NaiveDate,
    pub invoice_request: bool,
}

/// What staff record when the car comes back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TakeBack {
    pub actual_end: DateTime<Utc>,
    pub ending_kilometer: i64,
    /// `None` keeps the car's current condition flag.
    pub in_proper_condition: Option<bool>,
}

/// Filters for listing rents.
#[derive(Clone, Debug, Default)]
pub struct RentListFilter {
    pub status: Option<RentStatus>,
    pub car_id: Option<Uuid>,
    /// Ignored for renters, who only ever see their own rents.
    pub renter_id: Option<Uuid>,
}

/// One page of rents, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RentPage {
    pub rents: Vec<Rent>,
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RentsCursor {
    created_at: DateTime<Utc>,
    rent_id: String,
}

impl RentsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid rents cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid rents cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid rents cursor".to_string()))
    }
}

fn ensure_can_see(actor: &User, rent: &Rent) -> ResultEngine<()> {
    if actor.role.is_staff() || rent.renter_id == actor.id {
        return Ok(());
    }
    Err(EngineError::Forbidden(
        "rent belongs to another user".to_string(),
    ))
}

impl Engine {
    /// First open rent of `car_id` whose window overlaps `[start, end)`.
    async fn overlapping_rent(
        &self,
        db: &DatabaseTransaction,
        car_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<Option<Rent>> {
        rents::Entity::find()
            .filter(rents::Column::CarId.eq(car_id.to_string()))
            .filter(rents::Column::Status.is_in(RentStatus::OPEN.map(RentStatus::as_str)))
            .filter(rents::Column::PlannedStart.lt(end))
            .filter(rents::Column::PlannedEnd.gt(start))
            .order_by_asc(rents::Column::PlannedStart)
            .one(db)
            .await?
            .map(Rent::try_from)
            .transpose()
    }

    async fn save_rent(&self, db: &DatabaseTransaction, rent: &Rent) -> ResultEngine<()> {
        rents::ActiveModel::from(rent).update(db).await?;
        Ok(())
    }

    /// Book a car.
    ///
    /// The window check and the insert share one transaction, so two
    /// overlapping requests for the same car cannot both succeed. The loser of
    /// a concurrent race gets [`EngineError::Overlap`].
    ///
    /// Authorization: any user for themself; staff for anyone.
    pub async fn create_rent(&self, actor_id: Uuid, request: &RentRequest) -> ResultEngine<Rent> {
        self.insert_rent(actor_id, request)
            .await
            .map_err(EngineError::lock_contention_as_overlap)
    }

    async fn insert_rent(&self, actor_id: Uuid, request: &RentRequest) -> ResultEngine<Rent> {
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let renter_id = request.renter_id.unwrap_or(actor.id);
            if renter_id != actor.id && !actor.role.is_staff() {
                return Err(EngineError::Forbidden(
                    "cannot book on behalf of another user".to_string(),
                ));
            }
            self.require_user(&db_tx, renter_id).await?;

            let car = self.require_car_model(&db_tx, request.car_id).await?;
            if car.deleted {
                return Err(EngineError::KeyNotFound("car not exists".to_string()));
            }

            let rent = Rent::new(
                renter_id,
                request.car_id,
                request.planned_start,
                request.planned_end,
                request.invoice_request,
            )?;
            if let Some(existing) = self
                .overlapping_rent(&db_tx, rent.car_id, rent.planned_start, rent.planned_end)
                .await?
            {
                tracing::debug!(car_id = %rent.car_id, existing = %existing.id, "overlapping booking refused");
                return Err(EngineError::Overlap(format!(
                    "car is already booked from {} to {}",
                    existing.planned_start, existing.planned_end
                )));
            }

            rents::ActiveModel::from(&rent).insert(&db_tx).await?;
            tracing::info!(rent_id = %rent.id, car_id = %rent.car_id, %renter_id, "rent requested");
            Ok(rent)
        })
    }

    /// Authorization: the renter or staff.
    pub async fn rent(&self, actor_id: Uuid, rent_id: Uuid) -> ResultEngine<Rent> {
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let rent = self.require_rent(&db_tx, rent_id).await?;
            ensure_can_see(&actor, &rent)?;
            Ok(rent)
        })
    }

    /// All rents of one renter, newest first.
    ///
    /// Authorization: the renter or staff.
    pub async fn rents_for_renter(&self, actor_id: Uuid, renter_id: Uuid) -> ResultEngine<Vec<Rent>> {
        with_tx!(self, |db_tx| {
            self.require_self_or_staff(&db_tx, actor_id, renter_id)
                .await?;
            rents::Entity::find()
                .filter(rents::Column::RenterId.eq(renter_id.to_string()))
                .order_by_desc(rents::Column::CreatedAt)
                .order_by_desc(rents::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Rent::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// List rents with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(created_at DESC, id DESC)`.
    pub async fn list_rents(
        &self,
        actor_id: Uuid,
        filter: &RentListFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<RentPage> {
        let cursor = cursor.map(RentsCursor::decode).transpose()?;
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let renter_id = if actor.role.is_staff() {
                filter.renter_id
            } else {
                Some(actor.id)
            };

            let limit_plus_one = limit.saturating_add(1);
            let mut query = rents::Entity::find()
                .order_by_desc(rents::Column::CreatedAt)
                .order_by_desc(rents::Column::Id)
                .limit(limit_plus_one);
            if let Some(renter_id) = renter_id {
                query = query.filter(rents::Column::RenterId.eq(renter_id.to_string()));
            }
            if let Some(car_id) = filter.car_id {
                query = query.filter(rents::Column::CarId.eq(car_id.to_string()));
            }
            if let Some(status) = filter.status {
                query = query.filter(rents::Column::Status.eq(status.as_str()));
            }
            if let Some(cursor) = &cursor {
                query = query.filter(
                    Condition::any()
                        .add(rents::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(rents::Column::CreatedAt.eq(cursor.created_at))
                                .add(rents::Column::Id.lt(cursor.rent_id.clone())),
                        ),
                );
            }

            let models = query.all(&db_tx).await?;
            let has_more = models.len() > limit as usize;
            let rents = models
                .into_iter()
                .take(limit as usize)
                .map(Rent::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let next_cursor = if has_more {
                rents
                    .last()
                    .map(|rent| RentsCursor {
                        created_at: rent.created_at,
                        rent_id: rent.id.to_string(),
                    })
                    .map(|c| c.encode())
                    .transpose()?
            } else {
                None
            };
            Ok(RentPage { rents, next_cursor })
        })
    }

    /// Pending → Approved.
    ///
    /// Authorization: staff.
    pub async fn approve_rent(&self, actor_id: Uuid, rent_id: Uuid) -> ResultEngine<Rent> {
        with_tx!(self, |db_tx| {
            let actor = self.require_staff(&db_tx, actor_id).await?;
            let mut rent = self.require_rent(&db_tx, rent_id).await?;
            rent.approve(actor.id)?;
            self.save_rent(&db_tx, &rent).await?;
            tracing::info!(%rent_id, approver = %actor.id, "rent approved");
            Ok(rent)
        })
    }

    /// Pending → Rejected. The freed window is offered to the head of the
    /// car's waiting list.
    ///
    /// Authorization: staff.
    pub async fn reject_rent(
        &self,
        actor_id: Uuid,
        rent_id: Uuid,
        reason: Option<String>,
    ) -> ResultEngine<Rent> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let actor = self.require_staff(&db_tx, actor_id).await?;
            let mut rent = self.require_rent(&db_tx, rent_id).await?;
            rent.reject(actor.id, reason)?;
            self.save_rent(&db_tx, &rent).await?;
            self.offer_to_next(&db_tx, rent.car_id, now).await?;
            tracing::info!(%rent_id, approver = %actor.id, "rent rejected");
            Ok(rent)
        })
    }

    /// The renter withdraws their own pending request.
    pub async fn cancel_rent(&self, actor_id: Uuid, rent_id: Uuid) -> ResultEngine<Rent> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let mut rent = self.require_rent(&db_tx, rent_id).await?;
            rent.cancel(actor.id)?;
            self.save_rent(&db_tx, &rent).await?;
            self.offer_to_next(&db_tx, rent.car_id, now).await?;
            tracing::info!(%rent_id, "rent canceled by renter");
            Ok(rent)
        })
    }

    /// The renter asks for an invoice. Allowed until the receipt is issued.
    pub async fn request_invoice(&self, actor_id: Uuid, rent_id: Uuid) -> ResultEngine<Rent> {
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let mut rent = self.require_rent(&db_tx, rent_id).await?;
            if rent.renter_id != actor.id {
                return Err(EngineError::Forbidden(
                    "rent belongs to another user".to_string(),
                ));
            }
            if matches!(rent.status, RentStatus::Rejected | RentStatus::Invoiced) {
                return Err(EngineError::InvalidTransition(format!(
                    "cannot request an invoice for rent in status {}",
                    rent.status.as_str()
                )));
            }
            rent.invoice_request = true;
            self.save_rent(&db_tx, &rent).await?;
            Ok(rent)
        })
    }

    /// Approved → HandedOver.
    ///
    /// The starting kilometer is read from the car's odometer. `actual_start`
    /// defaults to now.
    ///
    /// Authorization: staff.
    pub async fn hand_over(
        &self,
        actor_id: Uuid,
        rent_id: Uuid,
        actual_start: Option<DateTime<Utc>>,
    ) -> ResultEngine<Rent> {
        let actual_start = actual_start.unwrap_or_else(Utc::now);
        with_tx!(self, |db_tx| {
            let actor = self.require_staff(&db_tx, actor_id).await?;
            let mut rent = self.require_rent(&db_tx, rent_id).await?;
            let car = self.require_car(&db_tx, rent.car_id).await?;
            if car.status == crate::CarStatus::Rented {
                return Err(EngineError::InvalidTransition(
                    "car is already handed over".to_string(),
                ));
            }

            rent.hand_over(actor.id, actual_start, car.actual_kilometers)?;
            self.save_rent(&db_tx, &rent).await?;
            tracing::info!(%rent_id, issuer = %actor.id, km = car.actual_kilometers, "car handed over");
            Ok(rent)
        })
    }

    /// HandedOver → Returned.
    ///
    /// Moves the car's odometer to `ending_kilometer`, optionally updates its
    /// condition flag and offers the car to the head of its waiting list.
    ///
    /// Authorization: staff.
    pub async fn take_back(
        &self,
        actor_id: Uuid,
        rent_id: Uuid,
        take_back: &TakeBack,
    ) -> ResultEngine<Rent> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let actor = self.require_staff(&db_tx, actor_id).await?;
            let mut rent = self.require_rent(&db_tx, rent_id).await?;
            rent.take_back(actor.id, take_back.actual_end, take_back.ending_kilometer)?;
            self.save_rent(&db_tx, &rent).await?;

            let mut car: cars::ActiveModel = self
                .require_car_model(&db_tx, rent.car_id)
                .await?
                .into();
            car.actual_kilometers = sea_orm::ActiveValue::Set(take_back.ending_kilometer);
            if let Some(condition) = take_back.in_proper_condition {
                car.in_proper_condition = sea_orm::ActiveValue::Set(condition);
            }
            car.update(&db_tx).await?;

            self.offer_to_next(&db_tx, rent.car_id, now).await?;
            tracing::info!(%rent_id, recipient = %actor.id, km = take_back.ending_kilometer, "car taken back");
            Ok(rent)
        })
    }
}
