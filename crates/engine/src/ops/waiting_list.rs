use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, User, WaitingListEntry, WaitingListStatus, waiting_list};

use super::{Engine, with_tx};

fn ensure_owner_or_staff(actor: &User, entry: &WaitingListEntry) -> ResultEngine<()> {
    if actor.role.is_staff() || entry.user_id == actor.id {
        return Ok(());
    }
    Err(EngineError::Forbidden(
        "waiting list entry belongs to another user".to_string(),
    ))
}

impl Engine {
    async fn require_entry(
        &self,
        db: &DatabaseTransaction,
        entry_id: Uuid,
    ) -> ResultEngine<WaitingListEntry> {
        let model = waiting_list::Entity::find_by_id(entry_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("waiting list entry not exists".to_string()))?;
        WaitingListEntry::try_from(model)
    }

    async fn save_entry(&self, db: &DatabaseTransaction, entry: &WaitingListEntry) -> ResultEngine<()> {
        waiting_list::ActiveModel::from(entry).update(db).await?;
        Ok(())
    }

    /// Cancel notified entries whose offer timed out, without offering the
    /// car to anyone else.
    async fn cancel_stale(
        &self,
        db: &DatabaseTransaction,
        car_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<WaitingListEntry>> {
        if self.notify_timeout.is_none() {
            return Ok(Vec::new());
        }
        let mut query = waiting_list::Entity::find()
            .filter(waiting_list::Column::Status.eq(WaitingListStatus::Notified.as_str()));
        if let Some(car_id) = car_id {
            query = query.filter(waiting_list::Column::CarId.eq(car_id.to_string()));
        }

        let mut expired = Vec::new();
        for model in query.all(db).await? {
            let mut entry = WaitingListEntry::try_from(model)?;
            if !entry.is_expired(now, self.notify_timeout) {
                continue;
            }
            entry.cancel(now)?;
            self.save_entry(db, &entry).await?;
            tracing::info!(entry_id = %entry.id, car_id = %entry.car_id, "waiting list offer expired");
            expired.push(entry);
        }
        Ok(expired)
    }

    /// Notify the lowest-position active entry of `car_id`.
    ///
    /// Stale offers are expired first. Nothing happens while another offer for
    /// the car is still pending.
    pub(super) async fn offer_to_next(
        &self,
        db: &DatabaseTransaction,
        car_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Option<WaitingListEntry>> {
        self.cancel_stale(db, Some(car_id), now).await?;

        let pending_offer = waiting_list::Entity::find()
            .filter(waiting_list::Column::CarId.eq(car_id.to_string()))
            .filter(waiting_list::Column::Status.eq(WaitingListStatus::Notified.as_str()))
            .one(db)
            .await?
            .is_some();
        if pending_offer {
            return Ok(None);
        }

        let Some(head) = waiting_list::Entity::find()
            .filter(waiting_list::Column::CarId.eq(car_id.to_string()))
            .filter(waiting_list::Column::Status.eq(WaitingListStatus::Active.as_str()))
            .order_by_asc(waiting_list::Column::QueuePosition)
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let mut entry = WaitingListEntry::try_from(head)?;
        entry.notify(now)?;
        self.save_entry(db, &entry).await?;
        tracing::info!(
            entry_id = %entry.id,
            %car_id,
            user_id = %entry.user_id,
            position = entry.queue_position,
            "waiting list head notified"
        );
        Ok(Some(entry))
    }

    /// Cancel every open entry of a car leaving the fleet.
    pub(super) async fn cancel_open_entries(
        &self,
        db: &DatabaseTransaction,
        car_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<usize> {
        let models = waiting_list::Entity::find()
            .filter(waiting_list::Column::CarId.eq(car_id.to_string()))
            .filter(waiting_list::Column::Status.is_in([
                WaitingListStatus::Active.as_str(),
                WaitingListStatus::Notified.as_str(),
            ]))
            .all(db)
            .await?;
        let count = models.len();
        for model in models {
            let mut entry = WaitingListEntry::try_from(model)?;
            entry.cancel(now)?;
            self.save_entry(db, &entry).await?;
        }
        Ok(count)
    }

    /// Append a user to the car's queue.
    ///
    /// The new entry takes `max(queue_position) + 1`; the read and the insert
    /// share one transaction. A user holds at most one open entry per car.
    ///
    /// Authorization: the user themself or staff.
    pub async fn join_waiting_list(
        &self,
        actor_id: Uuid,
        car_id: Uuid,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> ResultEngine<WaitingListEntry> {
        let user_id = user_id.unwrap_or(actor_id);
        with_tx!(self, |db_tx| {
            self.require_self_or_staff(&db_tx, actor_id, user_id)
                .await?;
            self.require_user(&db_tx, user_id).await?;
            let car = self.require_car_model(&db_tx, car_id).await?;
            if car.deleted {
                return Err(EngineError::KeyNotFound("car not exists".to_string()));
            }

            let already_waiting = waiting_list::Entity::find()
                .filter(waiting_list::Column::CarId.eq(car_id.to_string()))
                .filter(waiting_list::Column::UserId.eq(user_id.to_string()))
                .filter(waiting_list::Column::Status.is_in([
                    WaitingListStatus::Active.as_str(),
                    WaitingListStatus::Notified.as_str(),
                ]))
                .one(&db_tx)
                .await?
                .is_some();
            if already_waiting {
                return Err(EngineError::ExistingKey(
                    "user is already waiting for this car".to_string(),
                ));
            }

            let last_position = waiting_list::Entity::find()
                .filter(waiting_list::Column::CarId.eq(car_id.to_string()))
                .order_by_desc(waiting_list::Column::QueuePosition)
                .one(&db_tx)
                .await?
                .map_or(0, |model| model.queue_position);

            let entry = WaitingListEntry::new(car_id, user_id, last_position + 1, now);
            waiting_list::ActiveModel::from(&entry)
                .insert(&db_tx)
                .await?;
            tracing::info!(
                entry_id = %entry.id,
                %car_id,
                %user_id,
                position = entry.queue_position,
                "joined waiting list"
            );
            Ok(entry)
        })
    }

    /// The car's queue in position order, after expiring stale offers.
    ///
    /// Staff see every entry; renters only their own.
    pub async fn waiting_list(
        &self,
        actor_id: Uuid,
        car_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<WaitingListEntry>> {
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            self.require_car_model(&db_tx, car_id).await?;
            let expired = self.cancel_stale(&db_tx, Some(car_id), now).await?;
            if !expired.is_empty() {
                self.offer_to_next(&db_tx, car_id, now).await?;
            }

            let mut query = waiting_list::Entity::find()
                .filter(waiting_list::Column::CarId.eq(car_id.to_string()))
                .order_by_asc(waiting_list::Column::QueuePosition);
            if !actor.role.is_staff() {
                query = query.filter(waiting_list::Column::UserId.eq(actor.id.to_string()));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(WaitingListEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Offer the car to the head of its queue.
    ///
    /// Returns the notified entry, or `None` when the queue is empty or an
    /// offer is still open.
    ///
    /// Authorization: staff.
    pub async fn notify_next(
        &self,
        actor_id: Uuid,
        car_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Option<WaitingListEntry>> {
        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            self.require_car_model(&db_tx, car_id).await?;
            self.offer_to_next(&db_tx, car_id, now).await
        })
    }

    /// Notified → Booked.
    ///
    /// An expired offer is canceled and passed on to the next waiting user
    /// before the confirmation is refused.
    ///
    /// Authorization: the entry's user or staff.
    pub async fn confirm_entry(
        &self,
        actor_id: Uuid,
        entry_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<WaitingListEntry> {
        let outcome: ResultEngine<ResultEngine<WaitingListEntry>> = with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let mut entry = self.require_entry(&db_tx, entry_id).await?;
            ensure_owner_or_staff(&actor, &entry)?;
            if entry.is_expired(now, self.notify_timeout) {
                entry.cancel(now)?;
                self.save_entry(&db_tx, &entry).await?;
                tracing::info!(%entry_id, car_id = %entry.car_id, "waiting list offer expired");
                self.offer_to_next(&db_tx, entry.car_id, now).await?;
                Ok(Err(EngineError::InvalidTransition(
                    "waiting list offer expired".to_string(),
                )))
            } else {
                entry.confirm(now)?;
                self.save_entry(&db_tx, &entry).await?;
                tracing::info!(%entry_id, "waiting list offer booked");
                Ok(Ok(entry))
            }
        });
        outcome?
    }

    /// Active/Notified → Canceled. Declining an offer passes it on.
    ///
    /// Authorization: the entry's user or staff.
    pub async fn cancel_entry(
        &self,
        actor_id: Uuid,
        entry_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<WaitingListEntry> {
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let mut entry = self.require_entry(&db_tx, entry_id).await?;
            ensure_owner_or_staff(&actor, &entry)?;
            let was_notified = entry.status == WaitingListStatus::Notified;
            entry.cancel(now)?;
            self.save_entry(&db_tx, &entry).await?;
            if was_notified {
                self.offer_to_next(&db_tx, entry.car_id, now).await?;
            }
            Ok(entry)
        })
    }

    /// Cancel every offer older than the configured timeout and pass each
    /// car on to its next waiting user. Returns the expired entries.
    ///
    /// Authorization: staff.
    pub async fn expire_notified(
        &self,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<WaitingListEntry>> {
        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            let expired = self.cancel_stale(&db_tx, None, now).await?;
            let cars: BTreeSet<Uuid> = expired.iter().map(|entry| entry.car_id).collect();
            for car_id in cars {
                self.offer_to_next(&db_tx, car_id, now).await?;
            }
            Ok(expired)
        })
    }

    /// Open entries of a user across all cars.
    ///
    /// Authorization: the user themself or staff.
    pub async fn entries_for_user(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Vec<WaitingListEntry>> {
        with_tx!(self, |db_tx| {
            self.require_self_or_staff(&db_tx, actor_id, user_id)
                .await?;
            waiting_list::Entity::find()
                .filter(waiting_list::Column::UserId.eq(user_id.to_string()))
                .filter(waiting_list::Column::Status.is_in([
                    WaitingListStatus::Active.as_str(),
                    WaitingListStatus::Notified.as_str(),
                ]))
                .order_by_asc(waiting_list::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(WaitingListEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn user(role: Role) -> User {
        let mut user = User::guest(&crate::GuestInput {
            name: "Someone".to_string(),
            email: "someone@example.com".to_string(),
            phone_number: "123456".to_string(),
            licence_id: None,
            address: None,
        });
        user.role = role;
        user
    }

    #[test]
    fn only_owner_or_staff_touch_an_entry() {
        let owner = user(Role::Renter);
        let stranger = user(Role::Renter);
        let staff = user(Role::Staff);
        let entry = WaitingListEntry::new(Uuid::new_v4(), owner.id, 1, Utc::now());

        assert!(ensure_owner_or_staff(&owner, &entry).is_ok());
        assert!(ensure_owner_or_staff(&staff, &entry).is_ok());
        assert!(matches!(
            ensure_owner_or_staff(&stranger, &entry),
            Err(EngineError::Forbidden(_))
        ));
    }
}
