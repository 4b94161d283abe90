use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, Receipt, ResultEngine, User, receipts, rents};

use super::{Engine, with_tx};

impl Engine {
    async fn require_receipt(
        &self,
        db: &DatabaseTransaction,
        receipt_id: Uuid,
    ) -> ResultEngine<Receipt> {
        let model = receipts::Entity::find_by_id(receipt_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("receipt not exists".to_string()))?;
        Receipt::try_from(model)
    }

    async fn ensure_receipt_visible(
        &self,
        db: &DatabaseTransaction,
        actor: &User,
        receipt: &Receipt,
    ) -> ResultEngine<()> {
        if actor.role.is_staff() {
            return Ok(());
        }
        let rent = self.require_rent(db, receipt.rent_id).await?;
        if rent.renter_id != actor.id {
            return Err(EngineError::Forbidden(
                "receipt belongs to another user".to_string(),
            ));
        }
        Ok(())
    }

    /// Returned → Invoiced: settle the rent.
    ///
    /// The total is `(ending_kilometer - starting_kilometer) *
    /// price_per_kilometer` of the car at issue time.
    ///
    /// Authorization: staff.
    pub async fn issue_receipt(&self, actor_id: Uuid, rent_id: Uuid) -> ResultEngine<Receipt> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let actor = self.require_staff(&db_tx, actor_id).await?;
            let mut rent = self.require_rent(&db_tx, rent_id).await?;

            let already = receipts::Entity::find()
                .filter(receipts::Column::RentId.eq(rent_id.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if already {
                return Err(EngineError::ExistingKey(format!("receipt for rent {rent_id}")));
            }

            let car = self.require_car_model(&db_tx, rent.car_id).await?;
            let receipt = Receipt::for_rent(
                &rent,
                MoneyCents::new(car.price_per_kilometer),
                actor.id,
                now,
            )?;
            rent.mark_invoiced(now)?;

            receipts::ActiveModel::from(&receipt).insert(&db_tx).await?;
            rents::ActiveModel::from(&rent).update(&db_tx).await?;
            tracing::info!(
                %rent_id,
                receipt_id = %receipt.id,
                total = %receipt.total_cost,
                "receipt issued"
            );
            Ok(receipt)
        })
    }

    /// Overwrite a receipt total.
    ///
    /// Authorization: staff.
    pub async fn correct_receipt(
        &self,
        actor_id: Uuid,
        receipt_id: Uuid,
        total_cost: MoneyCents,
    ) -> ResultEngine<Receipt> {
        with_tx!(self, |db_tx| {
            let actor = self.require_staff(&db_tx, actor_id).await?;
            let mut receipt = self.require_receipt(&db_tx, receipt_id).await?;
            let previous = receipt.total_cost;
            receipt.correct(total_cost)?;
            receipts::ActiveModel::from(&receipt).update(&db_tx).await?;
            tracing::info!(
                %receipt_id,
                by = %actor.id,
                from = %previous,
                to = %receipt.total_cost,
                "receipt corrected"
            );
            Ok(receipt)
        })
    }

    /// Authorization: staff or the renter of the settled rent.
    pub async fn receipt(&self, actor_id: Uuid, receipt_id: Uuid) -> ResultEngine<Receipt> {
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let receipt = self.require_receipt(&db_tx, receipt_id).await?;
            self.ensure_receipt_visible(&db_tx, &actor, &receipt)
                .await?;
            Ok(receipt)
        })
    }

    /// Authorization: staff or the renter of the rent.
    pub async fn receipt_for_rent(&self, actor_id: Uuid, rent_id: Uuid) -> ResultEngine<Receipt> {
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let model = receipts::Entity::find()
                .filter(receipts::Column::RentId.eq(rent_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("receipt not exists".to_string()))?;
            let receipt = Receipt::try_from(model)?;
            self.ensure_receipt_visible(&db_tx, &actor, &receipt)
                .await?;
            Ok(receipt)
        })
    }

    /// Receipts newest first. Renters only see receipts of their own rents.
    pub async fn list_receipts(&self, actor_id: Uuid) -> ResultEngine<Vec<Receipt>> {
        with_tx!(self, |db_tx| {
            let actor = self.require_actor(&db_tx, actor_id).await?;
            let mut query = receipts::Entity::find()
                .order_by_desc(receipts::Column::IssueDate)
                .order_by_desc(receipts::Column::Id);
            if !actor.role.is_staff() {
                let own: Vec<String> = rents::Entity::find()
                    .filter(rents::Column::RenterId.eq(actor.id.to_string()))
                    .all(&db_tx)
                    .await?
                    .into_iter()
                    .map(|rent| rent.id)
                    .collect();
                query = query.filter(receipts::Column::RentId.is_in(own));
            }
            query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Receipt::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
