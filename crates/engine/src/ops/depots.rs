use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Address, Depot, DepotInput, DepotPatch, EngineError, ResultEngine, addresses, cars, depots,
    util::normalize_text,
    validation::{into_result, violations},
};

use super::{Engine, with_tx};

impl Engine {
    async fn load_depot(&self, db: &DatabaseTransaction, model: depots::Model) -> ResultEngine<Depot> {
        let address = addresses::Entity::find_by_id(model.address_id.clone())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("address not exists".to_string()))?;
        Depot::try_from((model, address))
    }

    async fn require_depot(&self, db: &DatabaseTransaction, depot_id: Uuid) -> ResultEngine<Depot> {
        let model = depots::Entity::find_by_id(depot_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("depot not exists".to_string()))?;
        self.load_depot(db, model).await
    }

    async fn require_unique_depot_name(
        &self,
        db: &DatabaseTransaction,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query =
            depots::Entity::find().filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(id) = except {
            query = query.filter(depots::Column::Id.ne(id.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    pub async fn depot(&self, depot_id: Uuid) -> ResultEngine<Depot> {
        with_tx!(self, |db_tx| self.require_depot(&db_tx, depot_id).await)
    }

    pub async fn list_depots(&self) -> ResultEngine<Vec<Depot>> {
        with_tx!(self, |db_tx| {
            let models = depots::Entity::find()
                .order_by_asc(depots::Column::Name)
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(self.load_depot(&db_tx, model).await?);
            }
            Ok(out)
        })
    }

    /// Authorization: staff.
    pub async fn create_depot(&self, actor_id: Uuid, input: &DepotInput) -> ResultEngine<Depot> {
        let mut errors = violations(input);
        errors.extend(violations(&input.address));
        into_result(errors)?;

        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            let depot = Depot::new(input);
            self.require_unique_depot_name(&db_tx, &depot.name, None)
                .await?;

            addresses::ActiveModel::from(&depot.address)
                .insert(&db_tx)
                .await?;
            depots::ActiveModel::from(&depot).insert(&db_tx).await?;
            tracing::info!(depot_id = %depot.id, name = %depot.name, "depot created");
            Ok(depot)
        })
    }

    /// Rename a depot and/or replace its address in place.
    ///
    /// Authorization: staff.
    pub async fn update_depot(
        &self,
        actor_id: Uuid,
        depot_id: Uuid,
        patch: &DepotPatch,
    ) -> ResultEngine<Depot> {
        let mut errors = violations(patch);
        if let Some(address) = &patch.address {
            errors.extend(violations(address));
        }
        into_result(errors)?;

        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            let mut depot = self.require_depot(&db_tx, depot_id).await?;

            if let Some(name) = &patch.name {
                let name = normalize_text(name);
                self.require_unique_depot_name(&db_tx, &name, Some(depot.id))
                    .await?;
                depot.name = name;
                depots::ActiveModel {
                    id: ActiveValue::Set(depot.id.to_string()),
                    name: ActiveValue::Set(depot.name.clone()),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
            }
            if let Some(address) = &patch.address {
                depot.address = Address::with_id(depot.address.id, address);
                addresses::ActiveModel::from(&depot.address)
                    .update(&db_tx)
                    .await?;
            }
            Ok(depot)
        })
    }

    /// Remove a depot and its address.
    ///
    /// Refused while any car in the fleet is assigned to it; deleted cars
    /// lose the reference.
    ///
    /// Authorization: staff.
    pub async fn delete_depot(&self, actor_id: Uuid, depot_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            let depot = self.require_depot(&db_tx, depot_id).await?;

            let assigned = cars::Entity::find()
                .filter(cars::Column::DepotId.eq(depot_id.to_string()))
                .filter(cars::Column::Deleted.eq(false))
                .count(&db_tx)
                .await?;
            if assigned > 0 {
                return Err(EngineError::InUse(format!(
                    "depot {} has {assigned} car(s)",
                    depot.name
                )));
            }

            cars::Entity::update_many()
                .col_expr(cars::Column::DepotId, Expr::value(Option::<String>::None))
                .filter(cars::Column::DepotId.eq(depot_id.to_string()))
                .exec(&db_tx)
                .await?;
            depots::Entity::delete_by_id(depot_id.to_string())
                .exec(&db_tx)
                .await?;
            addresses::Entity::delete_by_id(depot.address.id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::info!(%depot_id, "depot deleted");
            Ok(())
        })
    }
}
