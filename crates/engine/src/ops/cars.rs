use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Car, CarInput, CarPatch, EngineError, FuelType, RentStatus, ResultEngine, cars, depots, rents,
    util::normalize_plate,
    validation::validate,
};

use super::{Engine, with_tx};

/// Filters for [`Engine::list_cars`].
#[derive(Clone, Debug, Default)]
pub struct CarListFilter {
    /// Also return soft-deleted cars (default: false).
    pub include_deleted: bool,
    pub depot_id: Option<Uuid>,
    pub fuel_type: Option<FuelType>,
    /// Only cars without an open rent overlapping `[start, end)`.
    pub available_between: Option<(NaiveDate, NaiveDate)>,
}

impl Engine {
    /// Return a car, deleted ones included.
    pub async fn car(&self, car_id: Uuid) -> ResultEngine<Car> {
        with_tx!(self, |db_tx| self.require_car(&db_tx, car_id).await)
    }

    /// List cars ordered by brand, model and plate.
    pub async fn list_cars(&self, filter: &CarListFilter) -> ResultEngine<Vec<Car>> {
        if let Some((start, end)) = filter.available_between
            && end <= start
        {
            return Err(EngineError::Validation(vec![
                "end date must be after start date".to_string(),
            ]));
        }

        with_tx!(self, |db_tx| {
            let mut query = cars::Entity::find()
                .order_by_asc(cars::Column::Brand)
                .order_by_asc(cars::Column::Model)
                .order_by_asc(cars::Column::LicencePlate);
            if !filter.include_deleted {
                query = query.filter(cars::Column::Deleted.eq(false));
            }
            if let Some(depot_id) = filter.depot_id {
                query = query.filter(cars::Column::DepotId.eq(depot_id.to_string()));
            }
            if let Some(fuel_type) = filter.fuel_type {
                query = query.filter(cars::Column::FuelType.eq(fuel_type.as_str()));
            }
            let models = query.all(&db_tx).await?;

            let busy: HashSet<String> = match filter.available_between {
                Some((start, end)) => rents::Entity::find()
                    .filter(rents::Column::Status.is_in(RentStatus::OPEN.map(RentStatus::as_str)))
                    .filter(rents::Column::PlannedStart.lt(end))
                    .filter(rents::Column::PlannedEnd.gt(start))
                    .all(&db_tx)
                    .await?
                    .into_iter()
                    .map(|rent| rent.car_id)
                    .collect(),
                None => HashSet::new(),
            };

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                if busy.contains(&model.id) {
                    continue;
                }
                out.push(self.car_from_model(&db_tx, model).await?);
            }
            Ok(out)
        })
    }

    /// Add a car to the fleet.
    ///
    /// Authorization: staff.
    pub async fn create_car(&self, actor_id: Uuid, input: &CarInput) -> ResultEngine<Car> {
        validate(input)?;
        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            let car = Car::new(input);
            self.require_unique_plate(&db_tx, &car.licence_plate, None)
                .await?;
            if let Some(depot_id) = car.depot_id {
                self.require_depot_exists(&db_tx, depot_id).await?;
            }

            cars::ActiveModel::from(&car).insert(&db_tx).await?;
            tracing::info!(car_id = %car.id, plate = %car.licence_plate, "car created");
            Ok(car)
        })
    }

    /// Update the fields present in `patch`. Deleted cars are read-only.
    ///
    /// Authorization: staff.
    pub async fn update_car(
        &self,
        actor_id: Uuid,
        car_id: Uuid,
        patch: &CarPatch,
    ) -> ResultEngine<Car> {
        validate(patch)?;
        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            let mut car = self.require_car(&db_tx, car_id).await?;
            if car.deleted {
                return Err(EngineError::InvalidTransition(
                    "car is deleted".to_string(),
                ));
            }

            car.apply(patch);
            if patch.licence_plate.is_some() {
                self.require_unique_plate(&db_tx, &car.licence_plate, Some(car.id))
                    .await?;
            }
            if let Some(depot_id) = patch.depot_id {
                self.require_depot_exists(&db_tx, depot_id).await?;
            }

            cars::ActiveModel::from(&car).update(&db_tx).await?;
            Ok(car)
        })
    }

    /// Soft-delete a car.
    ///
    /// Refused while the car has open rents. Open waiting-list entries for
    /// the car are canceled.
    ///
    /// Authorization: staff.
    pub async fn delete_car(&self, actor_id: Uuid, car_id: Uuid) -> ResultEngine<()> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            let mut car = self.require_car(&db_tx, car_id).await?;
            if car.deleted {
                return Err(EngineError::KeyNotFound("car not exists".to_string()));
            }

            let open_rents = rents::Entity::find()
                .filter(rents::Column::CarId.eq(car_id.to_string()))
                .filter(rents::Column::Status.is_in(RentStatus::OPEN.map(RentStatus::as_str)))
                .count(&db_tx)
                .await?;
            if open_rents > 0 {
                return Err(EngineError::InUse(format!(
                    "car {} has {open_rents} open rent(s)",
                    car.licence_plate
                )));
            }

            let canceled = self.cancel_open_entries(&db_tx, car_id, now).await?;
            car.deleted = true;
            cars::ActiveModel::from(&car).update(&db_tx).await?;
            tracing::info!(%car_id, canceled, "car deleted");
            Ok(())
        })
    }

    async fn require_unique_plate(
        &self,
        db: &DatabaseTransaction,
        plate: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let plate = normalize_plate(plate);
        let mut query = cars::Entity::find()
            .filter(cars::Column::LicencePlate.eq(plate.clone()))
            .filter(cars::Column::Deleted.eq(false));
        if let Some(id) = except {
            query = query.filter(cars::Column::Id.ne(id.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(plate));
        }
        Ok(())
    }

    pub(super) async fn require_depot_exists(
        &self,
        db: &DatabaseTransaction,
        depot_id: Uuid,
    ) -> ResultEngine<()> {
        let exists = depots::Entity::find_by_id(depot_id.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("depot not exists".to_string()));
        }
        Ok(())
    }
}
