use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Car, EngineError, Rent, RentStatus, ResultEngine, Role, User, addresses, cars, rents, users,
};

use super::Engine;

impl Engine {
    pub(super) async fn find_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<Option<User>> {
        let Some(model) = users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let address = match &model.address_id {
            Some(address_id) => {
                addresses::Entity::find_by_id(address_id.clone())
                    .one(db)
                    .await?
            }
            None => None,
        };
        User::try_from((model, address)).map(Some)
    }

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        self.find_user(db, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// The acting user. An unknown actor is treated as unauthorized rather
    /// than missing.
    pub(super) async fn require_actor(
        &self,
        db: &DatabaseTransaction,
        actor_id: Uuid,
    ) -> ResultEngine<User> {
        self.find_user(db, actor_id)
            .await?
            .ok_or_else(|| EngineError::Forbidden("unknown user".to_string()))
    }

    pub(super) async fn require_staff(
        &self,
        db: &DatabaseTransaction,
        actor_id: Uuid,
    ) -> ResultEngine<User> {
        let actor = self.require_actor(db, actor_id).await?;
        if !actor.role.is_staff() {
            return Err(EngineError::Forbidden("staff role required".to_string()));
        }
        Ok(actor)
    }

    pub(super) async fn require_admin(
        &self,
        db: &DatabaseTransaction,
        actor_id: Uuid,
    ) -> ResultEngine<User> {
        let actor = self.require_actor(db, actor_id).await?;
        if actor.role != Role::Admin {
            return Err(EngineError::Forbidden("admin role required".to_string()));
        }
        Ok(actor)
    }

    /// Staff may act on anyone; renters only on themselves.
    pub(super) async fn require_self_or_staff(
        &self,
        db: &DatabaseTransaction,
        actor_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        let actor = self.require_actor(db, actor_id).await?;
        if actor.id != user_id && !actor.role.is_staff() {
            return Err(EngineError::Forbidden(
                "cannot act on behalf of another user".to_string(),
            ));
        }
        Ok(actor)
    }

    pub(super) async fn car_is_handed_over(
        &self,
        db: &DatabaseTransaction,
        car_id: &str,
    ) -> ResultEngine<bool> {
        let out = rents::Entity::find()
            .filter(rents::Column::CarId.eq(car_id.to_string()))
            .filter(rents::Column::Status.eq(RentStatus::HandedOver.as_str()))
            .one(db)
            .await?
            .is_some();
        Ok(out)
    }

    pub(super) async fn car_from_model(
        &self,
        db: &DatabaseTransaction,
        model: cars::Model,
    ) -> ResultEngine<Car> {
        let handed_over = self.car_is_handed_over(db, &model.id).await?;
        Car::try_from((model, handed_over))
    }

    pub(super) async fn require_car_model(
        &self,
        db: &DatabaseTransaction,
        car_id: Uuid,
    ) -> ResultEngine<cars::Model> {
        cars::Entity::find_by_id(car_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("car not exists".to_string()))
    }

    pub(super) async fn require_car(
        &self,
        db: &DatabaseTransaction,
        car_id: Uuid,
    ) -> ResultEngine<Car> {
        let model = self.require_car_model(db, car_id).await?;
        self.car_from_model(db, model).await
    }

    pub(super) async fn require_rent(
        &self,
        db: &DatabaseTransaction,
        rent_id: Uuid,
    ) -> ResultEngine<Rent> {
        let model = rents::Entity::find_by_id(rent_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("rent not exists".to_string()))?;
        Rent::try_from(model)
    }
}
