use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Address, EngineError, GuestInput, ResultEngine, Role, User, UserPatch, UserRegistration,
    addresses, users,
    util::{normalize_identity, normalize_optional_text, normalize_text},
    validation::{into_result, violations},
};

use super::{Engine, with_tx};

impl Engine {
    fn hash_password(&self, password: &str) -> ResultEngine<String> {
        Ok(bcrypt::hash(password, self.password_cost)?)
    }

    async fn require_unique_identity(
        &self,
        db: &DatabaseTransaction,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        if let Some(username) = username {
            let mut query = users::Entity::find().filter(users::Column::Username.eq(username));
            if let Some(id) = except {
                query = query.filter(users::Column::Id.ne(id.to_string()));
            }
            if query.one(db).await?.is_some() {
                return Err(EngineError::ExistingKey(username.to_string()));
            }
        }
        if let Some(email) = email {
            let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
            if let Some(id) = except {
                query = query.filter(users::Column::Id.ne(id.to_string()));
            }
            if query.one(db).await?.is_some() {
                return Err(EngineError::ExistingKey(email.to_string()));
            }
        }
        Ok(())
    }

    async fn insert_user(&self, db: &DatabaseTransaction, user: &User) -> ResultEngine<()> {
        self.require_unique_identity(db, user.username.as_deref(), Some(&user.email), None)
            .await?;
        if let Some(address) = &user.address {
            addresses::ActiveModel::from(address).insert(db).await?;
        }
        users::ActiveModel::from(user).insert(db).await?;
        Ok(())
    }

    /// Create a registered account with `role`.
    ///
    /// No actor check: this is the bootstrap path used by the admin CLI.
    /// Self-registration goes through [`Engine::register`].
    pub async fn create_account(&self, input: &UserRegistration, role: Role) -> ResultEngine<User> {
        let mut errors = violations(input);
        if let Some(address) = &input.address {
            errors.extend(violations(address));
        }
        into_result(errors)?;

        let mut user = User::registered(input, self.hash_password(&input.password)?);
        user.role = role;
        with_tx!(self, |db_tx| {
            self.insert_user(&db_tx, &user).await?;
            tracing::info!(user_id = %user.id, role = role.as_str(), "account created");
            Ok(user)
        })
    }

    /// Self-registration of a renter account.
    pub async fn register(&self, input: &UserRegistration) -> ResultEngine<User> {
        self.create_account(input, Role::Renter).await
    }

    /// Register a walk-in renter without credentials.
    ///
    /// Authorization: staff.
    pub async fn create_guest(&self, actor_id: Uuid, input: &GuestInput) -> ResultEngine<User> {
        let mut errors = violations(input);
        if let Some(address) = &input.address {
            errors.extend(violations(address));
        }
        into_result(errors)?;

        let user = User::guest(input);
        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            self.insert_user(&db_tx, &user).await?;
            tracing::info!(user_id = %user.id, "guest created");
            Ok(user)
        })
    }

    /// Check credentials. `identifier` is either the username or the email.
    ///
    /// Every failure (unknown identifier, guest account, wrong password) is
    /// reported as [`EngineError::InvalidCredentials`].
    pub async fn login(&self, identifier: &str, password: &str) -> ResultEngine<User> {
        let identifier = normalize_identity(identifier);
        if identifier.is_empty() || password.is_empty() {
            return Err(EngineError::InvalidCredentials);
        }

        let user = with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(
                    Condition::any()
                        .add(users::Column::Username.eq(identifier.clone()))
                        .add(users::Column::Email.eq(identifier.clone())),
                )
                .one(&db_tx)
                .await?;
            match model {
                Some(model) => {
                    let user_id = crate::util::parse_uuid(&model.id, "user")?;
                    self.find_user(&db_tx, user_id).await
                }
                None => Ok(None),
            }
        })?;

        let Some(user) = user.filter(User::can_log_in) else {
            tracing::debug!("login refused: unknown identifier or guest account");
            return Err(EngineError::InvalidCredentials);
        };
        let hash = user.password_hash.as_deref().unwrap_or_default();
        if !bcrypt::verify(password, hash)? {
            tracing::debug!(user_id = %user.id, "login refused: wrong password");
            return Err(EngineError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Authorization: the user themself or staff.
    pub async fn user(&self, actor_id: Uuid, user_id: Uuid) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            self.require_self_or_staff(&db_tx, actor_id, user_id)
                .await?;
            self.require_user(&db_tx, user_id).await
        })
    }

    /// All users ordered by name.
    ///
    /// Authorization: staff.
    pub async fn list_users(&self, actor_id: Uuid) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            let models = users::Entity::find()
                .order_by_asc(users::Column::Name)
                .order_by_asc(users::Column::Id)
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let address = match &model.address_id {
                    Some(id) => addresses::Entity::find_by_id(id.clone()).one(&db_tx).await?,
                    None => None,
                };
                out.push(User::try_from((model, address))?);
            }
            Ok(out)
        })
    }

    /// Update the profile fields present in `patch`.
    ///
    /// The address is overwritten in place when the user already has one.
    ///
    /// Authorization: the user themself or staff.
    pub async fn update_user(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        patch: &UserPatch,
    ) -> ResultEngine<User> {
        let mut errors = violations(patch);
        if let Some(address) = &patch.address {
            errors.extend(violations(address));
        }
        into_result(errors)?;

        let password_hash = patch
            .password
            .as_deref()
            .map(|p| self.hash_password(p))
            .transpose()?;

        with_tx!(self, |db_tx| {
            self.require_self_or_staff(&db_tx, actor_id, user_id)
                .await?;
            let mut user = self.require_user(&db_tx, user_id).await?;

            if let Some(email) = &patch.email {
                let email = normalize_identity(email);
                self.require_unique_identity(&db_tx, None, Some(&email), Some(user.id))
                    .await?;
                user.email = email;
            }
            if let Some(name) = &patch.name {
                user.name = normalize_text(name);
            }
            if let Some(phone_number) = &patch.phone_number {
                user.phone_number = normalize_text(phone_number);
            }
            if patch.licence_id.is_some() {
                user.licence_id = normalize_optional_text(patch.licence_id.as_deref());
            }
            if let Some(hash) = password_hash {
                if !user.registered {
                    return Err(EngineError::InvalidTransition(
                        "guests cannot have a password".to_string(),
                    ));
                }
                user.password_hash = Some(hash);
            }
            if let Some(input) = &patch.address {
                match &user.address {
                    Some(existing) => {
                        let address = Address::with_id(existing.id, input);
                        addresses::ActiveModel::from(&address).update(&db_tx).await?;
                        user.address = Some(address);
                    }
                    None => {
                        let address = Address::new(input);
                        addresses::ActiveModel::from(&address).insert(&db_tx).await?;
                        user.address = Some(address);
                    }
                }
            }

            users::ActiveModel::from(&user).update(&db_tx).await?;
            Ok(user)
        })
    }

    /// Change a user's role.
    ///
    /// Guests stay renters, and the last admin cannot be demoted.
    ///
    /// Authorization: admin.
    pub async fn set_role(&self, actor_id: Uuid, user_id: Uuid, role: Role) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let mut user = self.require_user(&db_tx, user_id).await?;
            if user.role == role {
                return Ok(user);
            }
            if !user.registered && role != Role::Renter {
                return Err(EngineError::InvalidTransition(
                    "guests cannot hold a staff role".to_string(),
                ));
            }
            if user.role == Role::Admin {
                let admins = users::Entity::find()
                    .filter(users::Column::Role.eq(Role::Admin.as_str()))
                    .count(&db_tx)
                    .await?;
                if admins <= 1 {
                    return Err(EngineError::InvalidTransition(
                        "cannot demote the last admin".to_string(),
                    ));
                }
            }

            users::ActiveModel {
                id: ActiveValue::Set(user.id.to_string()),
                role: ActiveValue::Set(role.as_str().to_string()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            tracing::info!(%user_id, from = user.role.as_str(), to = role.as_str(), "role changed");
            user.role = role;
            Ok(user)
        })
    }
}
