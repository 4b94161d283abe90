use chrono::Duration;
use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod cars;
mod depots;
mod receipts;
mod rents;
mod statistics;
mod users;
mod waiting_list;

pub use cars::CarListFilter;
pub use rents::{RentListFilter, RentPage, RentRequest, TakeBack};
pub use statistics::Statistics;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The rental engine.
///
/// Every public operation takes the id of the acting user and checks its role
/// before touching data; the HTTP layer only authenticates.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    password_cost: u32,
    notify_timeout: Option<Duration>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    password_cost: u32,
    notify_timeout: Option<Duration>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            password_cost: bcrypt::DEFAULT_COST,
            notify_timeout: None,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// bcrypt work factor for new password hashes.
    pub fn password_cost(mut self, cost: u32) -> EngineBuilder {
        self.password_cost = cost;
        self
    }

    /// Expire notified waiting-list entries after `timeout`. `None` disables
    /// expiry.
    pub fn notify_timeout(mut self, timeout: Option<Duration>) -> EngineBuilder {
        self.notify_timeout = timeout;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            password_cost: self.password_cost,
            notify_timeout: self.notify_timeout,
        })
    }
}
