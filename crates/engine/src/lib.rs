//! Car rental engine.
//!
//! Domain types, their sea-orm storage models and the [`Engine`] operations
//! driving the rental lifecycle:
//!
//! - inventory: [`Car`], [`Depot`], [`Address`]
//! - accounts: [`User`] with [`Role`]-based authorization
//! - bookings: [`Rent`] state machine, [`Receipt`] settlement
//! - queueing: [`WaitingListEntry`] per car
//!
//! Every operation runs inside one database transaction.

pub use addresses::{Address, AddressInput};
pub use cars::{
    Car, CarInput, CarPatch, CarStatus, FuelType, MAX_KILOMETERS, MAX_PRICE_PER_KILOMETER,
    RequiredLicence,
};
pub use depots::{Depot, DepotInput, DepotPatch};
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{
    CarListFilter, Engine, EngineBuilder, RentListFilter, RentPage, RentRequest, Statistics,
    TakeBack,
};
pub use receipts::Receipt;
pub use rents::{CANCELED_BY_RENTER, Rent, RentStatus};
pub use users::{GuestInput, Role, User, UserPatch, UserRegistration};
pub use waiting_list::{WaitingListEntry, WaitingListStatus};

mod addresses;
mod cars;
mod depots;
mod error;
mod money;
mod ops;
mod receipts;
mod rents;
mod users;
mod util;
pub mod validation;
mod waiting_list;

type ResultEngine<T> = Result<T, EngineError>;
