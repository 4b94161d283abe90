pub use sea_orm_migration::prelude::*;

mod m20240601_000000_init;
mod m20240615_000000_waiting_list;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000000_init::Migration),
            Box::new(m20240615_000000_waiting_list::Migration),
        ]
    }
}
