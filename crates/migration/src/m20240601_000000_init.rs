//! Initial schema migration.
//!
//! Creates the rental schema:
//!
//! - `addresses`: postal addresses owned by a user or a depot
//! - `users`: renters, staff and admins (guests have no credentials)
//! - `depots`: pick-up/drop-off locations
//! - `cars`: inventory, soft-deleted via `deleted`
//! - `rents`: reservations and their lifecycle fields
//! - `receipts`: one settlement per rent

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Addresses {
    Table,
    Id,
    Zip,
    City,
    Street,
    HouseNumber,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Username,
    Email,
    Password,
    PhoneNumber,
    LicenceId,
    AddressId,
    Role,
    Registered,
    CreatedAt,
}

#[derive(Iden)]
enum Depots {
    Table,
    Id,
    Name,
    AddressId,
}

#[derive(Iden)]
enum Cars {
    Table,
    Id,
    Brand,
    Model,
    FuelType,
    RequiredLicence,
    LicencePlate,
    HasValidVignette,
    PricePerKilometer,
    IsAutomatic,
    ActualKilometers,
    InProperCondition,
    DepotId,
    Deleted,
    CreatedAt,
}

#[derive(Iden)]
enum Rents {
    Table,
    Id,
    RenterId,
    CarId,
    Status,
    PlannedStart,
    PlannedEnd,
    ActualStart,
    ActualEnd,
    StartingKilometer,
    EndingKilometer,
    ApproverId,
    IssuerId,
    RecipientId,
    RejectionReason,
    InvoiceRequest,
    IssuedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Receipts {
    Table,
    Id,
    RentId,
    TotalCost,
    IssueDate,
    IssuerId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Addresses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Addresses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Addresses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Addresses::Zip).string().not_null())
                    .col(ColumnDef::new(Addresses::City).string().not_null())
                    .col(ColumnDef::new(Addresses::Street).string().not_null())
                    .col(ColumnDef::new(Addresses::HouseNumber).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Username).string())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Password).string())
                    .col(ColumnDef::new(Users::PhoneNumber).string().not_null())
                    .col(ColumnDef::new(Users::LicenceId).string())
                    .col(ColumnDef::new(Users::AddressId).string())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("renter"),
                    )
                    .col(ColumnDef::new(Users::Registered).boolean().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-address_id")
                            .from(Users::Table, Users::AddressId)
                            .to(Addresses::Table, Addresses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Usernames and emails are stored normalized, so plain unique indexes
        // are case-insensitive in practice. Guests have a NULL username.
        manager
            .create_index(
                Index::create()
                    .name("uidx-users-username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-users-email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Depots
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Depots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Depots::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Depots::Name).string().not_null())
                    .col(ColumnDef::new(Depots::AddressId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-depots-address_id")
                            .from(Depots::Table, Depots::AddressId)
                            .to(Addresses::Table, Addresses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Cars
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Cars::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cars::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Cars::Brand).string().not_null())
                    .col(ColumnDef::new(Cars::Model).string().not_null())
                    .col(ColumnDef::new(Cars::FuelType).string().not_null())
                    .col(ColumnDef::new(Cars::RequiredLicence).string().not_null())
                    .col(ColumnDef::new(Cars::LicencePlate).string_len(15).not_null())
                    .col(ColumnDef::new(Cars::HasValidVignette).boolean().not_null())
                    .col(
                        ColumnDef::new(Cars::PricePerKilometer)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Cars::IsAutomatic).boolean().not_null())
                    .col(
                        ColumnDef::new(Cars::ActualKilometers)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Cars::InProperCondition).boolean().not_null())
                    .col(ColumnDef::new(Cars::DepotId).string())
                    .col(
                        ColumnDef::new(Cars::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Cars::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cars-depot_id")
                            .from(Cars::Table, Cars::DepotId)
                            .to(Depots::Table, Depots::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cars-licence_plate")
                    .table(Cars::Table)
                    .col(Cars::LicencePlate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Rents
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Rents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rents::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Rents::RenterId).string().not_null())
                    .col(ColumnDef::new(Rents::CarId).string().not_null())
                    .col(ColumnDef::new(Rents::Status).string().not_null())
                    .col(ColumnDef::new(Rents::PlannedStart).date().not_null())
                    .col(ColumnDef::new(Rents::PlannedEnd).date().not_null())
                    .col(ColumnDef::new(Rents::ActualStart).timestamp())
                    .col(ColumnDef::new(Rents::ActualEnd).timestamp())
                    .col(ColumnDef::new(Rents::StartingKilometer).big_integer())
                    .col(ColumnDef::new(Rents::EndingKilometer).big_integer())
                    .col(ColumnDef::new(Rents::ApproverId).string())
                    .col(ColumnDef::new(Rents::IssuerId).string())
                    .col(ColumnDef::new(Rents::RecipientId).string())
                    .col(ColumnDef::new(Rents::RejectionReason).string())
                    .col(
                        ColumnDef::new(Rents::InvoiceRequest)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Rents::IssuedAt).timestamp())
                    .col(ColumnDef::new(Rents::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-rents-renter_id")
                            .from(Rents::Table, Rents::RenterId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-rents-car_id")
                            .from(Rents::Table, Rents::CarId)
                            .to(Cars::Table, Cars::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Overlap checks scan open rents of one car.
        manager
            .create_index(
                Index::create()
                    .name("idx-rents-car_id-status")
                    .table(Rents::Table)
                    .col(Rents::CarId)
                    .col(Rents::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-rents-renter_id")
                    .table(Rents::Table)
                    .col(Rents::RenterId)
                    .to_owned(),
            )
            .await?;

        // Pagination order: newest first.
        manager
            .create_index(
                Index::create()
                    .name("idx-rents-created_at-id")
                    .table(Rents::Table)
                    .col(Rents::CreatedAt)
                    .col(Rents::Id)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Receipts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Receipts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Receipts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Receipts::RentId).string().not_null())
                    .col(ColumnDef::new(Receipts::TotalCost).big_integer().not_null())
                    .col(ColumnDef::new(Receipts::IssueDate).timestamp().not_null())
                    .col(ColumnDef::new(Receipts::IssuerId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-receipts-rent_id")
                            .from(Receipts::Table, Receipts::RentId)
                            .to(Rents::Table, Rents::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-receipts-issuer_id")
                            .from(Receipts::Table, Receipts::IssuerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-receipts-rent_id")
                    .table(Receipts::Table)
                    .col(Receipts::RentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Receipts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cars::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Depots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Addresses::Table).to_owned())
            .await?;
        Ok(())
    }
}
