use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum WaitingList {
    Table,
    Id,
    CarId,
    UserId,
    QueuePosition,
    Status,
    CreatedAt,
    NotifiedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Cars {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WaitingList::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaitingList::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WaitingList::CarId).string().not_null())
                    .col(ColumnDef::new(WaitingList::UserId).string().not_null())
                    .col(
                        ColumnDef::new(WaitingList::QueuePosition)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingList::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(WaitingList::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(WaitingList::NotifiedAt).timestamp())
                    .col(ColumnDef::new(WaitingList::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-waiting_list-car_id")
                            .from(WaitingList::Table, WaitingList::CarId)
                            .to(Cars::Table, Cars::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-waiting_list-user_id")
                            .from(WaitingList::Table, WaitingList::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-waiting_list-car_id-queue_position")
                    .table(WaitingList::Table)
                    .col(WaitingList::CarId)
                    .col(WaitingList::QueuePosition)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-waiting_list-user_id")
                    .table(WaitingList::Table)
                    .col(WaitingList::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uidx-waiting_list-car_id-queue_position")
                    .table(WaitingList::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(WaitingList::Table).to_owned())
            .await?;

        Ok(())
    }
}
