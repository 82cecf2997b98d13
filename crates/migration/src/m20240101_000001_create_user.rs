//! Create `user` table.
//!
//! Ids are a bigint sequence so they line up with the integer ids handed out
//! by the file-backed store.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(create_user_table()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

fn create_user_table() -> TableCreateStatement {
    Table::create()
        .table(User::Table)
        .if_not_exists()
        .col(big_integer(User::Id).auto_increment().primary_key())
        .col(string_len(User::Email, 255).not_null())
        .col(string_len(User::Username, 128).not_null())
        .to_owned()
}

#[derive(DeriveIden)]
enum User { Table, Id, Email, Username }
