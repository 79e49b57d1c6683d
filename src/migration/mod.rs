//! Schema migrations, applied in order and recorded in `seaql_migrations`.
//!
//! The list is append-only: never edit or reorder a migration that has
//! shipped, add a new one instead.

pub use sea_orm_migration::prelude::*;

mod m20160317_000001_create_polls;
mod m20160317_000002_index_question_created;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20160317_000001_create_polls::Migration),
            Box::new(m20160317_000002_index_question_created::Migration),
        ]
    }
}

#[derive(Iden)]
pub(crate) enum Question {
    Table,
    Id,
    QuestionText,
    Created,
}

#[derive(Iden)]
pub(crate) enum Choice {
    Table,
    Id,
    QuestionId,
    ChoiceText,
    Votes,
}
