use super::{Choice, Question};
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20160317_000002_index_question_created"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Every public listing filters and sorts on `created`.
        manager
            .create_index(
                Index::create()
                    .name("idx_question_created")
                    .table(Question::Table)
                    .col(Question::Created)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_choice_question_id")
                    .table(Choice::Table)
                    .col(Choice::QuestionId)
                    .to_owned(),
            )
            .await
    }

    // Dropped by name only; SQLite has no `DROP INDEX .. ON <table>`.
    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_choice_question_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_question_created")
                    .to_owned(),
            )
            .await
    }
}
