//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::{Duration, Utc};
use polls::orm::{choice, question};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Create a question offset by `days` from now (negative for the past,
/// positive for questions not yet published).
pub async fn create_question(
    db: &DatabaseConnection,
    question_text: &str,
    days: i64,
) -> Result<question::Model, DbErr> {
    question::ActiveModel {
        question_text: Set(question_text.to_owned()),
        created: Set(Utc::now().naive_utc() + Duration::days(days)),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_choice(
    db: &DatabaseConnection,
    question_id: i32,
    choice_text: &str,
    votes: i32,
) -> Result<choice::Model, DbErr> {
    choice::ActiveModel {
        question_id: Set(question_id),
        choice_text: Set(choice_text.to_owned()),
        votes: Set(votes),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// A question with a single choice, so it shows up on the index.
pub async fn create_poll(
    db: &DatabaseConnection,
    question_text: &str,
    days: i64,
) -> Result<question::Model, DbErr> {
    let question = create_question(db, question_text, days).await?;
    create_choice(db, question.id, "Not much", 0).await?;
    Ok(question)
}
