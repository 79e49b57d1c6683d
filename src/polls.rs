//! Queries behind the public poll pages.
//!
//! A question is published once its `created` time has passed. Everything
//! here takes `now` explicitly so callers and tests agree on one instant.

use crate::constants::LATEST_QUESTION_COUNT;
use crate::orm::{choice, question};
use chrono::NaiveDateTime;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

/// The most recently created published questions that have at least one
/// choice, newest first.
pub async fn latest_questions<C: ConnectionTrait>(
    db: &C,
    now: NaiveDateTime,
) -> Result<Vec<question::Model>, DbErr> {
    question::Entity::find()
        .filter(question::Column::Created.lte(now))
        .filter(
            question::Column::Id.in_subquery(
                Query::select()
                    .column(choice::Column::QuestionId)
                    .from(choice::Entity)
                    .to_owned(),
            ),
        )
        .order_by_desc(question::Column::Created)
        .limit(LATEST_QUESTION_COUNT)
        .all(db)
        .await
}

/// A single question, provided it is published.
pub async fn find_published_question<C: ConnectionTrait>(
    db: &C,
    question_id: i32,
    now: NaiveDateTime,
) -> Result<Option<question::Model>, DbErr> {
    let question = question::Entity::find_by_id(question_id).one(db).await?;
    Ok(question.filter(|q| q.is_published_at(now)))
}

/// Choices of a question in creation order.
pub async fn choices_for<C: ConnectionTrait>(
    db: &C,
    question_id: i32,
) -> Result<Vec<choice::Model>, DbErr> {
    choice::Entity::find()
        .filter(choice::Column::QuestionId.eq(question_id))
        .order_by_asc(choice::Column::Id)
        .all(db)
        .await
}

/// Add one vote to `choice_id`, provided it belongs to `question_id`.
/// Returns false when no such choice exists.
///
/// The increment is a single `votes = votes + 1` statement.
pub async fn cast_vote<C: ConnectionTrait>(
    db: &C,
    question_id: i32,
    choice_id: i32,
) -> Result<bool, DbErr> {
    let result = choice::Entity::update_many()
        .col_expr(
            choice::Column::Votes,
            Expr::col(choice::Column::Votes).add(1),
        )
        .filter(choice::Column::Id.eq(choice_id))
        .filter(choice::Column::QuestionId.eq(question_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}
