//! SeaORM Entity for question table

use crate::constants::RECENCY_WINDOW_HOURS;
use chrono::{Duration, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};
use std::fmt;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub question_text: String,
    /// Creation time, naive UTC. Filled in on insert when left unset.
    pub created: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::choice::Entity")]
    Choice,
}

impl Related<super::choice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Choice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn before_save(mut self, insert: bool) -> Result<Self, DbErr> {
        if insert && matches!(self.created, NotSet) {
            self.created = Set(Utc::now().naive_utc());
        }
        Ok(self)
    }
}

impl Model {
    /// True when the question was created within the last day.
    pub fn was_created_recently(&self) -> bool {
        self.was_created_recently_at(Utc::now().naive_utc())
    }

    /// Recency relative to an explicit `now`. The window is closed on both
    /// ends: exactly one day old counts, as does exactly `now`.
    pub fn was_created_recently_at(&self, now: DateTime) -> bool {
        let window_start = now - Duration::hours(RECENCY_WINDOW_HOURS);
        window_start <= self.created && self.created <= now
    }

    /// A question becomes visible on the public site once its creation time
    /// has passed.
    pub fn is_published_at(&self, now: DateTime) -> bool {
        self.created <= now
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.question_text)
    }
}
