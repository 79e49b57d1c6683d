//! SeaORM entities for the polls schema

pub mod choice;
pub mod question;
