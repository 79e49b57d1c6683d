//! Application-wide constants

/// Number of questions shown on the index page.
pub const LATEST_QUESTION_COUNT: u64 = 5;

/// Maximum length of question and choice text, in characters.
/// Matches the VARCHAR width declared by the initial migration.
pub const MAX_TEXT_LENGTH: usize = 200;

/// Width of the "created recently" window, in hours.
pub const RECENCY_WINDOW_HOURS: i64 = 24;

/// Message shown on the index page when nothing is published.
pub const NO_POLLS_MESSAGE: &str = "No polls are available.";
