//! Change form parsing and validation for questions and their inline choices.
//!
//! Inline rows arrive as flat form pairs named `<prefix>-<index>-<field>`,
//! e.g. `choice_set-0-choice_text`, so the body is read as a list of pairs
//! and grouped by row index.

use crate::constants::MAX_TEXT_LENGTH;
use crate::orm::{choice, question};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

const REQUIRED: &str = "This field is required.";

#[derive(Validate)]
struct QuestionFields {
    #[validate(length(max = 200))]
    question_text: String,
}

#[derive(Validate)]
struct ChoiceFields {
    #[validate(length(max = 200))]
    choice_text: String,
    #[validate(range(min = 0))]
    votes: i32,
}

/// One inline choice row as submitted or as initially rendered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChoiceRow {
    pub id: Option<i32>,
    pub choice_text: String,
    pub votes: String,
    pub choice_text_errors: Vec<String>,
    pub votes_errors: Vec<String>,
}

impl ChoiceRow {
    fn blank() -> Self {
        Self {
            votes: "0".to_owned(),
            ..Default::default()
        }
    }

    /// Extra rows left untouched are ignored rather than validated.
    fn is_untouched_extra(&self) -> bool {
        self.id.is_none()
            && self.choice_text.trim().is_empty()
            && matches!(self.votes.trim(), "" | "0")
    }

    pub fn has_errors(&self) -> bool {
        !self.choice_text_errors.is_empty() || !self.votes_errors.is_empty()
    }
}

/// Question change form state, re-rendered when validation fails.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuestionForm {
    pub csrf_token: String,
    pub question_text: String,
    pub question_text_errors: Vec<String>,
    pub choices: Vec<ChoiceRow>,
}

/// Validated values ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanedQuestion {
    pub question_text: String,
    pub choices: Vec<CleanedChoice>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CleanedChoice {
    pub id: Option<i32>,
    pub choice_text: String,
    pub votes: i32,
}

impl QuestionForm {
    /// Empty add form with `extra` blank choice rows.
    pub fn blank(extra: usize) -> Self {
        Self {
            choices: (0..extra).map(|_| ChoiceRow::blank()).collect(),
            ..Default::default()
        }
    }

    /// Change form for a stored question, followed by `extra` blank rows.
    pub fn from_models(question: &question::Model, choices: &[choice::Model], extra: usize) -> Self {
        let mut rows: Vec<ChoiceRow> = choices
            .iter()
            .map(|c| ChoiceRow {
                id: Some(c.id),
                choice_text: c.choice_text.to_owned(),
                votes: c.votes.to_string(),
                ..Default::default()
            })
            .collect();
        rows.extend((0..extra).map(|_| ChoiceRow::blank()));

        Self {
            question_text: question.question_text.to_owned(),
            choices: rows,
            ..Default::default()
        }
    }

    /// Build the form from submitted pairs. Inline rows use `prefix`.
    pub fn from_pairs(pairs: Vec<(String, String)>, prefix: &str) -> Self {
        let mut form = QuestionForm::default();
        let mut rows: BTreeMap<usize, ChoiceRow> = BTreeMap::new();

        for (key, value) in pairs {
            match key.as_str() {
                "csrf_token" => form.csrf_token = value,
                "question_text" => form.question_text = value,
                _ => {
                    let Some((index, field)) = parse_inline_key(&key, prefix) else {
                        continue;
                    };
                    let row = rows.entry(index).or_default();
                    match field {
                        "id" => row.id = value.trim().parse().ok(),
                        "choice_text" => row.choice_text = value,
                        "votes" => row.votes = value,
                        _ => {}
                    }
                }
            }
        }

        form.choices = rows.into_values().collect();
        form
    }

    /// Validate every field, recording messages on the form.
    /// Returns the cleaned values only when nothing failed.
    pub fn validate(&mut self) -> Option<CleanedQuestion> {
        self.question_text_errors.clear();
        let question_text = self.question_text.trim().to_owned();

        if question_text.is_empty() {
            self.question_text_errors.push(REQUIRED.to_owned());
        } else if let Err(errors) = (QuestionFields {
            question_text: question_text.clone(),
        })
        .validate()
        {
            self.question_text_errors = messages_for(&errors, "question_text", &question_text);
        }

        let mut choices = Vec::new();
        for row in &mut self.choices {
            row.choice_text_errors.clear();
            row.votes_errors.clear();

            if row.is_untouched_extra() {
                continue;
            }
            if let Some(cleaned) = clean_choice(row) {
                choices.push(cleaned);
            }
        }

        let valid =
            self.question_text_errors.is_empty() && !self.choices.iter().any(ChoiceRow::has_errors);
        valid.then(|| CleanedQuestion {
            question_text,
            choices,
        })
    }
}

fn clean_choice(row: &mut ChoiceRow) -> Option<CleanedChoice> {
    let choice_text = row.choice_text.trim().to_owned();
    if choice_text.is_empty() {
        row.choice_text_errors.push(REQUIRED.to_owned());
    }

    let votes_raw = row.votes.trim();
    let votes = if votes_raw.is_empty() {
        row.votes_errors.push(REQUIRED.to_owned());
        None
    } else {
        match votes_raw.parse::<i32>() {
            Ok(v) => Some(v),
            Err(_) => {
                row.votes_errors.push("Enter a whole number.".to_owned());
                None
            }
        }
    };

    if let Some(votes) = votes {
        let fields = ChoiceFields {
            choice_text: choice_text.clone(),
            votes,
        };
        if let Err(errors) = fields.validate() {
            row.choice_text_errors
                .extend(messages_for(&errors, "choice_text", &choice_text));
            row.votes_errors
                .extend(messages_for(&errors, "votes", votes_raw));
        }
    }

    if row.has_errors() {
        return None;
    }

    Some(CleanedChoice {
        id: row.id,
        choice_text,
        votes: votes?,
    })
}

/// Human readable messages for one field of a failed validation.
fn messages_for(errors: &ValidationErrors, field: &str, value: &str) -> Vec<String> {
    errors
        .field_errors()
        .get(field)
        .map(|errs| {
            errs.iter()
                .map(|e| match &*e.code {
                    "length" => format!(
                        "Ensure this value has at most {} characters (it has {}).",
                        MAX_TEXT_LENGTH,
                        value.chars().count()
                    ),
                    "range" => "Ensure this value is greater than or equal to 0.".to_owned(),
                    code => format!("Invalid value ({}).", code),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Split `choice_set-3-votes` into `(3, "votes")` for the given prefix.
fn parse_inline_key<'a>(key: &'a str, prefix: &str) -> Option<(usize, &'a str)> {
    let rest = key.strip_prefix(prefix)?.strip_prefix('-')?;
    let (index, field) = rest.split_once('-')?;
    Some((index.parse().ok()?, field))
}
