//! Public poll pages: index, detail, results and voting.

use crate::constants::NO_POLLS_MESSAGE;
use crate::middleware::ClientCtx;
use crate::orm::{choice, question};
use crate::polls::{cast_vote, choices_for, find_published_question, latest_questions};
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index)
        .service(view_detail)
        .service(view_results)
        .service(view_vote)
        .service(post_vote);
}

#[derive(Template)]
#[template(path = "polls/index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub latest_question_list: Vec<question::Model>,
    pub empty_message: &'static str,
}

#[derive(Template)]
#[template(path = "polls/detail.html")]
pub struct DetailTemplate {
    pub client: ClientCtx,
    pub question: question::Model,
    pub choices: Vec<choice::Model>,
    pub error_message: Option<&'static str>,
}

#[derive(Deserialize)]
pub struct VoteFormData {
    pub csrf_token: String,
    /// Selected choice id. Absent or blank when the visitor submits without
    /// picking one.
    #[serde(default)]
    pub choice: Option<String>,
}

impl VoteFormData {
    /// The selected choice id, if one was given and is a number.
    pub fn choice_id(&self) -> Option<i32> {
        self.choice.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

fn database_error(e: sea_orm::DbErr) -> Error {
    log::error!("Poll query failed: {}", e);
    error::ErrorInternalServerError("Database error")
}

/// Load a published question or fail with 404.
async fn get_published_or_404(
    db: &DatabaseConnection,
    question_id: i32,
) -> Result<question::Model, Error> {
    find_published_question(db, question_id, Utc::now().naive_utc())
        .await
        .map_err(database_error)?
        .ok_or_else(|| error::ErrorNotFound("Question not found."))
}

#[get("/")]
pub async fn view_index(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let latest_question_list = latest_questions(db.get_ref(), Utc::now().naive_utc())
        .await
        .map_err(database_error)?;

    Ok(IndexTemplate {
        client,
        latest_question_list,
        empty_message: NO_POLLS_MESSAGE,
    }
    .to_response())
}

#[get("/{question_id:\\d+}/")]
pub async fn view_detail(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let question = get_published_or_404(db.get_ref(), path.into_inner()).await?;
    let choices = choices_for(db.get_ref(), question.id)
        .await
        .map_err(database_error)?;

    Ok(DetailTemplate {
        client,
        question,
        choices,
        error_message: None,
    }
    .to_response())
}

/// Plain text tally of a question's choices.
pub fn format_results(question: &question::Model, choices: &[choice::Model]) -> String {
    let mut body = format!(
        "You're looking at the results of question {}.\n{}\n",
        question.id, question
    );
    for choice in choices {
        let noun = if choice.votes == 1 { "vote" } else { "votes" };
        body.push_str(&format!("- {} -- {} {}\n", choice, choice.votes, noun));
    }
    body
}

#[get("/{question_id:\\d+}/results/")]
pub async fn view_results(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let question = get_published_or_404(db.get_ref(), path.into_inner()).await?;
    let choices = choices_for(db.get_ref(), question.id)
        .await
        .map_err(database_error)?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format_results(&question, &choices)))
}

#[get("/{question_id:\\d+}/vote/")]
pub async fn view_vote(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let question = get_published_or_404(db.get_ref(), path.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!("You're voting on question {}.", question.id)))
}

#[post("/{question_id:\\d+}/vote/")]
pub async fn post_vote(
    client: ClientCtx,
    cookies: actix_session::Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Form<VoteFormData>,
) -> Result<HttpResponse, Error> {
    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;

    let question = get_published_or_404(db.get_ref(), path.into_inner()).await?;

    let voted = match form.choice_id() {
        Some(choice_id) => cast_vote(db.get_ref(), question.id, choice_id)
            .await
            .map_err(database_error)?,
        None => false,
    };

    if !voted {
        // Redisplay the voting form.
        let choices = choices_for(db.get_ref(), question.id)
            .await
            .map_err(database_error)?;
        return Ok(DetailTemplate {
            client,
            question,
            choices,
            error_message: Some("You didn't select a choice."),
        }
        .to_response());
    }

    log::debug!("Vote recorded on question {}", question.id);

    Ok(HttpResponse::SeeOther()
        .append_header(("Location", format!("/{}/results/", question.id)))
        .finish())
}
