//! Question change list, add/change forms with inline choices, and deletion.

use super::filters::DateFilter;
use super::forms::{CleanedQuestion, QuestionForm};
use super::options::{InlineAdmin, ListColumn};
use super::{registered, AdminSite, FieldView, FieldsetView, InlineRowView, InlineView};
use super::{ModelAdmin, ModelKind};
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::orm::{choice, question};
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, Condition, DatabaseConnection, DbErr,
    TransactionTrait,
};
use serde::Deserialize;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_changelist)
        .service(view_add_form)
        .service(create_question)
        .service(view_change_form)
        .service(update_question)
        .service(view_delete_confirm)
        .service(delete_question);
}

fn database_error(context: &'static str) -> impl Fn(DbErr) -> Error {
    move |e| {
        log::error!("{}: {}", context, e);
        error::ErrorInternalServerError("Database error")
    }
}

// =============================================================================
// Change list
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ChangeListQuery {
    #[serde(default)]
    pub q: String,
    pub created: Option<String>,
    pub o: Option<String>,
}

#[derive(Debug)]
struct ColumnHeader {
    label: &'static str,
    /// Empty when the column is not sortable.
    sort_url: String,
    /// "asc", "desc", or empty.
    sorted: &'static str,
}

#[derive(Debug, Default)]
struct ListCell {
    text: String,
    class: &'static str,
}

#[derive(Debug)]
struct ChangeListRow {
    change_url: String,
    cells: Vec<ListCell>,
}

#[derive(Debug)]
struct FilterLink {
    label: &'static str,
    url: String,
    selected: bool,
}

#[derive(Template)]
#[template(path = "admin/change_list.html")]
struct ChangeListTemplate {
    client: ClientCtx,
    admin: ModelAdmin,
    columns: Vec<ColumnHeader>,
    rows: Vec<ChangeListRow>,
    search_query: String,
    filters: Vec<FilterLink>,
    result_count: usize,
    total_count: usize,
}

/// Split `-created` into `("created", true)`.
fn split_ordering(param: &str) -> (&str, bool) {
    match param.strip_prefix('-') {
        Some(field) => (field, true),
        None => (param, false),
    }
}

/// Resolve the requested ordering against the sortable columns, falling
/// back to the configured default.
pub fn resolve_ordering(admin: &ModelAdmin, param: Option<&str>) -> (&'static str, bool) {
    let (requested, descending) = split_ordering(param.unwrap_or(admin.ordering));
    if let Some(field) = admin.sortable_fields().find(|f| *f == requested) {
        return (field, descending);
    }
    split_ordering(admin.ordering)
}

fn order_column(field: &str) -> Option<question::Column> {
    match field {
        "question_text" => Some(question::Column::QuestionText),
        "created" => Some(question::Column::Created),
        _ => None,
    }
}

fn search_column(field: &str) -> Option<question::Column> {
    match field {
        "question_text" => Some(question::Column::QuestionText),
        _ => None,
    }
}

/// `LIKE` pattern matching `term` literally anywhere, with `!` as escape.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '!') {
            pattern.push('!');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn column_contains(column: question::Column, term: &str) -> SimpleExpr {
    Expr::cust_with_values(
        &format!("{} LIKE ? ESCAPE '!'", column.as_str()),
        vec![contains_pattern(term)],
    )
}

/// Every whitespace separated term must match at least one search field.
pub fn search_condition(admin: &ModelAdmin, query: &str) -> Option<Condition> {
    let terms: Vec<&str> = query.split_whitespace().collect();
    if terms.is_empty() || admin.search_fields.is_empty() {
        return None;
    }

    let mut all = Condition::all();
    for term in terms {
        let mut any = Condition::any();
        for field in admin.search_fields {
            match search_column(field) {
                Some(column) => any = any.add(column_contains(column, term)),
                None => log::warn!("Search field {} is not a question column", field),
            }
        }
        all = all.add(any);
    }
    Some(all)
}

/// Change list URL carrying the current search, filter and ordering.
fn changelist_url(admin: &ModelAdmin, q: &str, created: &str, o: &str) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in [("q", q), ("created", created), ("o", o)] {
        if !value.is_empty() {
            serializer.append_pair(key, value);
        }
    }
    let query = serializer.finish();

    if query.is_empty() {
        admin.changelist_url()
    } else {
        format!("{}?{}", admin.changelist_url(), query)
    }
}

fn question_cell(question: &question::Model, column: &ListColumn, now: NaiveDateTime) -> ListCell {
    match column.field {
        "question_text" => ListCell {
            text: question.to_string(),
            class: "",
        },
        "created" => ListCell {
            text: question.created.format(DATETIME_FORMAT).to_string(),
            class: "",
        },
        "was_created_recently" => {
            if question.was_created_recently_at(now) {
                ListCell {
                    text: "yes".to_owned(),
                    class: "boolean-yes",
                }
            } else {
                ListCell {
                    text: "no".to_owned(),
                    class: "boolean-no",
                }
            }
        }
        other => {
            log::warn!("List column {} is not a question field", other);
            ListCell::default()
        }
    }
}

/// GET /admin/questions/ - Searchable, filterable list of questions
#[get("/admin/questions/")]
async fn view_changelist(
    client: ClientCtx,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
    query: web::Query<ChangeListQuery>,
) -> Result<impl Responder, Error> {
    let admin = registered(&site, ModelKind::Question)?;
    let db = db.get_ref();
    let now = Utc::now().naive_utc();

    let date_filter = if admin.has_list_filter("created") {
        DateFilter::from_param(query.created.as_deref())
    } else {
        DateFilter::Any
    };
    let (order_field, descending) = resolve_ordering(&admin, query.o.as_deref());

    let mut select = question::Entity::find();
    if let Some((start, end)) = date_filter.bounds(now) {
        select = select
            .filter(question::Column::Created.gte(start))
            .filter(question::Column::Created.lt(end));
    }
    if let Some(condition) = search_condition(&admin, &query.q) {
        select = select.filter(condition);
    }
    if let Some(column) = order_column(order_field) {
        select = if descending {
            select.order_by_desc(column)
        } else {
            select.order_by_asc(column)
        };
    }

    let questions = select
        .order_by_desc(question::Column::Id)
        .all(db)
        .await
        .map_err(database_error("Failed to fetch questions"))?;

    let total_count = question::Entity::find()
        .count(db)
        .await
        .map_err(database_error("Failed to count questions"))? as usize;

    let current_order = if descending {
        format!("-{}", order_field)
    } else {
        order_field.to_owned()
    };

    let columns = admin
        .list_display
        .iter()
        .map(|column| match column.order_field {
            Some(field) => {
                let active = field == order_field;
                let next = if active && !descending {
                    format!("-{}", field)
                } else {
                    field.to_owned()
                };
                ColumnHeader {
                    label: column.label,
                    sort_url: changelist_url(&admin, &query.q, date_filter.param(), &next),
                    sorted: match (active, descending) {
                        (true, true) => "desc",
                        (true, false) => "asc",
                        _ => "",
                    },
                }
            }
            None => ColumnHeader {
                label: column.label,
                sort_url: String::new(),
                sorted: "",
            },
        })
        .collect();

    let filters = if admin.has_list_filter("created") {
        DateFilter::ALL
            .iter()
            .map(|choice| FilterLink {
                label: choice.label(),
                url: changelist_url(&admin, &query.q, choice.param(), &current_order),
                selected: *choice == date_filter,
            })
            .collect()
    } else {
        Vec::new()
    };

    let rows: Vec<ChangeListRow> = questions
        .iter()
        .map(|q| ChangeListRow {
            change_url: admin.change_url(q.id),
            cells: admin
                .list_display
                .iter()
                .map(|column| question_cell(q, column, now))
                .collect(),
        })
        .collect();

    Ok(ChangeListTemplate {
        client,
        admin,
        columns,
        result_count: rows.len(),
        rows,
        search_query: query.q.to_owned(),
        filters,
        total_count,
    }
    .to_response())
}

// =============================================================================
// Add / change forms
// =============================================================================

#[derive(Template)]
#[template(path = "admin/change_form.html")]
struct ChangeFormTemplate {
    client: ClientCtx,
    admin: ModelAdmin,
    title: String,
    action_url: String,
    /// Empty on the add form.
    delete_url: String,
    fieldsets: Vec<FieldsetView>,
    inlines: Vec<InlineView>,
    has_errors: bool,
}

fn question_field_view(
    admin: &ModelAdmin,
    name: &str,
    form: &QuestionForm,
    stored: Option<&question::Model>,
) -> Option<FieldView> {
    let spec = admin.field(name)?;
    let (value, errors) = match spec.name {
        "question_text" => (
            form.question_text.to_owned(),
            form.question_text_errors.to_owned(),
        ),
        "created" => (
            stored
                .map(|q| q.created.format(DATETIME_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_owned()),
            Vec::new(),
        ),
        other => {
            log::warn!("Fieldset names unknown question field {}", other);
            return None;
        }
    };

    Some(FieldView {
        name: spec.name.to_owned(),
        label: spec.label,
        value,
        readonly: admin.is_readonly(spec.name),
        errors,
        max_length: spec.max_length.unwrap_or(0),
    })
}

fn choice_inline_view(inline: &InlineAdmin, form: &QuestionForm) -> InlineView {
    let rows = form
        .choices
        .iter()
        .enumerate()
        .map(|(index, row)| InlineRowView {
            id_name: format!("{}-{}-id", inline.prefix, index),
            id_value: row.id.map(|id| id.to_string()).unwrap_or_default(),
            fields: inline
                .fields
                .iter()
                .map(|spec| {
                    let (value, errors) = match spec.name {
                        "choice_text" => (&row.choice_text, &row.choice_text_errors),
                        "votes" => (&row.votes, &row.votes_errors),
                        _ => return FieldView::default(),
                    };
                    FieldView {
                        name: format!("{}-{}-{}", inline.prefix, index, spec.name),
                        label: spec.label,
                        value: value.to_owned(),
                        readonly: false,
                        errors: errors.to_owned(),
                        max_length: spec.max_length.unwrap_or(0),
                    }
                })
                .collect(),
        })
        .collect();

    InlineView {
        title: inline.verbose_name_plural,
        headers: inline.fields.iter().map(|f| f.label).collect(),
        rows,
    }
}

fn change_form(
    client: ClientCtx,
    admin: ModelAdmin,
    form: &QuestionForm,
    stored: Option<&question::Model>,
) -> ChangeFormTemplate {
    let fieldsets = admin
        .fieldsets
        .iter()
        .map(|fieldset| FieldsetView {
            title: fieldset.title,
            classes: fieldset.classes.join(" "),
            fields: fieldset
                .fields
                .iter()
                .filter_map(|name| question_field_view(&admin, name, form, stored))
                .collect(),
        })
        .collect();

    let inlines = admin
        .inlines
        .iter()
        .map(|inline| choice_inline_view(inline, form))
        .collect();

    let has_errors = !form.question_text_errors.is_empty()
        || form.choices.iter().any(|row| row.has_errors());

    let (title, action_url, delete_url) = match stored {
        Some(q) => (
            format!("Change {}", admin.verbose_name),
            admin.change_url(q.id),
            admin.delete_url(q.id),
        ),
        None => (
            format!("Add {}", admin.verbose_name),
            admin.add_url(),
            String::new(),
        ),
    };

    ChangeFormTemplate {
        client,
        admin,
        title,
        action_url,
        delete_url,
        fieldsets,
        inlines,
        has_errors,
    }
}

/// Parse a submitted change form using the configured inline prefix.
fn parse_form(admin: &ModelAdmin, pairs: Vec<(String, String)>) -> QuestionForm {
    match admin.inlines.first() {
        Some(inline) => QuestionForm::from_pairs(pairs, inline.prefix),
        None => {
            let mut form = QuestionForm::from_pairs(pairs, "");
            form.choices.clear();
            form
        }
    }
}

fn extra_rows(admin: &ModelAdmin) -> usize {
    admin.inlines.first().map(|inline| inline.extra).unwrap_or(0)
}

async fn fetch_question(
    db: &DatabaseConnection,
    question_id: i32,
) -> Result<(question::Model, Vec<choice::Model>), Error> {
    let question = question::Entity::find_by_id(question_id)
        .one(db)
        .await
        .map_err(database_error("Failed to fetch question"))?
        .ok_or_else(|| error::ErrorNotFound("Question not found"))?;

    let choices = choice::Entity::find()
        .filter(choice::Column::QuestionId.eq(question.id))
        .order_by_asc(choice::Column::Id)
        .all(db)
        .await
        .map_err(database_error("Failed to fetch choices"))?;

    Ok((question, choices))
}

/// Insert a question and its choices in one transaction.
/// `created` is filled in by the entity's insert hook.
pub async fn insert_question(
    db: &DatabaseConnection,
    cleaned: CleanedQuestion,
) -> Result<question::Model, DbErr> {
    let txn = db.begin().await?;

    let question = question::ActiveModel {
        question_text: Set(cleaned.question_text),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for choice in cleaned.choices {
        choice::ActiveModel {
            question_id: Set(question.id),
            choice_text: Set(choice.choice_text),
            votes: Set(choice.votes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(question)
}

/// Apply an edit in one transaction: the text, existing choices by id, and
/// new choices. `created` and choice ownership never change.
pub async fn update_question_and_choices(
    db: &DatabaseConnection,
    question: question::Model,
    existing: &[choice::Model],
    cleaned: CleanedQuestion,
) -> Result<(), DbErr> {
    let txn = db.begin().await?;
    let question_id = question.id;

    let mut active: question::ActiveModel = question.into();
    active.question_text = Set(cleaned.question_text);
    active.update(&txn).await?;

    for choice in cleaned.choices {
        match choice.id.and_then(|id| existing.iter().find(|c| c.id == id)) {
            Some(stored) => {
                let mut active: choice::ActiveModel = stored.to_owned().into();
                active.choice_text = Set(choice.choice_text);
                active.votes = Set(choice.votes);
                active.update(&txn).await?;
            }
            None => {
                choice::ActiveModel {
                    question_id: Set(question_id),
                    choice_text: Set(choice.choice_text),
                    votes: Set(choice.votes),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }
    }

    txn.commit().await
}

/// GET /admin/questions/add/ - Blank question form
#[get("/admin/questions/add/")]
async fn view_add_form(
    client: ClientCtx,
    site: web::Data<AdminSite>,
) -> Result<impl Responder, Error> {
    let admin = registered(&site, ModelKind::Question)?;
    let form = QuestionForm::blank(extra_rows(&admin));

    Ok(change_form(client, admin, &form, None).to_response())
}

/// POST /admin/questions/add/ - Create a question with its choices
#[post("/admin/questions/add/")]
async fn create_question(
    client: ClientCtx,
    cookies: actix_session::Session,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
    body: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, Error> {
    let admin = registered(&site, ModelKind::Question)?;
    let mut form = parse_form(&admin, body.into_inner());

    validate_csrf_token(&cookies, &form.csrf_token)?;

    let cleaned = match form.validate() {
        Some(cleaned) => cleaned,
        None => return Ok(change_form(client, admin, &form, None).to_response()),
    };

    let question = insert_question(db.get_ref(), cleaned)
        .await
        .map_err(database_error("Failed to create question"))?;

    log::info!(
        "Question {} ({}) created in the admin console",
        question.id,
        question
    );

    Ok(HttpResponse::SeeOther()
        .append_header(("Location", admin.changelist_url()))
        .finish())
}

/// GET /admin/questions/{id}/change/ - Edit form with inline choices
#[get("/admin/questions/{id}/change/")]
async fn view_change_form(
    client: ClientCtx,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
    question_id: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let admin = registered(&site, ModelKind::Question)?;
    let (question, choices) = fetch_question(db.get_ref(), question_id.into_inner()).await?;
    let form = QuestionForm::from_models(&question, &choices, extra_rows(&admin));

    Ok(change_form(client, admin, &form, Some(&question)).to_response())
}

/// POST /admin/questions/{id}/change/ - Apply an edit
#[post("/admin/questions/{id}/change/")]
async fn update_question(
    client: ClientCtx,
    cookies: actix_session::Session,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
    question_id: web::Path<i32>,
    body: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, Error> {
    let admin = registered(&site, ModelKind::Question)?;
    let mut form = parse_form(&admin, body.into_inner());

    validate_csrf_token(&cookies, &form.csrf_token)?;

    let (question, choices) = fetch_question(db.get_ref(), question_id.into_inner()).await?;

    // Choices cannot be moved between questions.
    let foreign = form
        .choices
        .iter()
        .filter_map(|row| row.id)
        .find(|id| !choices.iter().any(|c| c.id == *id));
    if let Some(choice_id) = foreign {
        log::warn!(
            "Rejected edit of question {} naming choice {} of another question",
            question.id,
            choice_id
        );
        return Err(error::ErrorBadRequest("Choice does not belong to this question."));
    }

    let cleaned = match form.validate() {
        Some(cleaned) => cleaned,
        None => return Ok(change_form(client, admin, &form, Some(&question)).to_response()),
    };

    let id = question.id;
    update_question_and_choices(db.get_ref(), question, &choices, cleaned)
        .await
        .map_err(database_error("Failed to update question"))?;

    log::info!("Question {} changed in the admin console", id);

    Ok(HttpResponse::SeeOther()
        .append_header(("Location", admin.changelist_url()))
        .finish())
}

// =============================================================================
// Deletion
// =============================================================================

#[derive(Template)]
#[template(path = "admin/delete_confirmation.html")]
struct DeleteConfirmationTemplate {
    client: ClientCtx,
    admin: ModelAdmin,
    question: question::Model,
    choices: Vec<choice::Model>,
    delete_url: String,
    change_url: String,
}

#[derive(Deserialize)]
pub struct DeleteForm {
    pub csrf_token: String,
}

/// Delete a question and its choices. Returns false when it did not exist.
///
/// Choices are removed explicitly as well as through the foreign key's
/// ON DELETE CASCADE, since SQLite only enforces that with foreign keys on.
pub async fn delete_question_cascade(
    db: &DatabaseConnection,
    question_id: i32,
) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    choice::Entity::delete_many()
        .filter(choice::Column::QuestionId.eq(question_id))
        .exec(&txn)
        .await?;
    let result = question::Entity::delete_by_id(question_id)
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(result.rows_affected > 0)
}

/// GET /admin/questions/{id}/delete/ - Confirm deletion
#[get("/admin/questions/{id}/delete/")]
async fn view_delete_confirm(
    client: ClientCtx,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
    question_id: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let admin = registered(&site, ModelKind::Question)?;
    let (question, choices) = fetch_question(db.get_ref(), question_id.into_inner()).await?;

    Ok(DeleteConfirmationTemplate {
        client,
        admin,
        delete_url: admin.delete_url(question.id),
        change_url: admin.change_url(question.id),
        question,
        choices,
    }
    .to_response())
}

/// POST /admin/questions/{id}/delete/ - Delete a question and its choices
#[post("/admin/questions/{id}/delete/")]
async fn delete_question(
    cookies: actix_session::Session,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
    question_id: web::Path<i32>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse, Error> {
    let admin = registered(&site, ModelKind::Question)?;
    validate_csrf_token(&cookies, &form.csrf_token)?;

    let question_id = question_id.into_inner();
    let deleted = delete_question_cascade(db.get_ref(), question_id)
        .await
        .map_err(database_error("Failed to delete question"))?;

    if !deleted {
        return Err(error::ErrorNotFound("Question not found"));
    }

    log::info!("Question {} deleted in the admin console", question_id);

    Ok(HttpResponse::SeeOther()
        .append_header(("Location", admin.changelist_url()))
        .finish())
}
