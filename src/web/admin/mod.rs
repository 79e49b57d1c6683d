//! Administrative console
//!
//! A CRUD surface for staff. Which entities appear, and how, is decided by
//! the `AdminSite` registry passed in as application data.

pub mod filters;
pub mod forms;
pub mod options;
pub mod questions;

use crate::middleware::ClientCtx;
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
pub use options::{AdminSite, ModelAdmin, ModelKind};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_site_index);
    questions::configure(conf);
}

/// A rendered form field.
#[derive(Clone, Debug, Default)]
pub struct FieldView {
    /// Input name.
    pub name: String,
    pub label: &'static str,
    pub value: String,
    pub readonly: bool,
    pub errors: Vec<String>,
    /// Zero when unbounded.
    pub max_length: usize,
}

#[derive(Clone, Debug)]
pub struct FieldsetView {
    pub title: Option<&'static str>,
    pub classes: String,
    pub fields: Vec<FieldView>,
}

#[derive(Clone, Debug)]
pub struct InlineRowView {
    pub id_name: String,
    pub id_value: String,
    pub fields: Vec<FieldView>,
}

#[derive(Clone, Debug)]
pub struct InlineView {
    pub title: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<InlineRowView>,
}

/// Look up a registered entity or 404.
pub(crate) fn registered(site: &AdminSite, kind: ModelKind) -> Result<ModelAdmin, Error> {
    site.get(kind)
        .copied()
        .ok_or_else(|| error::ErrorNotFound("Not registered with the admin site."))
}

#[derive(Template)]
#[template(path = "admin/index.html")]
struct SiteIndexTemplate {
    client: ClientCtx,
    models: Vec<ModelAdmin>,
}

/// GET /admin/ - List registered entities
#[get("/admin/")]
async fn view_site_index(client: ClientCtx, site: web::Data<AdminSite>) -> impl Responder {
    SiteIndexTemplate {
        client,
        models: site.models().to_vec(),
    }
    .to_response()
}
