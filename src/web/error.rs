//! Error pages rendered by the `ErrorHandlers` middleware.

use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpResponse, Result};
use askama_actix::Template;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    site_name: String,
    status: u16,
    title: &'a str,
    message: &'a str,
}

/// Error page middleware shared by the server and the integration tests.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::NOT_FOUND, render_404)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, render_500)
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(
        res,
        "Not Found",
        "The page you were looking for does not exist.",
    )
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(
        res,
        "Server Error",
        "Something went wrong while handling your request.",
    )
}

fn render_error<B>(
    res: ServiceResponse<B>,
    title: &str,
    message: &str,
) -> Result<ErrorHandlerResponse<B>> {
    let status = res.status();
    let body = ErrorTemplate {
        site_name: crate::app_config::site().name,
        status: status.as_u16(),
        title,
        message,
    }
    .render()
    .unwrap_or_else(|e| {
        log::error!("Failed to render error page: {}", e);
        status
            .canonical_reason()
            .unwrap_or("Error")
            .to_owned()
    });

    let (req, _) = res.into_parts();
    let response = HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body);

    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, response).map_into_right_body(),
    ))
}
