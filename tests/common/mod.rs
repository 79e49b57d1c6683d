//! Helpers shared by the integration tests
#![allow(dead_code)]

pub mod database;
pub mod fixtures;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;

/// Build the full application around `$db`, with the session, client
/// context and error page middleware the server installs.
#[macro_export]
macro_rules! polls_app {
    ($db:expr) => {
        polls_app!($db, polls::web::admin::AdminSite::default_site())
    };
    ($db:expr, $site:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db))
                .app_data(actix_web::web::Data::new($site))
                .wrap(polls::web::error::error_handlers())
                .wrap(polls::middleware::ClientCtx::default())
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::from(&[7u8; 64][..]),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .configure(polls::web::configure),
        )
        .await
    };
}

/// The session cookie set by a response.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .expect("response did not set a session cookie")
        .into_owned()
}

/// The CSRF token embedded in a rendered form.
pub fn csrf_token_from(body: &str) -> String {
    let marker = "name=\"csrf_token\" value=\"";
    let start = body.find(marker).expect("no csrf_token field in page") + marker.len();
    let end = body[start..].find('"').expect("unterminated csrf_token value");
    body[start..start + end].to_owned()
}

/// Read a response body as a string.
pub async fn body_string<B: actix_web::body::MessageBody>(resp: ServiceResponse<B>) -> String {
    let body = actix_web::test::read_body(resp).await;
    String::from_utf8(body.to_vec()).expect("body is not UTF-8")
}
