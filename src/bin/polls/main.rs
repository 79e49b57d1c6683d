use actix_files::Files;
use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::{Data, ServiceConfig};
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use polls::app_config::{self, AppConfig};
use polls::db::init_db;
use polls::middleware::ClientCtx;
use polls::web::admin::AdminSite;
use rand::{distributions::Alphanumeric, Rng};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    app_config::init();

    let config = load_config();
    let db = init_db(&config.database)
        .await
        .with_context(|| "Failed to initialize the database")?;

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => Key::from(key.as_bytes()),
        other => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!("SECRET_KEY was invalid. Reason: {:?}\r\nThis means the key used for signing session cookies will invalidate every time the application is restarted. A secret key must be at least 64 bytes to be accepted.\r\n\r\nNeed a key? How about:\r\n{}", other.map(|_| "too short"), random_string);
            Key::from(random_string.as_bytes())
        }
    };

    let admin_site = AdminSite::default_site();
    let secure_cookie = config.session.secure_cookie;
    let static_dir = config.server.static_dir.to_owned();

    let routes: fn(&mut ServiceConfig) = if config.admin.enabled {
        polls::web::configure
    } else {
        log::info!("Admin console disabled; /admin/ routes are not mounted");
        polls::web::configure_public
    };

    log::info!("Listening on {}", config.server.bind);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(admin_site.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(polls::web::error::error_handlers())
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(secure_cookie)
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a %r %s %T"))
            .service(Files::new("/static", &static_dir))
            .configure(routes)
    })
    .bind(&config.server.bind)?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Application config with the conventional DATABASE_URL override applied.
fn load_config() -> AppConfig {
    let mut config = app_config::get_config();
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.url = url;
    }
    config
}
