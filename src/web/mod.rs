pub mod admin;
pub mod error;
pub mod polls;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Order is important. Route resolution will stop at the first match.
    admin::configure(conf);
    configure_public(conf);
}

/// Public poll pages only, for deployments with the admin console disabled.
pub fn configure_public(conf: &mut actix_web::web::ServiceConfig) {
    polls::configure(conf);
}
