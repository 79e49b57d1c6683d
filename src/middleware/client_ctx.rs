use crate::middleware::csrf::get_or_create_csrf_token;
use actix_session::Session;
use actix_web::dev::{
    self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Per-request values the page templates read.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// Session CSRF token embedded in every form. Empty without a session.
    pub csrf_token: String,
    pub site_name: String,
    pub request_start: Instant,
}

impl ClientCtxInner {
    fn new(csrf_token: String) -> Self {
        Self {
            csrf_token,
            site_name: crate::app_config::site().name,
            request_start: Instant::now(),
        }
    }

    /// Context for a request with a session, issuing a CSRF token if the
    /// session has none yet.
    pub fn from_session(session: &Session) -> Self {
        let csrf_token = get_or_create_csrf_token(session).unwrap_or_else(|e| {
            log::error!("Unable to store CSRF token in session: {}", e);
            String::new()
        });
        Self::new(csrf_token)
    }
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// Request context extracted by handlers as `client: ClientCtx` and handed
/// to templates.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    /// The context stored by the middleware, or a token-less one when the
    /// middleware is not installed.
    pub fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        if let Some(inner) = extensions.get::<Data<ClientCtxInner>>() {
            return Self(inner.clone());
        }
        let inner = Data::new(ClientCtxInner::default());
        extensions.insert(inner.clone());
        Self(inner)
    }

    pub fn get_csrf_token(&self) -> &str {
        &self.0.csrf_token
    }

    pub fn get_site_name(&self) -> &str {
        &self.0.site_name
    }

    pub fn request_time(&self) -> Duration {
        self.0.request_start.elapsed()
    }

    /// Elapsed time for the page footer, e.g. `840μs` or `12ms`.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }
}

impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Stores a `ClientCtxInner` built from the session in the request
/// extensions. Must be wrapped inside `SessionMiddleware`.
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        // Session extraction needs the HttpRequest on its own.
        let (httpreq, payload) = req.into_parts();
        let session = Session::extract(&httpreq).into_inner();
        let req = ServiceRequest::from_parts(httpreq, payload);

        match session {
            Ok(session) => {
                req.extensions_mut()
                    .insert(Data::new(ClientCtxInner::from_session(&session)));
            }
            Err(err) => log::error!("No session for request context: {}", err),
        }

        Box::pin(async move { svc.call(req).await })
    }
}
