use actix_session::Session;
use actix_utils::future::{ready, Ready};
use actix_web::dev::{self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{error, web::Data, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Session key holding the logged in admin's id.
pub const SESSION_ADMIN_ID: &str = "admin_id";
/// Session key holding the logged in admin's name.
pub const SESSION_ADMIN_NAME: &str = "admin_name";

/// The admin account attached to a session.
#[derive(Clone, Debug)]
pub struct AdminIdentity {
    pub id: i32,
    pub username: String,
}

/// Client data stored for a single request cycle.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// Logged in admin. None for visitors.
    pub admin: Option<AdminIdentity>,
    /// CSRF token for form protection
    pub csrf_token: String,
    /// Time the request started for page load statistics.
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            admin: None,
            csrf_token: String::new(), // Will be populated from session
            request_start: Instant::now(),
        }
    }
}

impl ClientCtxInner {
    pub fn from_session(session: &Session) -> Self {
        use crate::middleware::csrf::get_or_create_csrf_token;

        let admin = match (
            session.get::<i32>(SESSION_ADMIN_ID),
            session.get::<String>(SESSION_ADMIN_NAME),
        ) {
            (Ok(Some(id)), Ok(Some(username))) => Some(AdminIdentity { id, username }),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Discarding unreadable admin session: {}", e);
                None
            }
            _ => None,
        };

        let csrf_token = get_or_create_csrf_token(session).unwrap_or_else(|_| String::new());

        ClientCtxInner {
            admin,
            csrf_token,
            ..Default::default()
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    pub fn from_session(session: &Session) -> Self {
        Self(Data::new(ClientCtxInner::from_session(session)))
    }

    pub fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            Some(cbox) => Self(cbox.clone()),
            None => {
                let cbox = Data::new(ClientCtxInner::default());
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    pub fn get_admin(&self) -> Option<&AdminIdentity> {
        self.0.admin.as_ref()
    }

    /// Returns either the admin's name or the word for visitor.
    pub fn get_name(&self) -> String {
        match &self.0.admin {
            Some(admin) => admin.username.to_owned(),
            None => "Visitor".to_owned(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.0.admin.is_some()
    }

    pub fn get_csrf_token(&self) -> &str {
        &self.0.csrf_token
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }

    /// Require an admin session. Visitors are redirected to the login page.
    pub fn require_admin(&self) -> Result<i32, Error> {
        match &self.0.admin {
            Some(admin) => Ok(admin.id),
            None => Err(error::InternalError::from_response(
                "Login required",
                HttpResponse::Found()
                    .append_header((header::LOCATION, "/admin/login"))
                    .finish(),
            )
            .into()),
        }
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
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

/// Client context middleware. Must be wrapped inside the session middleware.
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

        // Borrows of `req` must be done in a precise way to avoid conflicts. This order is important.
        let (httpreq, payload) = req.into_parts();
        let session = Session::extract(&httpreq).into_inner();
        let req = ServiceRequest::from_parts(httpreq, payload);

        match session {
            Ok(session) => {
                req.extensions_mut()
                    .insert(Data::new(ClientCtxInner::from_session(&session)));
            }
            Err(err) => {
                log::error!("Unable to extract Session data in middleware: {}", err);
            }
        };

        Box::pin(async move { svc.call(req).await })
    }
}
