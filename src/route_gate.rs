use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    Error, HttpMessage, HttpResponse,
};
use chrono::Utc;
use futures_util::future::{ok, Ready};
use log::debug;

use crate::auth::{create_jwt, session_cookie, session_token, validate_jwt, Claims};

/// How the gate treats a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Login/signup pages; bounced to the dashboard when a session exists.
    AuthPage,
    /// Dashboard and its subpaths; bounced to login without a session.
    Protected,
    /// Static assets and images; never intercepted.
    Asset,
    Other,
}

const ASSET_EXTENSIONS: [&str; 7] = ["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"];

fn is_asset(path: &str) -> bool {
    if path.starts_with("/static/") {
        return true;
    }
    path.rsplit_once('.')
        .map(|(_, ext)| ASSET_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

pub fn classify(path: &str) -> RouteClass {
    if is_asset(path) {
        return RouteClass::Asset;
    }
    match path {
        "/login" | "/signup" => RouteClass::AuthPage,
        _ if path == "/dashboard" || path.starts_with("/dashboard/") => RouteClass::Protected,
        _ => RouteClass::Other,
    }
}

/// Re-mint a session that is past the halfway point of its lifetime, so
/// active users keep a rolling 24h window.
const REFRESH_THRESHOLD_SECS: i64 = 12 * 60 * 60;

fn refreshed_token(claims: &Claims, secret: &str) -> Option<String> {
    let remaining = claims.exp as i64 - Utc::now().timestamp();
    (remaining < REFRESH_THRESHOLD_SECS).then(|| create_jwt(&claims.sub, secret))
}

/// Per-request gate: validates the session before any handler runs and
/// redirects between the public and protected halves of the site. Handlers
/// still re-check the session themselves; the gate is not the only
/// enforcement point.
#[derive(Debug, Clone)]
pub struct RouteGate {
    jwt_secret: String,
}

impl RouteGate {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RouteGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = RouteGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RouteGateMiddleware {
            service,
            jwt_secret: self.jwt_secret.clone(),
        })
    }
}

pub struct RouteGateMiddleware<S> {
    service: S,
    jwt_secret: String,
}

impl<S, B> Service<ServiceRequest> for RouteGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let class = classify(req.path());

        // Assets are never evaluated; preflights carry no cookies and
        // belong to the CORS layer.
        if class == RouteClass::Asset || req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_boxed_body()) });
        }

        let session = session_token(req.request())
            .and_then(|token| validate_jwt(&token, &self.jwt_secret).ok());

        match (&session, class) {
            (Some(_), RouteClass::AuthPage) => {
                debug!("Authenticated request to {}, redirecting to /dashboard", req.path());
                let srv_resp = redirect(req, "/dashboard");
                return Box::pin(async move { Ok(srv_resp) });
            }
            (None, RouteClass::Protected) => {
                debug!("Unauthenticated request to {}, redirecting to /login", req.path());
                let srv_resp = redirect(req, "/login");
                return Box::pin(async move { Ok(srv_resp) });
            }
            _ => {}
        }

        let refreshed = session
            .as_ref()
            .and_then(|claims| refreshed_token(claims, &self.jwt_secret));
        if let Some(claims) = session {
            req.extensions_mut().insert(claims.sub);
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?.map_into_boxed_body();
            if let Some(token) = refreshed {
                if let Err(e) = res.response_mut().add_cookie(&session_cookie(token)) {
                    debug!("Failed to attach refreshed session cookie: {}", e);
                }
            }
            Ok(res)
        })
    }
}

fn redirect(req: ServiceRequest, location: &str) -> ServiceResponse<BoxBody> {
    let (req_parts, _payload) = req.into_parts();
    let resp = HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish();
    ServiceResponse::new(req_parts, resp)
}
