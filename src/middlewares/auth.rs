use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i32);

struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    // still require a token even under a public prefix
    excluded_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/health",
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
                "/api/v1/khatmas/public",
                "/api/v1/groups/public",
            ],
            prefix_paths: vec![
                "/swagger-ui/",
                "/api-docs/",
                "/api/v1/auth/",
                "/api/v1/khatmas/shared/",
            ],
            excluded_paths: vec!["/api/v1/auth/logout"],
        }
    }

    fn is_public_path(&self, method: &Method, path: &str) -> bool {
        if self
            .excluded_paths
            .iter()
            .any(|&excluded| path.starts_with(excluded))
        {
            return false;
        }

        if self.exact_paths.contains(&path) {
            return true;
        }

        if *method == Method::GET && is_khatma_read_path(path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// `/api/v1/khatmas/{id}` and `/api/v1/khatmas/{id}/progress`.
fn is_khatma_read_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/api/v1/khatmas/") else {
        return false;
    };
    let id = rest.strip_suffix("/progress").unwrap_or(rest);
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let verified = bearer_token(&req).map(|token| {
            self.jwt_service
                .verify_access_token(token)
                .and_then(|claims| claims.user_id())
        });

        if self.public_paths.is_public_path(req.method(), req.path()) {
            // anonymous access is fine, but a valid token still identifies the caller
            if let Some(Ok(user_id)) = verified {
                req.extensions_mut().insert(CurrentUser(user_id));
            }
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        match verified {
            Some(Ok(user_id)) => {
                req.extensions_mut().insert(CurrentUser(user_id));
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Some(Err(_)) => {
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
            None => {
                let error = AppError::AuthError("Missing access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

/// The authenticated user, or 401 when the request carries none.
pub fn current_user_id(req: &HttpRequest) -> AppResult<i32> {
    optional_user_id(req).ok_or_else(|| AppError::AuthError("Authentication required".to_string()))
}

pub fn optional_user_id(req: &HttpRequest) -> Option<i32> {
    req.extensions().get::<CurrentUser>().map(|user| user.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path(&Method::POST, "/api/v1/auth/login"));
        assert!(paths.is_public_path(&Method::POST, "/api/v1/auth/refresh"));
        assert!(!paths.is_public_path(&Method::POST, "/api/v1/auth/logout"));
        assert!(paths.is_public_path(&Method::GET, "/health"));
        assert!(paths.is_public_path(&Method::GET, "/api/v1/khatmas/public"));
        assert!(paths.is_public_path(&Method::GET, "/api/v1/khatmas/shared/abc"));
        assert!(paths.is_public_path(&Method::GET, "/api/v1/khatmas/12"));
        assert!(paths.is_public_path(&Method::GET, "/api/v1/khatmas/12/progress"));
        assert!(!paths.is_public_path(&Method::PUT, "/api/v1/khatmas/12"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/khatmas/12/participants"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/khatmas/mine"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/notifications"));
    }
}
