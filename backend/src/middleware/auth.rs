use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use crate::error::AppError;
use crate::utils::jwt::{Claims, JwtService};
use safari_booking_shared::UserRole;

/// Authenticated user information extracted from the JWT token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let user_id = uuid::Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Internal("Invalid user ID in claims".to_string()))?;

        Ok(Self {
            user_id,
            name: claims.name.clone(),
            email: claims.email.clone(),
            phone: claims.phone.clone(),
            role: claims.role,
        })
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Staff | UserRole::Admin)
    }

    /// Staff gate for lifecycle transitions (confirm/complete/refund).
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Staff role required for this operation".to_string(),
            ))
        }
    }
}

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<Claims>()
            .ok_or_else(|| AppError::Internal("Claims not found in request".to_string()))
            .and_then(AuthenticatedUser::from_claims);
        ready(result)
    }
}

pub struct AuthMiddleware {
    jwt_service: Rc<JwtService>,
    required_role: Option<UserRole>,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self {
            jwt_service: Rc::new(jwt_service),
            required_role: None,
        }
    }

    pub fn require_role(mut self, role: UserRole) -> Self {
        self.required_role = Some(role);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
            required_role: self.required_role,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: Rc<JwtService>,
    required_role: Option<UserRole>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let jwt_service = self.jwt_service.clone();
        let required_role = self.required_role;
        let service = self.service.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));

            let token = match auth_header {
                Some(token) => token,
                None => {
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "missing_token",
                        "message": "Authorization token is required"
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            let claims = match jwt_service.validate_token(token) {
                Ok(claims) => claims,
                Err(e) => {
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "invalid_token",
                        "message": e.to_string()
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            if let Some(required_role) = required_role {
                if !has_required_role(claims.role, required_role) {
                    let response = HttpResponse::Forbidden().json(serde_json::json!({
                        "error": "insufficient_permissions",
                        "message": "Insufficient permissions for this operation"
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            req.extensions_mut().insert(claims);

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Role hierarchy: admin > staff > user.
fn has_required_role(user_role: UserRole, required_role: UserRole) -> bool {
    match required_role {
        UserRole::User => true,
        UserRole::Staff => matches!(user_role, UserRole::Staff | UserRole::Admin),
        UserRole::Admin => matches!(user_role, UserRole::Admin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};
    use uuid::Uuid;

    async fn protected() -> Result<HttpResponse, Error> {
        Ok(HttpResponse::Ok().json(serde_json::json!({"message": "ok"})))
    }

    fn jwt() -> JwtService {
        JwtService::new("test-secret-key-that-is-long-enough!").unwrap()
    }

    #[actix_web::test]
    async fn rejects_request_without_token() {
        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .route("/bookings", web::get().to(protected)),
        )
        .await;

        let req = test::TestRequest::get().uri("/bookings").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn accepts_valid_token() {
        let jwt_service = jwt();
        let token = jwt_service
            .generate_token(
                Uuid::new_v4(),
                "Asha",
                "asha@example.com",
                "",
                UserRole::User,
            )
            .unwrap();

        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt_service))
                .route("/bookings", web::get().to(protected)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/bookings")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    #[actix_web::test]
    async fn rejects_user_on_staff_route() {
        let jwt_service = jwt();
        let token = jwt_service
            .generate_token(
                Uuid::new_v4(),
                "Asha",
                "asha@example.com",
                "",
                UserRole::User,
            )
            .unwrap();

        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt_service).require_role(UserRole::Staff))
                .route("/ops", web::get().to(protected)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/ops")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
    }

    // `use actix_web::test` shadows the built-in #[test] attribute, so
    // qualify it explicitly for this synchronous test.
    #[::core::prelude::v1::test]
    fn role_hierarchy() {
        assert!(has_required_role(UserRole::User, UserRole::User));
        assert!(has_required_role(UserRole::Staff, UserRole::User));
        assert!(!has_required_role(UserRole::User, UserRole::Staff));
        assert!(has_required_role(UserRole::Admin, UserRole::Staff));
        assert!(!has_required_role(UserRole::Staff, UserRole::Admin));
    }
}
