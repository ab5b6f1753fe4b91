// src/middleware/auth.rs

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::tenancy::{parse_tenant_header, TenantContext},
    models::auth::Claims,
};

/// Só valida: a emissão do token é de outro serviço.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

// Bearer obrigatório + x-tenant-id igual ao tenant do token.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let claims = decode_token(bearer.token(), &app_state.jwt_secret)?;
    let tenant_id = parse_tenant_header(request.headers())?;

    if claims.tenant_id != tenant_id {
        tracing::warn!(
            user_id = %claims.sub,
            token_tenant = %claims.tenant_id,
            header_tenant = %tenant_id,
            "Tenant do cabeçalho difere do token"
        );
        return Err(ApiError {
            status: StatusCode::FORBIDDEN,
            error: "Você não tem acesso a este tenant.".into(),
            details: None,
        });
    }

    request.extensions_mut().insert(TenantContext(tenant_id));
    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Atributos, Role};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn token(secret: &str, exp: usize) -> String {
        let claims = Claims {
            sub: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            roles: vec![Role::Comprador],
            lojas_permitidas: vec![],
            atributos: Atributos::default(),
            exp,
            iat: 0,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .unwrap()
    }

    fn future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn valid_token_decodes() {
        let claims = decode_token(&token("segredo", future()), "segredo").unwrap();
        assert_eq!(claims.roles, vec![Role::Comprador]);
    }

    #[test]
    fn wrong_secret_or_expired_token_is_unauthorized() {
        let err = decode_token(&token("outro", future()), "segredo").unwrap_err();
        assert_eq!(err.kind().status_code(), StatusCode::UNAUTHORIZED);

        let err = decode_token(&token("segredo", 1), "segredo").unwrap_err();
        assert_eq!(err.kind().status_code(), StatusCode::UNAUTHORIZED);
    }
}
