// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use uuid::Uuid;

use crate::common::error::ApiError;

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Tenant da requisição, já conferido contra o token pelo `tenant_guard`.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

fn bad_request(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        error: message.to_string(),
        details: None,
    }
}

/// Lê e valida o cabeçalho `x-tenant-id`.
pub fn parse_tenant_header(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let value = headers
        .get(TENANT_ID_HEADER)
        .ok_or_else(|| bad_request("O cabeçalho X-Tenant-ID é obrigatório."))?;

    let value_str = value
        .to_str()
        .map_err(|_| bad_request("Cabeçalho X-Tenant-ID contém caracteres inválidos."))?;

    Uuid::parse_str(value_str)
        .map_err(|_| bad_request("Cabeçalho X-Tenant-ID inválido (não é um UUID)."))
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or_else(|| bad_request("Contexto do tenant não encontrado"))
    }
}
