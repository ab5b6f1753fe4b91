// src/handlers/financeiro.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError, pagination::PageParams},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{FinanceiroGerir, FinanceiroLer, RequireAccess},
        tenancy::TenantContext,
    },
    models::financeiro::{BaixaPayload, TituloFilters, TituloResolvido, TitulosListagem},
};

#[utoipa::path(
    get,
    path = "/api/v1/financeiro/titulos",
    tag = "Financeiro",
    responses(
        (status = 200, description = "Títulos de loja e de fornecedor, paginados separadamente", body = TitulosListagem)
    ),
    params(
        PageParams,
        TituloFilters,
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_titulos(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<FinanceiroLer>,
    Query(page): Query<PageParams>,
    Query(filters): Query<TituloFilters>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let titulos = app_state
        .financeiro_service
        .list(&mut *tx, tenant.0, &filters, &page)
        .await?;
    tx.commit().await?;

    Ok(Json(titulos))
}

#[utoipa::path(
    get,
    path = "/api/v1/financeiro/titulos/{id}",
    tag = "Financeiro",
    responses(
        (status = 200, description = "Título com a tabela de origem", body = TituloResolvido),
        (status = 404, description = "Título não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Título"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_titulo(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<FinanceiroLer>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let titulo = app_state.financeiro_service.resolve(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(titulo))
}

#[utoipa::path(
    post,
    path = "/api/v1/financeiro/titulos/{id}/baixar",
    tag = "Financeiro",
    request_body = BaixaPayload,
    responses(
        (status = 200, description = "Título pago", body = TituloResolvido),
        (status = 400, description = "Título não está aberto nem parcial")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Título"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn settle_titulo(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<FinanceiroGerir>,
    Path(id): Path<Uuid>,
    payload: Option<Json<BaixaPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let titulo = app_state
        .financeiro_service
        .settle(&mut *tx, tenant.0, id, &payload)
        .await?;
    tx.commit().await?;

    Ok(Json(titulo))
}

#[utoipa::path(
    post,
    path = "/api/v1/financeiro/titulos/{id}/estornar",
    tag = "Financeiro",
    responses(
        (status = 200, description = "Pagamento estornado, título reaberto", body = TituloResolvido),
        (status = 400, description = "Apenas títulos pagos podem ser estornados")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Título"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn reverse_titulo(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<FinanceiroGerir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let titulo = app_state.financeiro_service.reverse(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(titulo))
}

#[utoipa::path(
    post,
    path = "/api/v1/financeiro/titulos/{id}/cancelar",
    tag = "Financeiro",
    responses(
        (status = 200, description = "Título cancelado", body = TituloResolvido),
        (status = 400, description = "Título não está aberto nem parcial")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Título"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_titulo(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<FinanceiroGerir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let titulo = app_state.financeiro_service.cancel_title(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(titulo))
}
