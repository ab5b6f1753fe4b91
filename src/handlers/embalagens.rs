// src/handlers/embalagens.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_tenant_tx,
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{EmbalagemAjustar, RequireAccess},
        tenancy::TenantContext,
    },
    models::embalagens::{
        AjustePayload, AjusteResultado, EmbalagemMovimento, EmbalagemSaldo, MovimentoFilters,
        SaldoFilters,
    },
};

#[utoipa::path(
    get,
    path = "/api/v1/embalagens/saldos",
    tag = "Embalagens",
    responses(
        (status = 200, description = "Saldos de embalagens por loja", body = Paginated<EmbalagemSaldo>)
    ),
    params(
        PageParams,
        SaldoFilters,
        ("x-tenant-id" = uuid::Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_saldos(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(page): Query<PageParams>,
    Query(filters): Query<SaldoFilters>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let saldos = app_state
        .embalagens_service
        .list_saldos(&mut *tx, tenant.0, &filters, &page)
        .await?;
    tx.commit().await?;

    Ok(Json(saldos))
}

#[utoipa::path(
    get,
    path = "/api/v1/embalagens/movimentos",
    tag = "Embalagens",
    responses(
        (status = 200, description = "Histórico de movimentos", body = Paginated<EmbalagemMovimento>),
        (status = 400, description = "Intervalo de datas inválido")
    ),
    params(
        PageParams,
        MovimentoFilters,
        ("x-tenant-id" = uuid::Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movimentos(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(page): Query<PageParams>,
    Query(filters): Query<MovimentoFilters>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let movimentos = app_state
        .embalagens_service
        .list_movimentos(&mut *tx, tenant.0, &filters, &page)
        .await?;
    tx.commit().await?;

    Ok(Json(movimentos))
}

#[utoipa::path(
    post,
    path = "/api/v1/embalagens/ajustes",
    tag = "Embalagens",
    request_body = AjustePayload,
    responses(
        (status = 201, description = "Saldo ajustado e movimento registrado", body = AjusteResultado),
        (status = 400, description = "Quantidade ou depósito inválidos"),
        (status = 404, description = "Loja ou embalagem não encontrada")
    ),
    params(
        ("x-tenant-id" = uuid::Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_saldo(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<EmbalagemAjustar>,
    Json(payload): Json<AjustePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let resultado = app_state
        .embalagens_service
        .adjust(&mut *tx, tenant.0, payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(resultado)))
}
