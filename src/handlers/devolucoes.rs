// src/handlers/devolucoes.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
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
        rbac::{DevolucaoGerir, RequireAccess},
        tenancy::TenantContext,
    },
    models::devolucoes::{CreateDevolucaoPayload, Devolucao, DevolucaoDetalhe, DevolucaoFilters},
};

// Criar e consultar: qualquer usuário autenticado, limitado às suas lojas.
#[utoipa::path(
    post,
    path = "/api/v1/devolucoes",
    tag = "Devoluções",
    request_body = CreateDevolucaoPayload,
    responses(
        (status = 201, description = "Devolução registrada (pendente)", body = DevolucaoDetalhe),
        (status = 403, description = "Loja fora do escopo do usuário"),
        (status = 404, description = "Loja ou romaneio não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_devolucao(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateDevolucaoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let devolucao = app_state
        .devolucoes_service
        .create(&mut *tx, tenant.0, user.0.escopo_lojas(), &payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(devolucao)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devolucoes",
    tag = "Devoluções",
    responses(
        (status = 200, description = "Devoluções das lojas visíveis ao usuário", body = Paginated<Devolucao>)
    ),
    params(
        PageParams,
        DevolucaoFilters,
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_devolucoes(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(page): Query<PageParams>,
    Query(filters): Query<DevolucaoFilters>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let devolucoes = app_state
        .devolucoes_service
        .list(&mut *tx, tenant.0, user.0.escopo_lojas(), &filters, &page)
        .await?;
    tx.commit().await?;

    Ok(Json(devolucoes))
}

#[utoipa::path(
    get,
    path = "/api/v1/devolucoes/{id}",
    tag = "Devoluções",
    responses(
        (status = 200, description = "Devolução com itens", body = DevolucaoDetalhe),
        (status = 404, description = "Devolução não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Devolução"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_devolucao(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let devolucao = app_state
        .devolucoes_service
        .get(&mut *tx, tenant.0, user.0.escopo_lojas(), id)
        .await?;
    tx.commit().await?;

    Ok(Json(devolucao))
}

#[utoipa::path(
    post,
    path = "/api/v1/devolucoes/{id}/processar",
    tag = "Devoluções",
    responses(
        (status = 200, description = "Devolução processada conforme o tratamento", body = DevolucaoDetalhe),
        (status = 400, description = "Apenas devoluções pendentes podem ser processadas")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Devolução"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn process_devolucao(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<DevolucaoGerir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let devolucao = app_state.devolucoes_service.process(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(devolucao))
}

#[utoipa::path(
    post,
    path = "/api/v1/devolucoes/{id}/cancelar",
    tag = "Devoluções",
    responses(
        (status = 200, description = "Devolução cancelada", body = DevolucaoDetalhe),
        (status = 400, description = "Apenas devoluções pendentes podem ser canceladas")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Devolução"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_devolucao(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<DevolucaoGerir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let devolucao = app_state.devolucoes_service.cancel(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(devolucao))
}
