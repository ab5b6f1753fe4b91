// src/handlers/compras.rs

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
        rbac::{CompraCriar, CompraExcluir, CompraGerir, RequireAccess},
        tenancy::TenantContext,
    },
    models::compras::{Compra, CompraDetalhe, CompraFilters, CreateCompraPayload, UpdateCompraPayload},
};

#[utoipa::path(
    post,
    path = "/api/v1/compras",
    tag = "Compras",
    request_body = CreateCompraPayload,
    responses(
        (status = 201, description = "Compra criada (pendente)", body = CompraDetalhe),
        (status = 400, description = "Payload inválido ou compra sem itens"),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_compra(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<CompraCriar>,
    Json(payload): Json<CreateCompraPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let compra = app_state
        .compras_service
        .create(&mut *tx, tenant.0, user.0.sub, &payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(compra)))
}

#[utoipa::path(
    get,
    path = "/api/v1/compras",
    tag = "Compras",
    responses(
        (status = 200, description = "Compras paginadas", body = Paginated<Compra>)
    ),
    params(
        PageParams,
        CompraFilters,
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_compras(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(page): Query<PageParams>,
    Query(filters): Query<CompraFilters>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let compras = app_state
        .compras_service
        .list(&mut *tx, tenant.0, &filters, &page)
        .await?;
    tx.commit().await?;

    Ok(Json(compras))
}

#[utoipa::path(
    get,
    path = "/api/v1/compras/{id}",
    tag = "Compras",
    responses(
        (status = 200, description = "Compra com itens", body = CompraDetalhe),
        (status = 404, description = "Compra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Compra"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_compra(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let compra = app_state.compras_service.get(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(compra))
}

#[utoipa::path(
    put,
    path = "/api/v1/compras/{id}",
    tag = "Compras",
    request_body = UpdateCompraPayload,
    responses(
        (status = 200, description = "Compra atualizada (total recalculado)", body = CompraDetalhe),
        (status = 400, description = "Compra não está pendente")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Compra"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_compra(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<CompraGerir>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompraPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let compra = app_state
        .compras_service
        .update(&mut *tx, tenant.0, id, &payload)
        .await?;
    tx.commit().await?;

    Ok(Json(compra))
}

#[utoipa::path(
    delete,
    path = "/api/v1/compras/{id}",
    tag = "Compras",
    responses(
        (status = 204, description = "Compra excluída"),
        (status = 400, description = "Compra não pendente ou já distribuída")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Compra"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_compra(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<CompraExcluir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    app_state.compras_service.delete(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/compras/{id}/concluir",
    tag = "Compras",
    responses(
        (status = 200, description = "Compra concluída e título a pagar emitido", body = CompraDetalhe),
        (status = 400, description = "Apenas compras pendentes podem ser concluídas")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Compra"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn conclude_compra(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<CompraGerir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let compra = app_state.compras_service.conclude(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(compra))
}

#[utoipa::path(
    post,
    path = "/api/v1/compras/{id}/cancelar",
    tag = "Compras",
    responses(
        (status = 200, description = "Compra cancelada", body = CompraDetalhe),
        (status = 400, description = "Apenas compras pendentes podem ser canceladas")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Compra"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_compra(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<CompraGerir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let compra = app_state.compras_service.cancel(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(compra))
}
