// src/handlers/romaneios.rs

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
        rbac::{RequireAccess, RomaneioGerir},
        tenancy::TenantContext,
    },
    models::romaneios::{
        GenerateRomaneioPayload, Romaneio, RomaneioDetalhe, RomaneioFilters, UpdateRomaneioPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/v1/romaneios",
    tag = "Romaneios",
    request_body = GenerateRomaneioPayload,
    responses(
        (status = 201, description = "Romaneio gerado em rascunho", body = RomaneioDetalhe),
        (status = 404, description = "Loja não encontrada")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_romaneio(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<RomaneioGerir>,
    Json(payload): Json<GenerateRomaneioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let romaneio = app_state
        .romaneios_service
        .generate(&mut *tx, tenant.0, user.0.sub, &payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(romaneio)))
}

#[utoipa::path(
    get,
    path = "/api/v1/romaneios",
    tag = "Romaneios",
    responses(
        (status = 200, description = "Romaneios paginados", body = Paginated<Romaneio>)
    ),
    params(
        PageParams,
        RomaneioFilters,
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_romaneios(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(page): Query<PageParams>,
    Query(filters): Query<RomaneioFilters>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let romaneios = app_state
        .romaneios_service
        .list(&mut *tx, tenant.0, &filters, &page)
        .await?;
    tx.commit().await?;

    Ok(Json(romaneios))
}

#[utoipa::path(
    get,
    path = "/api/v1/romaneios/{id}",
    tag = "Romaneios",
    responses(
        (status = 200, description = "Romaneio com itens", body = RomaneioDetalhe),
        (status = 404, description = "Romaneio não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Romaneio"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_romaneio(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let romaneio = app_state.romaneios_service.get(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(romaneio))
}

#[utoipa::path(
    put,
    path = "/api/v1/romaneios/{id}",
    tag = "Romaneios",
    request_body = UpdateRomaneioPayload,
    responses(
        (status = 200, description = "Romaneio atualizado", body = RomaneioDetalhe),
        (status = 400, description = "Apenas romaneios em rascunho podem ser editados")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Romaneio"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_romaneio(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<RomaneioGerir>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRomaneioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let romaneio = app_state
        .romaneios_service
        .update(&mut *tx, tenant.0, id, &payload)
        .await?;
    tx.commit().await?;

    Ok(Json(romaneio))
}

#[utoipa::path(
    post,
    path = "/api/v1/romaneios/{id}/finalizar",
    tag = "Romaneios",
    responses(
        (status = 200, description = "Romaneio finalizado: títulos por loja e saída de embalagens", body = RomaneioDetalhe),
        (status = 400, description = "Apenas romaneios em rascunho podem ser finalizados")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Romaneio"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn finalize_romaneio(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<RomaneioGerir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let romaneio = app_state.romaneios_service.finalize(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(romaneio))
}

#[utoipa::path(
    post,
    path = "/api/v1/romaneios/{id}/cancelar",
    tag = "Romaneios",
    responses(
        (status = 200, description = "Romaneio cancelado", body = RomaneioDetalhe),
        (status = 400, description = "Apenas romaneios em rascunho podem ser cancelados")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Romaneio"),
        ("x-tenant-id" = Uuid, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_romaneio(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireAccess<RomaneioGerir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state.db_pool, tenant.0, user.0.sub).await?;
    let romaneio = app_state.romaneios_service.cancel(&mut *tx, tenant.0, id).await?;
    tx.commit().await?;

    Ok(Json(romaneio))
}
