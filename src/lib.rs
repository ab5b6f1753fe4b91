//src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::tenant_guard};

/// Monta o router completo (`/api/v1` + Swagger).
pub fn router(app_state: AppState) -> Router {
    let compras_routes = Router::new()
        .route("/",
               post(handlers::compras::create_compra)
               .get(handlers::compras::list_compras)
        )
        .route("/{id}",
               get(handlers::compras::get_compra)
               .put(handlers::compras::update_compra)
               .delete(handlers::compras::delete_compra)
        )
        .route("/{id}/concluir", post(handlers::compras::conclude_compra))
        .route("/{id}/cancelar", post(handlers::compras::cancel_compra));

    let romaneios_routes = Router::new()
        .route("/",
               post(handlers::romaneios::generate_romaneio)
               .get(handlers::romaneios::list_romaneios)
        )
        .route("/{id}",
               get(handlers::romaneios::get_romaneio)
               .put(handlers::romaneios::update_romaneio)
        )
        .route("/{id}/finalizar", post(handlers::romaneios::finalize_romaneio))
        .route("/{id}/cancelar", post(handlers::romaneios::cancel_romaneio));

    let embalagens_routes = Router::new()
        .route("/saldos", get(handlers::embalagens::list_saldos))
        .route("/movimentos", get(handlers::embalagens::list_movimentos))
        .route("/ajustes", post(handlers::embalagens::adjust_saldo));

    let devolucoes_routes = Router::new()
        .route("/",
               post(handlers::devolucoes::create_devolucao)
               .get(handlers::devolucoes::list_devolucoes)
        )
        .route("/{id}", get(handlers::devolucoes::get_devolucao))
        .route("/{id}/processar", post(handlers::devolucoes::process_devolucao))
        .route("/{id}/cancelar", post(handlers::devolucoes::cancel_devolucao));

    let financeiro_routes = Router::new()
        .route("/titulos", get(handlers::financeiro::list_titulos))
        .route("/titulos/{id}", get(handlers::financeiro::get_titulo))
        .route("/titulos/{id}/baixar", post(handlers::financeiro::settle_titulo))
        .route("/titulos/{id}/estornar", post(handlers::financeiro::reverse_titulo))
        .route("/titulos/{id}/cancelar", post(handlers::financeiro::cancel_titulo));

    // Tudo abaixo exige token + x-tenant-id
    let protected = Router::new()
        .nest("/compras", compras_routes)
        .nest("/romaneios", romaneios_routes)
        .nest("/embalagens", embalagens_routes)
        .nest("/devolucoes", devolucoes_routes)
        .nest("/financeiro", financeiro_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let api = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(protected);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .with_state(app_state)
}
