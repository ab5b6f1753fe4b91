// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::common;

#[derive(OpenApi)]
#[openapi(
    info(title = "CEASA Backend", description = "Compras, romaneios, embalagens, devoluções e títulos"),
    paths(
        handlers::health::health,

        // --- COMPRAS ---
        handlers::compras::create_compra,
        handlers::compras::list_compras,
        handlers::compras::get_compra,
        handlers::compras::update_compra,
        handlers::compras::delete_compra,
        handlers::compras::conclude_compra,
        handlers::compras::cancel_compra,

        // --- ROMANEIOS ---
        handlers::romaneios::generate_romaneio,
        handlers::romaneios::list_romaneios,
        handlers::romaneios::get_romaneio,
        handlers::romaneios::update_romaneio,
        handlers::romaneios::finalize_romaneio,
        handlers::romaneios::cancel_romaneio,

        // --- EMBALAGENS ---
        handlers::embalagens::list_saldos,
        handlers::embalagens::list_movimentos,
        handlers::embalagens::adjust_saldo,

        // --- DEVOLUÇÕES ---
        handlers::devolucoes::create_devolucao,
        handlers::devolucoes::list_devolucoes,
        handlers::devolucoes::get_devolucao,
        handlers::devolucoes::process_devolucao,
        handlers::devolucoes::cancel_devolucao,

        // --- FINANCEIRO ---
        handlers::financeiro::list_titulos,
        handlers::financeiro::get_titulo,
        handlers::financeiro::settle_titulo,
        handlers::financeiro::reverse_titulo,
        handlers::financeiro::cancel_titulo,
    ),
    components(
        schemas(
            handlers::health::HealthStatus,
            common::pagination::Pagination,

            // --- Compras ---
            models::compras::CompraStatus,
            models::compras::MetodoPagamento,
            models::compras::UnidadeMedida,
            models::compras::Compra,
            models::compras::CompraItem,
            models::compras::CompraDetalhe,
            models::compras::CompraItemPayload,
            models::compras::CreateCompraPayload,
            models::compras::UpdateCompraPayload,

            // --- Romaneios ---
            models::romaneios::RomaneioStatus,
            models::romaneios::Romaneio,
            models::romaneios::RomaneioItem,
            models::romaneios::RomaneioDetalhe,
            models::romaneios::RomaneioItemPayload,
            models::romaneios::GenerateRomaneioPayload,
            models::romaneios::UpdateRomaneioPayload,

            // --- Embalagens ---
            models::embalagens::MovimentoTipo,
            models::embalagens::ReferenciaTipo,
            models::embalagens::EmbalagemSaldo,
            models::embalagens::EmbalagemMovimento,
            models::embalagens::AjustePayload,
            models::embalagens::AjusteResultado,

            // --- Devoluções ---
            models::devolucoes::Tratamento,
            models::devolucoes::DevolucaoStatus,
            models::devolucoes::Devolucao,
            models::devolucoes::DevolucaoItem,
            models::devolucoes::DevolucaoDetalhe,
            models::devolucoes::DevolucaoItemPayload,
            models::devolucoes::CreateDevolucaoPayload,

            // --- Financeiro ---
            models::financeiro::TituloTipo,
            models::financeiro::TituloStatus,
            models::financeiro::TituloOrigem,
            models::financeiro::TituloLoja,
            models::financeiro::TituloFornecedor,
            models::financeiro::TituloResolvido,
            models::financeiro::BaixaPayload,
            models::financeiro::TitulosListagem,
        )
    ),
    tags(
        (name = "Health", description = "Disponibilidade do serviço"),
        (name = "Compras", description = "Compras junto aos fornecedores"),
        (name = "Romaneios", description = "Distribuição das compras para as lojas"),
        (name = "Embalagens", description = "Saldos e movimentos de embalagens retornáveis"),
        (name = "Devoluções", description = "Devoluções das lojas"),
        (name = "Financeiro", description = "Títulos a pagar e a receber")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
