// src/models/romaneios.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::{
    money::valor_linha,
    validation::{validate_quantidade, validate_valor},
};
use crate::models::lifecycle::{Lifecycle, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "romaneio_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RomaneioStatus {
    Rascunho,
    Finalizado,
    Cancelado,
}

impl Lifecycle for RomaneioStatus {
    const OPEN: Self = RomaneioStatus::Rascunho;
    const COMPLETED: Self = RomaneioStatus::Finalizado;
    const CANCELLED: Self = RomaneioStatus::Cancelado;

    fn rejection(transition: Transition) -> &'static str {
        match transition {
            Transition::Complete => "Apenas romaneios em rascunho podem ser finalizados",
            Transition::Cancel => "Apenas romaneios em rascunho podem ser cancelados",
            Transition::Edit => "Apenas romaneios em rascunho podem ser editados",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Romaneio {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub data_romaneio: DateTime<Utc>,
    pub status: RomaneioStatus,
    pub comprador_user_id: Uuid,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RomaneioItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub romaneio_id: Uuid,
    pub loja_id: Uuid,
    pub produto_id: Uuid,
    pub compra_item_id: Option<Uuid>,
    pub quantidade: Decimal,
    pub preco_unitario: Decimal,
    /// quantidade × preço + depósito
    pub valor_total: Decimal,
    pub embalagem_id: Option<Uuid>,
    pub quantidade_embalagens: i32,
    pub valor_deposito_total: Decimal,
}

impl RomaneioItem {
    pub fn valor_mercadoria(&self) -> Decimal {
        valor_linha(self.quantidade, self.preco_unitario)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RomaneioDetalhe {
    #[serde(flatten)]
    pub romaneio: Romaneio,
    pub itens: Vec<RomaneioItem>,
}

// --- Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RomaneioItemPayload {
    pub loja_id: Uuid,
    pub produto_id: Uuid,
    /// Linha da compra que está sendo distribuída, quando houver.
    pub compra_item_id: Option<Uuid>,

    #[validate(custom(function = "validate_quantidade"))]
    #[schema(example = "5")]
    pub quantidade: Decimal,

    #[validate(custom(function = "validate_valor"))]
    #[schema(example = "2.00")]
    pub preco_unitario: Decimal,

    pub embalagem_id: Option<Uuid>,

    #[serde(default)]
    #[validate(range(min = 0, message = "A quantidade de embalagens não pode ser negativa."))]
    pub quantidade_embalagens: i32,

    #[serde(default)]
    #[validate(custom(function = "validate_valor"))]
    pub valor_deposito_total: Decimal,
}

impl RomaneioItemPayload {
    /// Valor gravado na linha: mercadoria em centavos + depósito.
    pub fn valor_total(&self) -> Decimal {
        valor_linha(self.quantidade, self.preco_unitario) + self.valor_deposito_total
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRomaneioPayload {
    pub data_romaneio: Option<DateTime<Utc>>,

    pub observacoes: Option<String>,

    #[validate(length(min = 1, message = "O romaneio precisa de pelo menos um item."))]
    #[validate(nested)]
    pub itens: Vec<RomaneioItemPayload>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRomaneioPayload {
    pub data_romaneio: Option<DateTime<Utc>>,
    pub observacoes: Option<String>,
}

impl UpdateRomaneioPayload {
    pub fn is_empty(&self) -> bool {
        self.data_romaneio.is_none() && self.observacoes.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RomaneioFilters {
    pub status: Option<RomaneioStatus>,
    pub comprador_user_id: Option<Uuid>,
}

// --- Fechamento por loja ---

/// Valores consolidados de uma loja no fechamento do romaneio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FechamentoLoja {
    pub loja_id: Uuid,
    pub valor_principal: Decimal,
    pub valor_depositos: Decimal,
}

impl FechamentoLoja {
    pub fn valor_total(&self) -> Decimal {
        self.valor_principal + self.valor_depositos
    }
}

/// Agrupa as linhas por loja, na ordem em que cada loja aparece pela primeira vez.
/// Principal = Σ quantidade × preço; depósitos somados à parte.
pub fn agrupar_por_loja(itens: &[RomaneioItem]) -> Vec<FechamentoLoja> {
    let mut grupos: Vec<FechamentoLoja> = Vec::new();

    for item in itens {
        let idx = match grupos.iter().position(|g| g.loja_id == item.loja_id) {
            Some(idx) => idx,
            None => {
                grupos.push(FechamentoLoja {
                    loja_id: item.loja_id,
                    valor_principal: Decimal::ZERO,
                    valor_depositos: Decimal::ZERO,
                });
                grupos.len() - 1
            }
        };
        grupos[idx].valor_principal += item.valor_mercadoria();
        grupos[idx].valor_depositos += item.valor_deposito_total;
    }

    grupos
}
