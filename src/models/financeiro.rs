// src/models/financeiro.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::{error::AppError, pagination::Paginated};

/// Prazo padrão dos títulos gerados pelos fluxos.
pub const VENCIMENTO_DIAS: i64 = 30;

pub fn vencimento_padrao(emissao: DateTime<Utc>) -> DateTime<Utc> {
    emissao + Duration::days(VENCIMENTO_DIAS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "titulo_tipo", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TituloTipo {
    Receber,
    Pagar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "titulo_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TituloStatus {
    Aberto,
    Parcial,
    Pago,
    Cancelado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcaoTitulo {
    Baixar,
    Estornar,
    Cancelar,
}

impl TituloStatus {
    /// ```text
    /// aberto|parcial --(baixar)--> pago --(estornar)--> aberto
    /// aberto|parcial --(cancelar)--> cancelado
    /// ```
    pub fn apply(self, acao: AcaoTitulo) -> Result<TituloStatus, AppError> {
        use TituloStatus::*;
        match (acao, self) {
            (AcaoTitulo::Baixar, Aberto | Parcial) => Ok(Pago),
            (AcaoTitulo::Baixar, Pago) => Err(AppError::business("Título já está pago")),
            (AcaoTitulo::Baixar, Cancelado) => {
                Err(AppError::business("Título cancelado não pode ser baixado"))
            }
            (AcaoTitulo::Estornar, Pago) => Ok(Aberto),
            (AcaoTitulo::Estornar, _) => {
                Err(AppError::business("Apenas títulos pagos podem ser estornados"))
            }
            (AcaoTitulo::Cancelar, Aberto | Parcial) => Ok(Cancelado),
            (AcaoTitulo::Cancelar, Pago) => Err(AppError::business(
                "Título pago não pode ser cancelado; estorne primeiro",
            )),
            (AcaoTitulo::Cancelar, Cancelado) => Err(AppError::business("Título já está cancelado")),
        }
    }

    /// Estados a partir dos quais a ação é aceita (usado no UPDATE condicional).
    pub fn origens(acao: AcaoTitulo) -> &'static [TituloStatus] {
        match acao {
            AcaoTitulo::Baixar | AcaoTitulo::Cancelar => &[TituloStatus::Aberto, TituloStatus::Parcial],
            AcaoTitulo::Estornar => &[TituloStatus::Pago],
        }
    }
}

/// Título loja ↔ comprador (principal + depósitos de embalagem).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TituloLoja {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub tipo: TituloTipo,
    pub loja_id: Uuid,
    pub romaneio_id: Option<Uuid>,
    pub devolucao_id: Option<Uuid>,
    pub valor_principal: Decimal,
    pub valor_depositos: Decimal,
    pub valor_total: Decimal,
    pub data_emissao: DateTime<Utc>,
    pub data_vencimento: DateTime<Utc>,
    pub data_pagamento: Option<DateTime<Utc>>,
    pub status: TituloStatus,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Título comprador ↔ fornecedor (só principal).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TituloFornecedor {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub tipo: TituloTipo,
    pub fornecedor_id: Uuid,
    pub compra_id: Option<Uuid>,
    pub valor_principal: Decimal,
    pub data_emissao: DateTime<Utc>,
    pub data_vencimento: DateTime<Utc>,
    pub data_pagamento: Option<DateTime<Utc>>,
    pub status: TituloStatus,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Em qual das duas tabelas o título mora.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TituloOrigem {
    Loja,
    Fornecedor,
}

impl TituloOrigem {
    /// Ordem de resolução de um id.
    pub const ORDEM: [TituloOrigem; 2] = [TituloOrigem::Loja, TituloOrigem::Fornecedor];

    pub fn tabela(self) -> &'static str {
        match self {
            TituloOrigem::Loja => "titulos_loja_comprador",
            TituloOrigem::Fornecedor => "titulos_comprador_fornecedor",
        }
    }
}

/// Título resolvido por id, com a origem explícita.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "tipo", content = "titulo", rename_all = "lowercase")]
pub enum TituloResolvido {
    Loja(TituloLoja),
    Fornecedor(TituloFornecedor),
}

impl TituloResolvido {
    pub fn origem(&self) -> TituloOrigem {
        match self {
            TituloResolvido::Loja(_) => TituloOrigem::Loja,
            TituloResolvido::Fornecedor(_) => TituloOrigem::Fornecedor,
        }
    }

    pub fn status(&self) -> TituloStatus {
        match self {
            TituloResolvido::Loja(t) => t.status,
            TituloResolvido::Fornecedor(t) => t.status,
        }
    }
}

// --- Inserção (só pelos fluxos, nunca direto pelo cliente) ---

#[derive(Debug, Clone)]
pub struct NovoTituloLoja {
    pub tipo: TituloTipo,
    pub loja_id: Uuid,
    pub romaneio_id: Option<Uuid>,
    pub devolucao_id: Option<Uuid>,
    pub valor_principal: Decimal,
    pub valor_depositos: Decimal,
    pub data_vencimento: DateTime<Utc>,
    pub observacoes: Option<String>,
}

impl NovoTituloLoja {
    pub fn valor_total(&self) -> Decimal {
        self.valor_principal + self.valor_depositos
    }
}

#[derive(Debug, Clone)]
pub struct NovoTituloFornecedor {
    pub tipo: TituloTipo,
    pub fornecedor_id: Uuid,
    pub compra_id: Option<Uuid>,
    pub valor_principal: Decimal,
    pub data_vencimento: DateTime<Utc>,
    pub observacoes: Option<String>,
}

// --- Payloads / filtros ---

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BaixaPayload {
    /// Padrão: agora.
    pub data_pagamento: Option<DateTime<Utc>>,

    #[validate(length(max = 500))]
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TituloFilters {
    /// Restringe a uma das origens; sem ele as duas são listadas.
    pub tipo: Option<TituloOrigem>,
    pub status: Option<TituloStatus>,
    pub loja_id: Option<Uuid>,
    pub fornecedor_id: Option<Uuid>,
}

impl TituloFilters {
    pub fn inclui(&self, origem: TituloOrigem) -> bool {
        self.tipo.is_none_or(|t| t == origem)
    }
}

/// Duas coleções paralelas, uma por origem.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TitulosListagem {
    pub titulos_loja: Option<Paginated<TituloLoja>>,
    pub titulos_fornecedor: Option<Paginated<TituloFornecedor>>,
}
