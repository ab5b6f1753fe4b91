// src/models/devolucoes.rs

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

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tratamento_devolucao", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tratamento {
    #[default]
    Credito,
    Troca,
    Estorno,
}

/// O que o processamento da devolução faz no financeiro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfeitoFinanceiro {
    /// novo título a pagar para a loja
    NovoTituloPagar,
    /// abate o título em aberto do romaneio
    AbaterTituloRomaneio(Uuid),
    Nenhum,
}

impl Tratamento {
    pub fn efeito(self, romaneio_id: Option<Uuid>) -> EfeitoFinanceiro {
        match (self, romaneio_id) {
            (Tratamento::Credito, _) => EfeitoFinanceiro::NovoTituloPagar,
            (Tratamento::Estorno, Some(romaneio_id)) => EfeitoFinanceiro::AbaterTituloRomaneio(romaneio_id),
            (Tratamento::Estorno, None) | (Tratamento::Troca, _) => EfeitoFinanceiro::Nenhum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "devolucao_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DevolucaoStatus {
    Pendente,
    Processada,
    Cancelada,
}

impl Lifecycle for DevolucaoStatus {
    const OPEN: Self = DevolucaoStatus::Pendente;
    const COMPLETED: Self = DevolucaoStatus::Processada;
    const CANCELLED: Self = DevolucaoStatus::Cancelada;

    fn rejection(transition: Transition) -> &'static str {
        match transition {
            Transition::Complete => "Apenas devoluções pendentes podem ser processadas",
            Transition::Cancel => "Apenas devoluções pendentes podem ser canceladas",
            Transition::Edit => "Apenas devoluções pendentes podem ser editadas",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Devolucao {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub loja_id: Uuid,
    pub romaneio_id: Option<Uuid>,
    pub data_devolucao: DateTime<Utc>,
    pub motivo: String,
    pub tratamento: Tratamento,
    pub status: DevolucaoStatus,
    pub valor_total: Decimal,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DevolucaoItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub devolucao_id: Uuid,
    pub produto_id: Uuid,
    pub quantidade: Decimal,
    pub motivo_especifico: Option<String>,
    pub valor_unitario: Decimal,
    pub valor_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DevolucaoDetalhe {
    #[serde(flatten)]
    pub devolucao: Devolucao,
    pub itens: Vec<DevolucaoItem>,
}

// --- Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DevolucaoItemPayload {
    pub produto_id: Uuid,

    #[validate(custom(function = "validate_quantidade"))]
    #[schema(example = "2")]
    pub quantidade: Decimal,

    /// Ausente conta como zero.
    #[validate(custom(function = "validate_valor"))]
    #[schema(example = "3.50")]
    pub valor_unitario: Option<Decimal>,

    #[validate(length(max = 500))]
    pub motivo_especifico: Option<String>,
}

impl DevolucaoItemPayload {
    pub fn valor_unitario(&self) -> Decimal {
        self.valor_unitario.unwrap_or(Decimal::ZERO)
    }

    /// Já em centavos: é o mesmo valor que a linha grava.
    pub fn valor_total(&self) -> Decimal {
        valor_linha(self.quantidade, self.valor_unitario())
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDevolucaoPayload {
    pub loja_id: Uuid,

    pub romaneio_id: Option<Uuid>,

    pub data_devolucao: Option<DateTime<Utc>>,

    #[validate(length(min = 1, max = 500, message = "O motivo é obrigatório."))]
    #[schema(example = "Mercadoria avariada")]
    pub motivo: String,

    #[serde(default)]
    pub tratamento: Tratamento,

    pub observacoes: Option<String>,

    #[validate(length(min = 1, message = "A devolução precisa de pelo menos um item."))]
    #[validate(nested)]
    pub itens: Vec<DevolucaoItemPayload>,
}

impl CreateDevolucaoPayload {
    pub fn total(&self) -> Decimal {
        self.itens.iter().map(DevolucaoItemPayload::valor_total).sum()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DevolucaoFilters {
    pub loja_id: Option<Uuid>,
    pub status: Option<DevolucaoStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(qtd: Decimal, preco: Option<Decimal>) -> DevolucaoItemPayload {
        DevolucaoItemPayload {
            produto_id: Uuid::new_v4(),
            quantidade: qtd,
            valor_unitario: preco,
            motivo_especifico: None,
        }
    }

    #[test]
    fn missing_unit_price_counts_as_zero() {
        let payload = CreateDevolucaoPayload {
            loja_id: Uuid::new_v4(),
            romaneio_id: None,
            data_devolucao: None,
            motivo: "Avaria".into(),
            tratamento: Tratamento::default(),
            observacoes: None,
            itens: vec![item(dec!(2), Some(dec!(3.50))), item(dec!(4), None)],
        };
        assert_eq!(payload.total(), dec!(7.00));
        assert_eq!(payload.tratamento, Tratamento::Credito);
    }

    #[test]
    fn header_total_is_the_sum_of_rounded_lines() {
        let payload = CreateDevolucaoPayload {
            loja_id: Uuid::new_v4(),
            romaneio_id: None,
            data_devolucao: None,
            motivo: "Avaria".into(),
            tratamento: Tratamento::Credito,
            observacoes: None,
            itens: vec![item(dec!(0.333), Some(dec!(1.00))); 3],
        };
        let soma_linhas: Decimal = payload.itens.iter().map(DevolucaoItemPayload::valor_total).sum();
        assert_eq!(payload.total(), dec!(0.99));
        assert_eq!(payload.total(), soma_linhas);
    }

    #[test]
    fn unit_price_with_fractions_of_cent_fails_validation() {
        let payload = CreateDevolucaoPayload {
            loja_id: Uuid::new_v4(),
            romaneio_id: None,
            data_devolucao: None,
            motivo: "Avaria".into(),
            tratamento: Tratamento::Credito,
            observacoes: None,
            itens: vec![item(dec!(1), Some(dec!(1.005)))],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn treatment_dispatch() {
        let romaneio = Uuid::new_v4();
        assert_eq!(Tratamento::Credito.efeito(None), EfeitoFinanceiro::NovoTituloPagar);
        assert_eq!(Tratamento::Credito.efeito(Some(romaneio)), EfeitoFinanceiro::NovoTituloPagar);
        assert_eq!(
            Tratamento::Estorno.efeito(Some(romaneio)),
            EfeitoFinanceiro::AbaterTituloRomaneio(romaneio)
        );
        assert_eq!(Tratamento::Estorno.efeito(None), EfeitoFinanceiro::Nenhum);
        assert_eq!(Tratamento::Troca.efeito(Some(romaneio)), EfeitoFinanceiro::Nenhum);
    }

    #[test]
    fn blank_reason_fails_validation() {
        let payload = CreateDevolucaoPayload {
            loja_id: Uuid::new_v4(),
            romaneio_id: None,
            data_devolucao: None,
            motivo: String::new(),
            tratamento: Tratamento::Troca,
            observacoes: None,
            itens: vec![item(dec!(1), None)],
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("motivo"));
    }
}
