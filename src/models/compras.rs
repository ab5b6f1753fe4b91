// src/models/compras.rs

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

// --- Enums (mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "compra_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CompraStatus {
    Pendente,
    Concluida,
    Cancelada,
}

impl Lifecycle for CompraStatus {
    const OPEN: Self = CompraStatus::Pendente;
    const COMPLETED: Self = CompraStatus::Concluida;
    const CANCELLED: Self = CompraStatus::Cancelada;

    fn rejection(transition: Transition) -> &'static str {
        match transition {
            Transition::Complete => "Apenas compras pendentes podem ser concluídas",
            Transition::Cancel => "Apenas compras pendentes podem ser canceladas",
            Transition::Edit => "Apenas compras pendentes podem ser editadas",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "metodo_pagamento", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MetodoPagamento {
    Dinheiro,
    Pix,
    Boleto,
    Cartao,
    Transferencia,
    #[default]
    Prazo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "unidade_medida", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UnidadeMedida {
    Kg,
    #[default]
    Un,
    Cx,
    Dz,
    Mc,
    Lt,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Compra {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "COM-20250115093000123")]
    pub numero: String,
    pub fornecedor_id: Uuid,
    pub comprador_user_id: Uuid,
    pub data_compra: DateTime<Utc>,
    #[schema(example = "110.00")]
    pub valor_total: Decimal,
    pub descontos: Decimal,
    pub acrescimos: Decimal,
    pub status: CompraStatus,
    pub metodo_pagamento: MetodoPagamento,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompraItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub compra_id: Uuid,
    pub produto_id: Uuid,
    #[schema(example = "10.000")]
    pub quantidade_total: Decimal,
    #[schema(example = "5.00")]
    pub preco_unitario: Decimal,
    pub unidade_medida: UnidadeMedida,
    pub embalagem_id: Option<Uuid>,
    pub quantidade_embalagens: i32,
    pub valor_deposito_total: Decimal,
}

/// Compra com seus itens (resposta de todas as operações sobre uma compra).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompraDetalhe {
    #[serde(flatten)]
    pub compra: Compra,
    pub itens: Vec<CompraItem>,
}

// --- Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompraItemPayload {
    pub produto_id: Uuid,

    #[validate(custom(function = "validate_quantidade"))]
    #[schema(example = "10")]
    pub quantidade_total: Decimal,

    #[validate(custom(function = "validate_valor"))]
    #[schema(example = "5.00")]
    pub preco_unitario: Decimal,

    #[serde(default)]
    pub unidade_medida: UnidadeMedida,

    pub embalagem_id: Option<Uuid>,

    #[serde(default)]
    #[validate(range(min = 0, message = "A quantidade de embalagens não pode ser negativa."))]
    pub quantidade_embalagens: i32,

    #[serde(default)]
    #[validate(custom(function = "validate_valor"))]
    pub valor_deposito_total: Decimal,
}

impl CompraItemPayload {
    /// quantidade × preço (em centavos) + depósito das embalagens
    pub fn subtotal(&self) -> Decimal {
        valor_linha(self.quantidade_total, self.preco_unitario) + self.valor_deposito_total
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompraPayload {
    pub fornecedor_id: Uuid,

    pub data_compra: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(custom(function = "validate_valor"))]
    pub descontos: Decimal,

    #[serde(default)]
    #[validate(custom(function = "validate_valor"))]
    pub acrescimos: Decimal,

    #[serde(default)]
    pub metodo_pagamento: MetodoPagamento,

    pub observacoes: Option<String>,

    #[validate(length(min = 1, message = "A compra precisa de pelo menos um item."))]
    #[validate(nested)]
    pub itens: Vec<CompraItemPayload>,
}

impl CreateCompraPayload {
    /// total = Σ(quantidade × preço + depósito) − descontos + acréscimos
    pub fn total(&self) -> Decimal {
        calcular_total(self.itens.iter().map(CompraItemPayload::subtotal), self.descontos, self.acrescimos)
    }
}

pub fn calcular_total(
    subtotais: impl IntoIterator<Item = Decimal>,
    descontos: Decimal,
    acrescimos: Decimal,
) -> Decimal {
    subtotais.into_iter().sum::<Decimal>() - descontos + acrescimos
}

/// Número legível da compra: `COM-AAAAMMDDHHMMSSmmm`.
pub fn gerar_numero(agora: DateTime<Utc>) -> String {
    format!("COM-{}", agora.format("%Y%m%d%H%M%S%3f"))
}

/// Edição parcial: só os campos enviados mudam.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompraPayload {
    #[validate(custom(function = "validate_valor"))]
    pub descontos: Option<Decimal>,

    #[validate(custom(function = "validate_valor"))]
    pub acrescimos: Option<Decimal>,

    pub metodo_pagamento: Option<MetodoPagamento>,

    pub observacoes: Option<String>,
}

impl UpdateCompraPayload {
    pub fn is_empty(&self) -> bool {
        self.descontos.is_none()
            && self.acrescimos.is_none()
            && self.metodo_pagamento.is_none()
            && self.observacoes.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CompraFilters {
    pub fornecedor_id: Option<Uuid>,
    pub status: Option<CompraStatus>,
    pub comprador_user_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(qtd: Decimal, preco: Decimal, deposito: Decimal) -> CompraItemPayload {
        CompraItemPayload {
            produto_id: Uuid::new_v4(),
            quantidade_total: qtd,
            preco_unitario: preco,
            unidade_medida: UnidadeMedida::Un,
            embalagem_id: None,
            quantidade_embalagens: 0,
            valor_deposito_total: deposito,
        }
    }

    fn payload(itens: Vec<CompraItemPayload>, descontos: Decimal, acrescimos: Decimal) -> CreateCompraPayload {
        CreateCompraPayload {
            fornecedor_id: Uuid::new_v4(),
            data_compra: None,
            descontos,
            acrescimos,
            metodo_pagamento: MetodoPagamento::Prazo,
            observacoes: None,
            itens,
        }
    }

    #[test]
    fn total_of_two_plain_lines() {
        let p = payload(
            vec![item(dec!(10), dec!(5.00), dec!(0)), item(dec!(3), dec!(20.00), dec!(0))],
            dec!(0),
            dec!(0),
        );
        assert_eq!(p.total(), dec!(110.00));
    }

    #[test]
    fn total_includes_deposits_discounts_and_surcharges() {
        let p = payload(
            vec![item(dec!(2.5), dec!(4.00), dec!(12.00)), item(dec!(1), dec!(7.50), dec!(0))],
            dec!(3.00),
            dec!(1.25),
        );
        // 10 + 12 + 7.5 - 3 + 1.25
        assert_eq!(p.total(), dec!(27.75));
    }

    #[test]
    fn each_line_is_rounded_to_cents_before_summing() {
        let p = payload(
            vec![item(dec!(0.333), dec!(1.00), dec!(0)); 3],
            dec!(0),
            dec!(0),
        );
        assert_eq!(p.total(), dec!(0.99));
    }

    #[test]
    fn quantity_finer_than_thousandths_fails_validation() {
        let p = payload(vec![item(dec!(1.0005), dec!(100.00), dec!(0))], dec!(0), dec!(0));
        assert!(p.validate().is_err());
    }

    #[test]
    fn oversized_values_fail_validation_instead_of_overflowing() {
        let enorme = dec!(100000000000000000000);
        let p = payload(vec![item(enorme, enorme, dec!(0))], dec!(0), dec!(0));
        assert!(p.validate().is_err());
    }

    #[test]
    fn empty_item_list_fails_validation() {
        let p = payload(vec![], dec!(0), dec!(0));
        let errors = p.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("itens"));
    }

    #[test]
    fn negative_price_fails_nested_validation() {
        let p = payload(vec![item(dec!(1), dec!(-1), dec!(0))], dec!(0), dec!(0));
        assert!(p.validate().is_err());
    }

    #[test]
    fn purchase_number_has_millisecond_timestamp() {
        use chrono::TimeZone;
        let agora = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(gerar_numero(agora), "COM-20250115093000123");
    }

    #[test]
    fn status_and_enums_use_portuguese_wire_names() {
        assert_eq!(serde_json::to_string(&CompraStatus::Concluida).unwrap(), "\"concluida\"");
        let m: MetodoPagamento = serde_json::from_str("\"pix\"").unwrap();
        assert_eq!(m, MetodoPagamento::Pix);
        assert_eq!(MetodoPagamento::default(), MetodoPagamento::Prazo);
    }
}
