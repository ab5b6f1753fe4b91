// src/models/embalagens.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::{error::AppError, validation::validate_valor_com_sinal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movimento_tipo", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovimentoTipo {
    /// embalagem voltando da loja (diminui o saldo)
    Entrada,
    /// embalagem enviada para a loja (aumenta o saldo)
    Saida,
    Ajuste,
}

impl MovimentoTipo {
    /// Converte a quantidade/depósito informados no delta efetivo do saldo.
    pub fn delta(self, quantidade: i32, deposito: Decimal) -> (i32, Decimal) {
        match self {
            MovimentoTipo::Saida | MovimentoTipo::Ajuste => (quantidade, deposito),
            MovimentoTipo::Entrada => (-quantidade, -deposito),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "referencia_tipo", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReferenciaTipo {
    Romaneio,
    AjusteManual,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmbalagemSaldo {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub loja_id: Uuid,
    pub embalagem_id: Uuid,
    pub saldo_quantidade: i32,
    pub saldo_deposito: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmbalagemMovimento {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub loja_id: Uuid,
    pub embalagem_id: Uuid,
    pub tipo: MovimentoTipo,
    /// Sempre positiva; o sinal aplicado está em `delta_quantidade`.
    pub quantidade: i32,
    pub valor_deposito_total: Decimal,
    pub delta_quantidade: i32,
    pub delta_deposito: Decimal,
    pub referencia_tipo: ReferenciaTipo,
    pub referencia_id: Option<Uuid>,
    pub observacoes: Option<String>,
    pub data_movimento: DateTime<Utc>,
}

/// Movimento a ser aplicado ao saldo (ajuste manual ou fechamento de romaneio).
#[derive(Debug, Clone)]
pub struct NovoMovimento {
    pub loja_id: Uuid,
    pub embalagem_id: Uuid,
    pub tipo: MovimentoTipo,
    pub quantidade: i32,
    pub valor_deposito: Decimal,
    pub referencia_tipo: ReferenciaTipo,
    pub referencia_id: Option<Uuid>,
    pub observacoes: Option<String>,
}

/// Delta já normalizado, pronto para o upsert do saldo e o registro do movimento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaSaldo {
    pub quantidade: i32,
    pub deposito: Decimal,
}

impl NovoMovimento {
    /// Entrada e saída recebem valores positivos (o tipo dá o sinal);
    /// ajuste aceita qualquer sinal, mas precisa mudar alguma coisa.
    pub fn delta(&self) -> Result<DeltaSaldo, AppError> {
        match self.tipo {
            MovimentoTipo::Entrada | MovimentoTipo::Saida => {
                if self.quantidade <= 0 {
                    return Err(AppError::business(
                        "A quantidade de embalagens deve ser maior que zero",
                    ));
                }
                if self.valor_deposito.is_sign_negative() && !self.valor_deposito.is_zero() {
                    return Err(AppError::business("O valor de depósito não pode ser negativo"));
                }
            }
            MovimentoTipo::Ajuste => {
                if self.quantidade == 0 && self.valor_deposito.is_zero() {
                    return Err(AppError::business("O ajuste não altera o saldo"));
                }
            }
        }

        let (quantidade, deposito) = self.tipo.delta(self.quantidade, self.valor_deposito);
        Ok(DeltaSaldo { quantidade, deposito })
    }
}

// --- Payloads / filtros ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AjustePayload {
    pub loja_id: Uuid,
    pub embalagem_id: Uuid,
    pub tipo: MovimentoTipo,

    #[schema(example = 2)]
    pub quantidade: i32,

    #[serde(default)]
    #[validate(custom(function = "validate_valor_com_sinal"))]
    #[schema(example = "10.00")]
    pub valor_deposito: Decimal,

    #[validate(length(max = 500))]
    pub observacoes: Option<String>,
}

impl From<AjustePayload> for NovoMovimento {
    fn from(p: AjustePayload) -> Self {
        NovoMovimento {
            loja_id: p.loja_id,
            embalagem_id: p.embalagem_id,
            tipo: p.tipo,
            quantidade: p.quantidade,
            valor_deposito: p.valor_deposito,
            referencia_tipo: ReferenciaTipo::AjusteManual,
            referencia_id: None,
            observacoes: p.observacoes,
        }
    }
}

/// Resultado de um ajuste: o saldo já atualizado e o movimento gravado.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AjusteResultado {
    pub saldo: EmbalagemSaldo,
    pub movimento: EmbalagemMovimento,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SaldoFilters {
    pub loja_id: Option<Uuid>,
    pub embalagem_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MovimentoFilters {
    pub loja_id: Option<Uuid>,
    pub embalagem_id: Option<Uuid>,
    pub tipo: Option<MovimentoTipo>,
    pub data_inicio: Option<DateTime<Utc>>,
    pub data_fim: Option<DateTime<Utc>>,
}
