// src/common/money.rs

use rust_decimal::{Decimal, RoundingStrategy};

// Mesma precisão das colunas: NUMERIC(14,2) para valores, NUMERIC(14,3) para quantidades
pub const ESCALA_VALOR: u32 = 2;
pub const ESCALA_QUANTIDADE: u32 = 3;

/// Maior valor que cabe em NUMERIC(14,2).
pub const MAX_VALOR: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2); // 99_999_999_999_999 × 10^-2
/// Maior quantidade que cabe em NUMERIC(14,3).
pub const MAX_QUANTIDADE: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 3); // 99_999_999_999_999 × 10^-3

/// Arredonda para centavos (meio para longe do zero, como o Postgres).
pub fn arredondar(valor: Decimal) -> Decimal {
    valor.round_dp_with_strategy(ESCALA_VALOR, RoundingStrategy::MidpointAwayFromZero)
}

/// quantidade × preço, já em centavos. É o valor que a linha grava.
pub fn valor_linha(quantidade: Decimal, preco_unitario: Decimal) -> Decimal {
    arredondar(quantidade * preco_unitario)
}

/// Casas decimais significativas (`1.50` tem uma).
pub fn casas_decimais(valor: &Decimal) -> u32 {
    valor.normalize().scale()
}
