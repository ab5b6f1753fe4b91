// src/common/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

use crate::common::money::{casas_decimais, ESCALA_QUANTIDADE, ESCALA_VALOR, MAX_QUANTIDADE, MAX_VALOR};

// Validações customizadas reaproveitadas pelos payloads

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_decimal(val: &Decimal, escala: u32, maximo: Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    validate_escala(val, escala, maximo)
}

fn validate_escala(val: &Decimal, escala: u32, maximo: Decimal) -> Result<(), ValidationError> {
    if casas_decimais(val) > escala {
        let mut err = ValidationError::new("scale");
        err.add_param("max".into(), &escala);
        err.message = Some(format!("Use no máximo {escala} casas decimais.").into());
        return Err(err);
    }
    if val.abs() > maximo {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &maximo.to_string());
        err.message = Some("O valor excede o limite permitido.".into());
        return Err(err);
    }
    Ok(())
}

/// Valor monetário: não negativo, centavos, cabe em NUMERIC(14,2).
pub fn validate_valor(val: &Decimal) -> Result<(), ValidationError> {
    validate_decimal(val, ESCALA_VALOR, MAX_VALOR)
}

/// Valor monetário de ajuste, com sinal.
pub fn validate_valor_com_sinal(val: &Decimal) -> Result<(), ValidationError> {
    validate_escala(val, ESCALA_VALOR, MAX_VALOR)
}

/// Quantidade: não negativa, até milésimos, cabe em NUMERIC(14,3).
pub fn validate_quantidade(val: &Decimal) -> Result<(), ValidationError> {
    validate_decimal(val, ESCALA_QUANTIDADE, MAX_QUANTIDADE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_and_positive_are_accepted() {
        assert!(validate_not_negative(&dec!(0)).is_ok());
        assert!(validate_not_negative(&dec!(-0.00)).is_ok());
        assert!(validate_not_negative(&dec!(10.5)).is_ok());
    }

    #[test]
    fn negative_is_rejected() {
        let err = validate_not_negative(&dec!(-0.01)).unwrap_err();
        assert_eq!(err.code, "range");
    }

    #[test]
    fn money_is_limited_to_cents() {
        assert!(validate_valor(&dec!(5.00)).is_ok());
        assert!(validate_valor(&dec!(5.10)).is_ok());
        assert_eq!(validate_valor(&dec!(5.001)).unwrap_err().code, "scale");
        assert_eq!(validate_valor(&dec!(-1)).unwrap_err().code, "range");
        assert!(validate_valor_com_sinal(&dec!(-15.00)).is_ok());
        assert_eq!(validate_valor_com_sinal(&dec!(-0.005)).unwrap_err().code, "scale");
    }

    #[test]
    fn quantity_is_limited_to_thousandths() {
        assert!(validate_quantidade(&dec!(0.333)).is_ok());
        assert_eq!(validate_quantidade(&dec!(1.0005)).unwrap_err().code, "scale");
    }

    #[test]
    fn values_beyond_the_column_are_rejected() {
        assert!(validate_valor(&dec!(999999999999.99)).is_ok());
        assert_eq!(validate_valor(&dec!(1000000000000)).unwrap_err().code, "range");
        assert_eq!(
            validate_quantidade(&dec!(100000000000000000000)).unwrap_err().code,
            "range"
        );
    }
}
