// src/common/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

// Prefijos de RUC vigentes: persona natural (10), no domiciliados (15, 17),
// entidades especiales (16) y personas jurídicas (20).
const RUC_PREFIXES: [&str; 5] = ["10", "15", "16", "17", "20"];
const RUC_WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

/// Decimales de las columnas de stock y de receta.
pub const STOCK_SCALE: u32 = 4;
pub const RECIPE_SCALE: u32 = 6;

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

pub fn is_valid_dni(value: &str) -> bool {
    value.len() == 8 && all_digits(value)
}

/// RUC de 11 dígitos con prefijo válido y dígito verificador módulo 11.
pub fn is_valid_ruc(value: &str) -> bool {
    if value.len() != 11 || !all_digits(value) {
        return false;
    }
    if !RUC_PREFIXES.iter().any(|p| value.starts_with(p)) {
        return false;
    }

    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    let sum: u32 = digits[..10]
        .iter()
        .zip(RUC_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();

    let check = match 11 - (sum % 11) {
        10 => 0,
        11 => 1,
        r => r,
    };

    check == digits[10]
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

// ---
// Validadores para `#[validate(custom(...))]`
// ---

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        return Err(error("range", "El valor debe ser mayor que cero."));
    }
    Ok(())
}

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        return Err(error("range", "El valor no puede ser negativo."));
    }
    Ok(())
}

// Los ceros a la derecha no cuentan: "1.50000" cabe en 4 decimales
fn fits_scale(val: &Decimal, scale: u32) -> bool {
    val.normalize().scale() <= scale
}

/// Cantidad de stock a mover: positiva y con a lo más 4 decimales.
pub fn validate_quantity(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    if !fits_scale(val, STOCK_SCALE) {
        return Err(error("scale", "La cantidad admite como máximo 4 decimales."));
    }
    Ok(())
}

/// Stock contado o inicial: puede ser cero, nunca negativo.
pub fn validate_stock_count(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    if !fits_scale(val, STOCK_SCALE) {
        return Err(error("scale", "El stock admite como máximo 4 decimales."));
    }
    Ok(())
}

pub fn validate_recipe_quantity(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    if !fits_scale(val, RECIPE_SCALE) {
        return Err(error("scale", "La cantidad por unidad admite como máximo 6 decimales."));
    }
    Ok(())
}

pub fn validate_dni(val: &str) -> Result<(), ValidationError> {
    if !is_valid_dni(val) {
        return Err(error("dni", "El DNI debe tener 8 dígitos."));
    }
    Ok(())
}

pub fn validate_ruc(val: &str) -> Result<(), ValidationError> {
    if !is_valid_ruc(val) {
        return Err(error("ruc", "El RUC no es válido."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_rucs_with_valid_check_digit() {
        assert!(is_valid_ruc("20100070970"));
        assert!(is_valid_ruc("20131312955"));
        assert!(is_valid_ruc("10467793549"));
    }

    #[test]
    fn rejects_bad_rucs() {
        // dígito verificador alterado
        assert!(!is_valid_ruc("20100070971"));
        // prefijo inexistente
        assert!(!is_valid_ruc("30100070970"));
        assert!(!is_valid_ruc("2010007097"));
        assert!(!is_valid_ruc("2010007097A"));
    }

    #[test]
    fn dni_is_eight_digits() {
        assert!(is_valid_dni("45678912"));
        assert!(!is_valid_dni("4567891"));
        assert!(!is_valid_dni("4567891X"));
    }

    #[test]
    fn decimal_validators() {
        assert!(validate_positive(&Decimal::ONE).is_ok());
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_not_negative(&Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn quantities_beyond_stock_scale_are_rejected() {
        let d = |s: &str| s.parse::<Decimal>().unwrap();

        assert!(validate_quantity(&d("12.3456")).is_ok());
        assert!(validate_quantity(&d("1.50000")).is_ok());
        let err = validate_quantity(&d("0.00001")).unwrap_err();
        assert_eq!(err.code, "scale");
        assert_eq!(validate_quantity(&d("0")).unwrap_err().code, "range");

        assert!(validate_stock_count(&d("0")).is_ok());
        assert!(validate_stock_count(&d("98.7654")).is_ok());
        assert_eq!(validate_stock_count(&d("98.76543")).unwrap_err().code, "scale");
        assert_eq!(validate_stock_count(&d("-1")).unwrap_err().code, "range");

        assert!(validate_recipe_quantity(&d("0.000125")).is_ok());
        assert_eq!(
            validate_recipe_quantity(&d("0.0000001")).unwrap_err().code,
            "scale"
        );
    }
}
