// src/common/db_utils.rs

use crate::common::error::AppError;

// ---
// Traducción de errores de restricciones de Postgres
// ---
/// Convierte violaciones de UNIQUE / FOREIGN KEY en errores legibles.
/// Cualquier otro error se propaga como `DatabaseError`.
pub(crate) fn map_constraint_error(e: sqlx::Error, duplicate_message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(duplicate_message.to_string());
        }
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            return AppError::BadRequest(format!(
                "Referencia inválida ({}).",
                constraint
            ));
        }
        if db_err.is_check_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            return AppError::BadRequest(format!(
                "El registro no cumple la restricción '{}'.",
                constraint
            ));
        }
    }
    e.into()
}

/// Número de documento con prefijo de serie: `F001-00000012`.
pub fn document_number(serie: &str, numero: i32) -> String {
    format!("{}-{:08}", serie, numero)
}

/// Código correlativo interno: `OV-000031`, `OP-000007`.
pub fn internal_code(prefix: &str, id: i32) -> String {
    format!("{}-{:06}", prefix, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_document_numbers_with_eight_digits() {
        assert_eq!(document_number("F001", 12), "F001-00000012");
        assert_eq!(document_number("T001", 123456789), "T001-123456789");
    }

    #[test]
    fn formats_internal_codes_with_six_digits() {
        assert_eq!(internal_code("OV", 31), "OV-000031");
        assert_eq!(internal_code("OP", 7), "OP-000007");
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = map_constraint_error(sqlx::Error::RowNotFound, "duplicado");
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
