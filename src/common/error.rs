// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de validación")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} no encontrado")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    #[error("Stock insuficiente de {producto}: disponible {disponible}, requerido {requerido}")]
    InsufficientStock {
        producto: String,
        disponible: Decimal,
        requerido: Decimal,
    },

    #[error("{entidad}: no se puede pasar de '{desde}' a '{hacia}'")]
    InvalidTransition {
        entidad: &'static str,
        desde: String,
        hacia: String,
    },

    #[error("Servicio externo no disponible: {0}")]
    ExternalService(String),

    #[error("Error al generar el documento: {0}")]
    PdfError(String),

    #[error("Error de base de datos: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Error interno del servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Error de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Error de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        AppError::NotFound(entity.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::InsufficientStock { .. }
            | AppError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::DatabaseError(sqlx::Error::RowNotFound) => {
                StatusCode::NOT_FOUND
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            // Devolvemos los mensajes de cada campo inválido
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Uno o más campos son inválidos.",
                    "detalle": details,
                })
            }
            AppError::DatabaseError(sqlx::Error::RowNotFound) => {
                json!({ "error": "Registro no encontrado." })
            }
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Error interno del servidor: {}", e);
                json!({
                    "error": "Ocurrió un error inesperado.",
                    "detalle": e.to_string(),
                })
            }
            e => json!({ "error": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn insufficient_stock_is_a_bad_request_with_message() {
        let (status, body) = body_json(AppError::InsufficientStock {
            producto: "Caja 30x30".into(),
            disponible: Decimal::new(5, 0),
            requerido: Decimal::new(8, 0),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Stock insuficiente de Caja 30x30: disponible 5, requerido 8"
        );
    }

    #[tokio::test]
    async fn row_not_found_maps_to_404() {
        let (status, _) = body_json(AppError::DatabaseError(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_errors_surface_the_underlying_message() {
        let (status, body) =
            body_json(AppError::InternalServerError(anyhow::anyhow!("disco lleno"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Ocurrió un error inesperado.");
        assert!(body["detalle"].as_str().unwrap().contains("disco lleno"));
    }

    #[tokio::test]
    async fn validation_errors_list_field_messages() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("length");
        err.message = Some("El nombre es obligatorio.".into());
        errors.add("nombre", err);

        let (status, body) = body_json(AppError::ValidationError(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detalle"]["nombre"][0], "El nombre es obligatorio.");
    }

    #[test]
    fn external_service_maps_to_bad_gateway() {
        assert_eq!(
            AppError::ExternalService("timeout".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }
}
