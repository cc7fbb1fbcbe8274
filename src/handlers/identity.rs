// src/handlers/identity.rs

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{common::error::AppError, config::AppState, models::identity::ConsultaIdentidad};

// GET /api/consultas/ruc/{numero}
#[utoipa::path(
    get,
    path = "/api/consultas/ruc/{numero}",
    tag = "Consultas",
    params(("numero" = String, Path, description = "RUC de 11 dígitos")),
    responses(
        (status = 200, body = ConsultaIdentidad),
        (status = 400, description = "RUC con formato inválido"),
        (status = 404, description = "RUC no registrado"),
        (status = 502, description = "Proveedor no disponible")
    ),
    security(("api_jwt" = []))
)]
pub async fn lookup_ruc(
    State(app_state): State<AppState>,
    Path(numero): Path<String>,
) -> Result<Json<ConsultaIdentidad>, AppError> {
    Ok(Json(app_state.identity_service.lookup_ruc(&numero).await?))
}

// GET /api/consultas/dni/{numero}
#[utoipa::path(
    get,
    path = "/api/consultas/dni/{numero}",
    tag = "Consultas",
    params(("numero" = String, Path, description = "DNI de 8 dígitos")),
    responses(
        (status = 200, body = ConsultaIdentidad),
        (status = 400, description = "DNI con formato inválido"),
        (status = 404, description = "DNI no encontrado"),
        (status = 502, description = "Proveedor no disponible")
    ),
    security(("api_jwt" = []))
)]
pub async fn lookup_dni(
    State(app_state): State<AppState>,
    Path(numero): Path<String>,
) -> Result<Json<ConsultaIdentidad>, AppError> {
    Ok(Json(app_state.identity_service.lookup_dni(&numero).await?))
}
