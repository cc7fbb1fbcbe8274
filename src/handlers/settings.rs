// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{RequireRole, SoloAdministrador},
    models::settings::{ConfiguracionEmpresa, UpdateConfiguracionPayload},
};

// GET /api/configuracion
#[utoipa::path(
    get,
    path = "/api/configuracion",
    tag = "Configuración",
    responses((status = 200, body = ConfiguracionEmpresa)),
    security(("api_jwt" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let settings = app_state.settings_service.get().await?;
    Ok((StatusCode::OK, Json(settings)))
}

// PUT /api/configuracion
#[utoipa::path(
    put,
    path = "/api/configuracion",
    tag = "Configuración",
    request_body = UpdateConfiguracionPayload,
    responses(
        (status = 200, body = ConfiguracionEmpresa),
        (status = 400, description = "RUC o tasa de IGV inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    _guard: RequireRole<SoloAdministrador>,
    Json(payload): Json<UpdateConfiguracionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let updated = app_state.settings_service.update(&payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}
