// src/handlers/adjustments.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{GestionAlmacen, RequireRole, Supervisores},
    },
    models::{
        inventory::{AjusteInventario, AjusteManualPayload, ConteoFisicoPayload, EstadoAjuste},
        review::ObservacionPayload,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct AjusteQuery {
    pub estado: Option<EstadoAjuste>,
}

#[utoipa::path(
    get,
    path = "/api/ajustes",
    tag = "Ajustes",
    params(AjusteQuery),
    responses((status = 200, body = Vec<AjusteInventario>)),
    security(("api_jwt" = []))
)]
pub async fn list_adjustments(
    State(app_state): State<AppState>,
    Query(query): Query<AjusteQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.adjustment_service.list(query.estado).await?))
}

// POST /api/ajustes/conteo-fisico
#[utoipa::path(
    post,
    path = "/api/ajustes/conteo-fisico",
    tag = "Ajustes",
    request_body = ConteoFisicoPayload,
    responses(
        (status = 201, description = "Conteo aplicado al stock", body = AjusteInventario),
        (status = 400, description = "Sin diferencia con el stock del sistema")
    ),
    security(("api_jwt" = []))
)]
pub async fn physical_count(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionAlmacen>,
    Json(payload): Json<ConteoFisicoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let ajuste = app_state
        .adjustment_service
        .physical_count(&payload, usuario.id)
        .await?;
    Ok((StatusCode::CREATED, Json(ajuste)))
}

// POST /api/ajustes
#[utoipa::path(
    post,
    path = "/api/ajustes",
    tag = "Ajustes",
    request_body = AjusteManualPayload,
    responses((status = 201, description = "Ajuste pendiente de aprobación", body = AjusteInventario)),
    security(("api_jwt" = []))
)]
pub async fn create_adjustment(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionAlmacen>,
    Json(payload): Json<AjusteManualPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let ajuste = app_state
        .adjustment_service
        .create_manual(&payload, usuario.id)
        .await?;
    Ok((StatusCode::CREATED, Json(ajuste)))
}

#[utoipa::path(
    post,
    path = "/api/ajustes/{id}/aprobar",
    tag = "Ajustes",
    params(("id" = i32, Path, description = "ID del ajuste")),
    request_body(content = ObservacionPayload, description = "Observación opcional"),
    responses(
        (status = 200, description = "Ajuste aplicado", body = AjusteInventario),
        (status = 400, description = "No está pendiente o stock insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_adjustment(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
    payload: Option<Json<ObservacionPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    let ajuste = app_state
        .adjustment_service
        .approve(id, usuario.id, payload.observacion.as_deref())
        .await?;
    Ok(Json(ajuste))
}

#[utoipa::path(
    post,
    path = "/api/ajustes/{id}/rechazar",
    tag = "Ajustes",
    params(("id" = i32, Path, description = "ID del ajuste")),
    request_body = ObservacionPayload,
    responses((status = 200, body = AjusteInventario)),
    security(("api_jwt" = []))
)]
pub async fn reject_adjustment(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
    Json(payload): Json<ObservacionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let ajuste = app_state
        .adjustment_service
        .reject(id, usuario.id, payload.observacion.as_deref())
        .await?;
    Ok(Json(ajuste))
}
