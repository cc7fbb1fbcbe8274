// src/handlers/production.rs

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
        rbac::{GestionProduccion, RequireRole},
    },
    models::{
        production::{
            CreateProduccionPayload, EstadoProduccion, FinalizarProduccionPayload, OrdenProduccion,
            OrdenProduccionDetalle,
        },
        review::MotivoPayload,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProduccionQuery {
    pub estado: Option<EstadoProduccion>,
}

#[utoipa::path(
    get,
    path = "/api/produccion",
    tag = "Producción",
    params(ProduccionQuery),
    responses((status = 200, body = Vec<OrdenProduccion>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    Query(query): Query<ProduccionQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.production_service.list(query.estado).await?))
}

#[utoipa::path(
    get,
    path = "/api/produccion/{id}",
    tag = "Producción",
    params(("id" = i32, Path, description = "ID de la orden de producción")),
    responses((status = 200, body = OrdenProduccionDetalle)),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.production_service.get_detail(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/produccion",
    tag = "Producción",
    request_body = CreateProduccionPayload,
    responses(
        (status = 201, body = OrdenProduccion),
        (status = 400, description = "Producto sin receta o no es producto terminado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionProduccion>,
    Json(payload): Json<CreateProduccionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let orden = app_state.production_service.create(&payload, usuario.id).await?;
    Ok((StatusCode::CREATED, Json(orden)))
}

// POST /api/produccion/{id}/iniciar
#[utoipa::path(
    post,
    path = "/api/produccion/{id}/iniciar",
    tag = "Producción",
    params(("id" = i32, Path, description = "ID de la orden de producción")),
    responses(
        (status = 200, description = "Materiales consumidos, orden en curso", body = OrdenProduccion),
        (status = 400, description = "Stock insuficiente o transición inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionProduccion>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.production_service.start(id, usuario.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/produccion/{id}/pausar",
    tag = "Producción",
    params(("id" = i32, Path, description = "ID de la orden de producción")),
    responses((status = 200, body = OrdenProduccion)),
    security(("api_jwt" = []))
)]
pub async fn pause_order(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionProduccion>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.production_service.pause(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/produccion/{id}/reanudar",
    tag = "Producción",
    params(("id" = i32, Path, description = "ID de la orden de producción")),
    responses((status = 200, body = OrdenProduccion)),
    security(("api_jwt" = []))
)]
pub async fn resume_order(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionProduccion>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.production_service.resume(id).await?))
}

// POST /api/produccion/{id}/finalizar
#[utoipa::path(
    post,
    path = "/api/produccion/{id}/finalizar",
    tag = "Producción",
    params(("id" = i32, Path, description = "ID de la orden de producción")),
    request_body = FinalizarProduccionPayload,
    responses((status = 200, description = "Producto terminado ingresado al almacén", body = OrdenProduccion)),
    security(("api_jwt" = []))
)]
pub async fn finish_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionProduccion>,
    Path(id): Path<i32>,
    Json(payload): Json<FinalizarProduccionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let orden = app_state
        .production_service
        .finish(id, payload.cantidad_producida, usuario.id)
        .await?;
    Ok(Json(orden))
}

#[utoipa::path(
    post,
    path = "/api/produccion/{id}/cancelar",
    tag = "Producción",
    params(("id" = i32, Path, description = "ID de la orden de producción")),
    request_body = MotivoPayload,
    responses((status = 200, description = "Orden cancelada, materiales devueltos", body = OrdenProduccion)),
    security(("api_jwt" = []))
)]
pub async fn cancel_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionProduccion>,
    Path(id): Path<i32>,
    Json(payload): Json<MotivoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let orden = app_state
        .production_service
        .cancel(id, &payload.motivo, usuario.id)
        .await?;
    Ok(Json(orden))
}
