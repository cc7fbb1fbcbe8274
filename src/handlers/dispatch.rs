// src/handlers/dispatch.rs

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
        rbac::{GestionAlmacen, RequireRole},
    },
    models::{
        dispatch::{CreateGuiaPayload, EstadoGuia, GuiaRemision, GuiaRemisionDetalle},
        review::MotivoPayload,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GuiaQuery {
    pub estado: Option<EstadoGuia>,
}

#[utoipa::path(
    get,
    path = "/api/guias",
    tag = "Guías",
    params(GuiaQuery),
    responses((status = 200, body = Vec<GuiaRemision>)),
    security(("api_jwt" = []))
)]
pub async fn list_guides(
    State(app_state): State<AppState>,
    Query(query): Query<GuiaQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.dispatch_service.list(query.estado).await?))
}

#[utoipa::path(
    get,
    path = "/api/guias/{id}",
    tag = "Guías",
    params(("id" = i32, Path, description = "ID de la guía")),
    responses((status = 200, body = GuiaRemisionDetalle)),
    security(("api_jwt" = []))
)]
pub async fn get_guide(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.dispatch_service.get_detail(id).await?))
}

// POST /api/guias
#[utoipa::path(
    post,
    path = "/api/guias",
    tag = "Guías",
    request_body = CreateGuiaPayload,
    responses(
        (status = 201, description = "Guía emitida", body = GuiaRemision),
        (status = 400, description = "Orden no aprobada o transporte inválido"),
        (status = 409, description = "La orden ya tiene una guía vigente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_guide(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionAlmacen>,
    Json(payload): Json<CreateGuiaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let guia = app_state.dispatch_service.create(&payload, usuario.id).await?;
    Ok((StatusCode::CREATED, Json(guia)))
}

// POST /api/guias/{id}/despachar
#[utoipa::path(
    post,
    path = "/api/guias/{id}/despachar",
    tag = "Guías",
    params(("id" = i32, Path, description = "ID de la guía")),
    responses(
        (status = 200, description = "Mercadería en tránsito, stock descontado", body = GuiaRemision),
        (status = 400, description = "Stock insuficiente o transición inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn dispatch_guide(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionAlmacen>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.dispatch_service.dispatch(id, usuario.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/guias/{id}/entregar",
    tag = "Guías",
    params(("id" = i32, Path, description = "ID de la guía")),
    responses((status = 200, body = GuiaRemision)),
    security(("api_jwt" = []))
)]
pub async fn deliver_guide(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionAlmacen>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.dispatch_service.deliver(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/guias/{id}/anular",
    tag = "Guías",
    params(("id" = i32, Path, description = "ID de la guía")),
    request_body = MotivoPayload,
    responses((status = 200, body = GuiaRemision)),
    security(("api_jwt" = []))
)]
pub async fn cancel_guide(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionAlmacen>,
    Path(id): Path<i32>,
    Json(payload): Json<MotivoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(app_state.dispatch_service.cancel(id, &payload.motivo).await?))
}
