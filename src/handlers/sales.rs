// src/handlers/sales.rs

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
        rbac::{GestionVentas, RequireRole, Supervisores},
    },
    models::{
        review::MotivoPayload,
        sales::{EstadoVerificacion, OrdenVenta, OrdenVentaDetalle, OrdenVentaPayload},
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct VentaQuery {
    pub estado_verificacion: Option<EstadoVerificacion>,
}

#[utoipa::path(
    get,
    path = "/api/ventas",
    tag = "Ventas",
    params(VentaQuery),
    responses((status = 200, body = Vec<OrdenVenta>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    Query(query): Query<VentaQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.sales_service.list(query.estado_verificacion).await?))
}

#[utoipa::path(
    get,
    path = "/api/ventas/{id}",
    tag = "Ventas",
    params(("id" = i32, Path, description = "ID de la orden de venta")),
    responses((status = 200, body = OrdenVentaDetalle)),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.sales_service.get_detail(id).await?))
}

// POST /api/ventas
#[utoipa::path(
    post,
    path = "/api/ventas",
    tag = "Ventas",
    request_body = OrdenVentaPayload,
    responses(
        (status = 201, description = "Orden registrada, pendiente de verificación", body = OrdenVenta),
        (status = 400, description = "Crédito insuficiente o datos inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionVentas>,
    Json(payload): Json<OrdenVentaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let orden = app_state.sales_service.create(&payload, usuario.id).await?;
    Ok((StatusCode::CREATED, Json(orden)))
}

// PUT /api/ventas/{id}
#[utoipa::path(
    put,
    path = "/api/ventas/{id}",
    tag = "Ventas",
    params(("id" = i32, Path, description = "ID de la orden de venta")),
    request_body = OrdenVentaPayload,
    responses(
        (status = 200, description = "Orden editada y reenviada a verificación", body = OrdenVenta),
        (status = 403, description = "Solo el autor o un administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionVentas>,
    Path(id): Path<i32>,
    Json(payload): Json<OrdenVentaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(app_state.sales_service.update(id, &payload, &usuario).await?))
}

#[utoipa::path(
    post,
    path = "/api/ventas/{id}/aprobar",
    tag = "Ventas",
    params(("id" = i32, Path, description = "ID de la orden de venta")),
    responses((status = 200, body = OrdenVenta), (status = 400, description = "Transición inválida o crédito insuficiente")),
    security(("api_jwt" = []))
)]
pub async fn approve_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.sales_service.approve(id, usuario.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/ventas/{id}/rechazar",
    tag = "Ventas",
    params(("id" = i32, Path, description = "ID de la orden de venta")),
    request_body = MotivoPayload,
    responses((status = 200, body = OrdenVenta)),
    security(("api_jwt" = []))
)]
pub async fn reject_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
    Json(payload): Json<MotivoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(app_state.sales_service.reject(id, &payload.motivo, usuario.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/ventas/{id}/anular",
    tag = "Ventas",
    params(("id" = i32, Path, description = "ID de la orden de venta")),
    responses(
        (status = 200, body = OrdenVenta),
        (status = 409, description = "Tiene guía vigente o pagos")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_order(
    State(app_state): State<AppState>,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.sales_service.cancel(id).await?))
}
