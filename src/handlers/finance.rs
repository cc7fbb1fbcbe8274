// src/handlers/finance.rs

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
        rbac::{GestionVentas, RequireRole, SoloAdministrador, Supervisores},
    },
    models::{
        finance::{
            AprobarCreditoPayload, DocumentoPorCobrar, EstadoSolicitudCredito, Pago, PagoPayload,
            ResumenDeuda, SolicitudCredito, SolicitudCreditoPayload,
        },
        review::ObservacionPayload,
    },
};

// =============================================================================
//  PAGOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/ventas/{id}/pagos",
    tag = "Finanzas",
    params(("id" = i32, Path, description = "ID de la orden de venta")),
    responses((status = 200, body = Vec<Pago>)),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    Path(orden_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.finance_service.list_payments(orden_id).await?))
}

// POST /api/ventas/{id}/pagos
#[utoipa::path(
    post,
    path = "/api/ventas/{id}/pagos",
    tag = "Finanzas",
    params(("id" = i32, Path, description = "ID de la orden de venta")),
    request_body = PagoPayload,
    responses(
        (status = 201, body = Pago),
        (status = 400, description = "Orden no aprobada o monto mayor al saldo")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_payment(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionVentas>,
    Path(orden_id): Path<i32>,
    Json(payload): Json<PagoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let pago = app_state
        .finance_service
        .register_payment(orden_id, &payload, usuario.id)
        .await?;
    Ok((StatusCode::CREATED, Json(pago)))
}

#[utoipa::path(
    delete,
    path = "/api/pagos/{id}",
    tag = "Finanzas",
    params(("id" = i32, Path, description = "ID del pago")),
    responses((status = 204, description = "Pago eliminado, saldo recalculado")),
    security(("api_jwt" = []))
)]
pub async fn delete_payment(
    State(app_state): State<AppState>,
    _guard: RequireRole<SoloAdministrador>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.finance_service.delete_payment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CUENTAS POR COBRAR
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/cuentas-por-cobrar",
    tag = "Finanzas",
    responses((status = 200, body = Vec<DocumentoPorCobrar>)),
    security(("api_jwt" = []))
)]
pub async fn list_receivables(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.finance_service.list_receivables().await?))
}

#[utoipa::path(
    get,
    path = "/api/clientes/{id}/deuda",
    tag = "Finanzas",
    params(("id" = i32, Path, description = "ID del cliente")),
    responses((status = 200, body = ResumenDeuda)),
    security(("api_jwt" = []))
)]
pub async fn client_debt(
    State(app_state): State<AppState>,
    Path(cliente_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.finance_service.client_debt(cliente_id).await?))
}

// =============================================================================
//  SOLICITUDES DE CRÉDITO
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct CreditoQuery {
    pub estado: Option<EstadoSolicitudCredito>,
}

#[utoipa::path(
    get,
    path = "/api/creditos",
    tag = "Créditos",
    params(CreditoQuery),
    responses((status = 200, body = Vec<SolicitudCredito>)),
    security(("api_jwt" = []))
)]
pub async fn list_credit_requests(
    State(app_state): State<AppState>,
    Query(query): Query<CreditoQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.finance_service.list_credit_requests(query.estado).await?))
}

#[utoipa::path(
    post,
    path = "/api/creditos",
    tag = "Créditos",
    request_body = SolicitudCreditoPayload,
    responses(
        (status = 201, body = SolicitudCredito),
        (status = 409, description = "El cliente ya tiene una solicitud pendiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_credit(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionVentas>,
    Json(payload): Json<SolicitudCreditoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let solicitud = app_state.finance_service.request_credit(&payload, usuario.id).await?;
    Ok((StatusCode::CREATED, Json(solicitud)))
}

// POST /api/creditos/{id}/aprobar
// Sin cuerpo se aprueba el monto solicitado.
#[utoipa::path(
    post,
    path = "/api/creditos/{id}/aprobar",
    tag = "Créditos",
    params(("id" = i32, Path, description = "ID de la solicitud")),
    request_body = AprobarCreditoPayload,
    responses((status = 200, description = "Límite y plazo del cliente actualizados", body = SolicitudCredito)),
    security(("api_jwt" = []))
)]
pub async fn approve_credit(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
    payload: Option<Json<AprobarCreditoPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    payload.validate()?;
    let solicitud = app_state
        .finance_service
        .approve_credit(id, &payload, usuario.id)
        .await?;
    Ok(Json(solicitud))
}

#[utoipa::path(
    post,
    path = "/api/creditos/{id}/rechazar",
    tag = "Créditos",
    params(("id" = i32, Path, description = "ID de la solicitud")),
    request_body = ObservacionPayload,
    responses((status = 200, body = SolicitudCredito)),
    security(("api_jwt" = []))
)]
pub async fn reject_credit(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
    Json(payload): Json<ObservacionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let solicitud = app_state
        .finance_service
        .reject_credit(id, payload.observacion.as_deref(), usuario.id)
        .await?;
    Ok(Json(solicitud))
}
