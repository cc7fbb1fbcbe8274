// src/handlers/directory.rs
// Registros maestros: empleados, clientes, proveedores y flota.

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
    middleware::rbac::{GestionAlmacen, GestionVentas, RequireRole, Supervisores},
    models::directory::{
        Cliente, ClientePayload, Empleado, EmpleadoPayload, Proveedor, ProveedorPayload, Vehiculo,
        VehiculoPayload,
    },
};

// =============================================================================
//  EMPLEADOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/empleados",
    tag = "Empleados",
    responses((status = 200, body = Vec<Empleado>)),
    security(("api_jwt" = []))
)]
pub async fn list_employees(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.directory_service.list_employees().await?))
}

#[utoipa::path(
    get,
    path = "/api/empleados/{id}",
    tag = "Empleados",
    params(("id" = i32, Path, description = "ID del empleado")),
    responses((status = 200, body = Empleado), (status = 404, description = "No existe")),
    security(("api_jwt" = []))
)]
pub async fn get_employee(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.directory_service.get_employee(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/empleados",
    tag = "Empleados",
    request_body = EmpleadoPayload,
    responses((status = 201, body = Empleado), (status = 409, description = "DNI duplicado")),
    security(("api_jwt" = []))
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    _guard: RequireRole<Supervisores>,
    Json(payload): Json<EmpleadoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let empleado = app_state.directory_service.create_employee(&payload).await?;
    Ok((StatusCode::CREATED, Json(empleado)))
}

#[utoipa::path(
    put,
    path = "/api/empleados/{id}",
    tag = "Empleados",
    params(("id" = i32, Path, description = "ID del empleado")),
    request_body = EmpleadoPayload,
    responses((status = 200, body = Empleado)),
    security(("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
    Json(payload): Json<EmpleadoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(app_state.directory_service.update_employee(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/empleados/{id}",
    tag = "Empleados",
    params(("id" = i32, Path, description = "ID del empleado")),
    responses((status = 204, description = "Empleado dado de baja")),
    security(("api_jwt" = []))
)]
pub async fn delete_employee(
    State(app_state): State<AppState>,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.directory_service.delete_employee(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CLIENTES
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClienteQuery {
    /// Busca por razón social o número de documento
    pub q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/clientes",
    tag = "Clientes",
    params(ClienteQuery),
    responses((status = 200, body = Vec<Cliente>)),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    Query(query): Query<ClienteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let clientes = app_state
        .directory_service
        .list_clients(query.q.as_deref().filter(|q| !q.trim().is_empty()))
        .await?;
    Ok(Json(clientes))
}

#[utoipa::path(
    get,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("id" = i32, Path, description = "ID del cliente")),
    responses((status = 200, body = Cliente), (status = 404, description = "No existe")),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.directory_service.get_client(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/clientes",
    tag = "Clientes",
    request_body = ClientePayload,
    responses(
        (status = 201, body = Cliente),
        (status = 400, description = "Documento inválido"),
        (status = 409, description = "Documento duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionVentas>,
    Json(payload): Json<ClientePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let cliente = app_state.directory_service.create_client(&payload).await?;
    Ok((StatusCode::CREATED, Json(cliente)))
}

#[utoipa::path(
    put,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("id" = i32, Path, description = "ID del cliente")),
    request_body = ClientePayload,
    responses((status = 200, body = Cliente)),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionVentas>,
    Path(id): Path<i32>,
    Json(payload): Json<ClientePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(app_state.directory_service.update_client(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/clientes/{id}",
    tag = "Clientes",
    params(("id" = i32, Path, description = "ID del cliente")),
    responses((status = 204, description = "Cliente dado de baja")),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.directory_service.delete_client(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  PROVEEDORES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/proveedores",
    tag = "Proveedores",
    responses((status = 200, body = Vec<Proveedor>)),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.directory_service.list_suppliers().await?))
}

#[utoipa::path(
    get,
    path = "/api/proveedores/{id}",
    tag = "Proveedores",
    params(("id" = i32, Path, description = "ID del proveedor")),
    responses((status = 200, body = Proveedor)),
    security(("api_jwt" = []))
)]
pub async fn get_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.directory_service.get_supplier(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/proveedores",
    tag = "Proveedores",
    request_body = ProveedorPayload,
    responses((status = 201, body = Proveedor), (status = 409, description = "RUC duplicado")),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionAlmacen>,
    Json(payload): Json<ProveedorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let proveedor = app_state.directory_service.create_supplier(&payload).await?;
    Ok((StatusCode::CREATED, Json(proveedor)))
}

#[utoipa::path(
    put,
    path = "/api/proveedores/{id}",
    tag = "Proveedores",
    params(("id" = i32, Path, description = "ID del proveedor")),
    request_body = ProveedorPayload,
    responses((status = 200, body = Proveedor)),
    security(("api_jwt" = []))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionAlmacen>,
    Path(id): Path<i32>,
    Json(payload): Json<ProveedorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(app_state.directory_service.update_supplier(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/proveedores/{id}",
    tag = "Proveedores",
    params(("id" = i32, Path, description = "ID del proveedor")),
    responses((status = 204, description = "Proveedor dado de baja")),
    security(("api_jwt" = []))
)]
pub async fn delete_supplier(
    State(app_state): State<AppState>,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.directory_service.delete_supplier(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  FLOTA
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/flota",
    tag = "Flota",
    responses((status = 200, body = Vec<Vehiculo>)),
    security(("api_jwt" = []))
)]
pub async fn list_vehicles(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.directory_service.list_vehicles().await?))
}

#[utoipa::path(
    get,
    path = "/api/flota/{id}",
    tag = "Flota",
    params(("id" = i32, Path, description = "ID del vehículo")),
    responses((status = 200, body = Vehiculo)),
    security(("api_jwt" = []))
)]
pub async fn get_vehicle(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.directory_service.get_vehicle(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/flota",
    tag = "Flota",
    request_body = VehiculoPayload,
    responses((status = 201, body = Vehiculo), (status = 409, description = "Placa duplicada")),
    security(("api_jwt" = []))
)]
pub async fn create_vehicle(
    State(app_state): State<AppState>,
    _guard: RequireRole<Supervisores>,
    Json(payload): Json<VehiculoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let vehiculo = app_state.directory_service.create_vehicle(&payload).await?;
    Ok((StatusCode::CREATED, Json(vehiculo)))
}

#[utoipa::path(
    put,
    path = "/api/flota/{id}",
    tag = "Flota",
    params(("id" = i32, Path, description = "ID del vehículo")),
    request_body = VehiculoPayload,
    responses((status = 200, body = Vehiculo)),
    security(("api_jwt" = []))
)]
pub async fn update_vehicle(
    State(app_state): State<AppState>,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
    Json(payload): Json<VehiculoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(app_state.directory_service.update_vehicle(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/flota/{id}",
    tag = "Flota",
    params(("id" = i32, Path, description = "ID del vehículo")),
    responses((status = 204, description = "Vehículo dado de baja")),
    security(("api_jwt" = []))
)]
pub async fn delete_vehicle(
    State(app_state): State<AppState>,
    _guard: RequireRole<Supervisores>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.directory_service.delete_vehicle(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
