// src/handlers/inventory.rs

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
        rbac::{GestionAlmacen, GestionProduccion, RequireRole},
    },
    models::inventory::{
        ComponenteReceta, CreateProductoPayload, EntradaPayload, Kardex, MovimientoInventario,
        Producto, RecetaPayload, UpdateProductoPayload,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductoQuery {
    /// Incluye los productos dados de baja
    #[serde(default)]
    pub incluir_inactivos: bool,
}

// GET /api/productos
#[utoipa::path(
    get,
    path = "/api/productos",
    tag = "Inventario",
    params(ProductoQuery),
    responses((status = 200, body = Vec<Producto>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(query): Query<ProductoQuery>,
) -> Result<impl IntoResponse, AppError> {
    let productos = app_state
        .inventory_service
        .list_products(query.incluir_inactivos)
        .await?;
    Ok(Json(productos))
}

// GET /api/productos/stock-bajo
#[utoipa::path(
    get,
    path = "/api/productos/stock-bajo",
    tag = "Inventario",
    responses((status = 200, description = "Productos en o bajo el stock mínimo", body = Vec<Producto>)),
    security(("api_jwt" = []))
)]
pub async fn list_low_stock(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.inventory_service.list_low_stock().await?))
}

#[utoipa::path(
    get,
    path = "/api/productos/{id}",
    tag = "Inventario",
    params(("id" = i32, Path, description = "ID del producto")),
    responses((status = 200, body = Producto), (status = 404, description = "No existe")),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.inventory_service.get_product(id).await?))
}

// POST /api/productos
#[utoipa::path(
    post,
    path = "/api/productos",
    tag = "Inventario",
    request_body = CreateProductoPayload,
    responses(
        (status = 201, description = "Producto creado (con inventario inicial si corresponde)", body = Producto),
        (status = 409, description = "Código duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionAlmacen>,
    Json(payload): Json<CreateProductoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let producto = app_state
        .inventory_service
        .create_product(&payload, usuario.id)
        .await?;

    Ok((StatusCode::CREATED, Json(producto)))
}

#[utoipa::path(
    put,
    path = "/api/productos/{id}",
    tag = "Inventario",
    params(("id" = i32, Path, description = "ID del producto")),
    request_body = UpdateProductoPayload,
    responses((status = 200, body = Producto)),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionAlmacen>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(app_state.inventory_service.update_product(id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/productos/{id}",
    tag = "Inventario",
    params(("id" = i32, Path, description = "ID del producto")),
    responses((status = 204, description = "Producto dado de baja")),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionAlmacen>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.inventory_service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/productos/{id}/kardex
#[utoipa::path(
    get,
    path = "/api/productos/{id}/kardex",
    tag = "Inventario",
    params(("id" = i32, Path, description = "ID del producto")),
    responses((status = 200, body = Kardex)),
    security(("api_jwt" = []))
)]
pub async fn get_kardex(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.inventory_service.kardex(id).await?))
}

// ---
// Recetas (BOM)
// ---

#[utoipa::path(
    get,
    path = "/api/productos/{id}/receta",
    tag = "Inventario",
    params(("id" = i32, Path, description = "ID del producto terminado")),
    responses((status = 200, body = Vec<ComponenteReceta>)),
    security(("api_jwt" = []))
)]
pub async fn get_recipe(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(app_state.inventory_service.get_recipe(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/productos/{id}/receta",
    tag = "Inventario",
    params(("id" = i32, Path, description = "ID del producto terminado")),
    request_body = RecetaPayload,
    responses(
        (status = 200, description = "Receta reemplazada", body = Vec<ComponenteReceta>),
        (status = 400, description = "Componentes inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_recipe(
    State(app_state): State<AppState>,
    _guard: RequireRole<GestionProduccion>,
    Path(id): Path<i32>,
    Json(payload): Json<RecetaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(app_state.inventory_service.set_recipe(id, &payload.componentes).await?))
}

// POST /api/inventario/entradas
#[utoipa::path(
    post,
    path = "/api/inventario/entradas",
    tag = "Inventario",
    request_body = EntradaPayload,
    responses((status = 201, description = "Entrada por compra registrada", body = MovimientoInventario)),
    security(("api_jwt" = []))
)]
pub async fn register_entry(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
    _guard: RequireRole<GestionAlmacen>,
    Json(payload): Json<EntradaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let movimiento = app_state
        .inventory_service
        .register_entry(&payload, usuario.id)
        .await?;

    Ok((StatusCode::CREATED, Json(movimiento)))
}
