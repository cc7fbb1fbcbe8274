// src/services/fixtures.rs

//! Datos semilla y servicios armados sobre el pool de `#[sqlx::test]`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    db::{
        AdjustmentRepository, DirectoryRepository, DispatchRepository, InventoryRepository,
        ProductionRepository, SalesRepository, SettingsRepository,
    },
    models::{
        auth::{Rol, Usuario},
        dispatch::{CreateGuiaPayload, ModalidadTransporte},
        inventory::{MovimientoInventario, Producto, TipoProducto},
        sales::{CondicionPago, LineaVentaPayload, OrdenVentaPayload},
    },
    services::{
        adjustment_service::AdjustmentService, dispatch_service::DispatchService,
        inventory_service::InventoryService, production_service::ProductionService,
        sales_service::SalesService,
    },
};

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

// ---
// Servicios
// ---

pub fn inventory(pool: &PgPool) -> InventoryService {
    InventoryService::new(InventoryRepository::new(pool.clone()), pool.clone())
}

pub fn adjustments(pool: &PgPool) -> AdjustmentService {
    AdjustmentService::new(AdjustmentRepository::new(pool.clone()), inventory(pool), pool.clone())
}

pub fn production(pool: &PgPool) -> ProductionService {
    ProductionService::new(ProductionRepository::new(pool.clone()), inventory(pool), pool.clone())
}

pub fn sales(pool: &PgPool) -> SalesService {
    SalesService::new(
        SalesRepository::new(pool.clone()),
        DirectoryRepository::new(pool.clone()),
        SettingsRepository::new(pool.clone()),
        inventory(pool),
        pool.clone(),
    )
}

pub fn dispatch(pool: &PgPool) -> DispatchService {
    DispatchService::new(
        DispatchRepository::new(pool.clone()),
        SalesRepository::new(pool.clone()),
        DirectoryRepository::new(pool.clone()),
        SettingsRepository::new(pool.clone()),
        inventory(pool),
        pool.clone(),
    )
}

// ---
// Filas semilla
// ---

pub async fn usuario(pool: &PgPool, email: &str, rol: Rol) -> Usuario {
    sqlx::query_as::<_, Usuario>(
        r#"
        INSERT INTO usuarios (email, password_hash, nombre, rol)
        VALUES ($1, 'sin-hash', $1, $2)
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(rol)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Producto con stock y CUP de partida, sin movimientos en su kardex.
pub async fn producto(
    pool: &PgPool,
    codigo: &str,
    tipo: TipoProducto,
    stock: &str,
    cup: &str,
) -> Producto {
    sqlx::query_as::<_, Producto>(
        r#"
        INSERT INTO productos
            (codigo, nombre, tipo, unidad_medida, stock_actual, costo_unitario_promedio,
             precio_venta, peso_unitario_kg)
        VALUES ($1, $1, $2, 'UND', $3, $4, 2.50, 0.25)
        RETURNING *
        "#,
    )
    .bind(codigo)
    .bind(tipo)
    .bind(dec(stock))
    .bind(dec(cup))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn receta(pool: &PgPool, producto_id: i32, insumo_id: i32, por_unidad: &str) {
    sqlx::query(
        "INSERT INTO recetas (producto_id, insumo_id, cantidad_por_unidad) VALUES ($1, $2, $3)",
    )
    .bind(producto_id)
    .bind(insumo_id)
    .bind(dec(por_unidad))
    .execute(pool)
    .await
    .unwrap();
}

pub async fn cliente(pool: &PgPool) -> i32 {
    sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO clientes (tipo_documento, numero_documento, razon_social, limite_credito, dias_credito)
        VALUES ('RUC', '20131312955', 'Distribuidora Andina S.A.C.', 5000, 30)
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn releer(pool: &PgPool, producto_id: i32) -> Producto {
    sqlx::query_as::<_, Producto>("SELECT * FROM productos WHERE id = $1")
        .bind(producto_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn movimientos(pool: &PgPool, producto_id: i32) -> Vec<MovimientoInventario> {
    sqlx::query_as::<_, MovimientoInventario>(
        "SELECT * FROM movimientos_inventario WHERE producto_id = $1 ORDER BY id",
    )
    .bind(producto_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

// ---
// Payloads
// ---

pub fn orden_contado(cliente_id: i32, producto_id: i32, cantidad: &str) -> OrdenVentaPayload {
    OrdenVentaPayload {
        cliente_id,
        condicion_pago: CondicionPago::Contado,
        direccion_entrega: Some("Av. Argentina 1234, Lima".into()),
        observaciones: None,
        items: vec![LineaVentaPayload {
            producto_id,
            cantidad: dec(cantidad),
            precio_unitario: dec("2.50"),
        }],
    }
}

pub fn guia_publica(orden_venta_id: i32) -> CreateGuiaPayload {
    CreateGuiaPayload {
        orden_venta_id,
        fecha_traslado: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        punto_partida: "Av. Argentina 1234, Lima".into(),
        punto_llegada: "Jr. Ucayali 55, Callao".into(),
        motivo_traslado: None,
        modalidad: ModalidadTransporte::Publico,
        vehiculo_id: None,
        conductor_id: None,
        transportista_ruc: Some("20100070970".into()),
        transportista_razon_social: Some("Transportes del Sur S.A.".into()),
        observaciones: None,
    }
}
