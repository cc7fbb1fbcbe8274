// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::{
    validate_not_negative, validate_quantity, validate_recipe_quantity, validate_stock_count,
};

// --- 1. Productos ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_producto")]
pub enum TipoProducto {
    #[serde(rename = "Materia Prima")]
    #[sqlx(rename = "Materia Prima")]
    MateriaPrima,
    Insumo,
    #[serde(rename = "Producto Terminado")]
    #[sqlx(rename = "Producto Terminado")]
    ProductoTerminado,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Producto {
    pub id: i32,
    #[schema(example = "CJ-3030")]
    pub codigo: String,
    #[schema(example = "Caja de cartón corrugado 30x30x30")]
    pub nombre: String,
    pub descripcion: Option<String>,
    pub tipo: TipoProducto,
    #[schema(example = "UND")]
    pub unidad_medida: String,
    #[schema(example = "1200.0000")]
    pub stock_actual: Decimal,
    pub stock_minimo: Decimal,
    // CUP: costo unitario promedio ponderado
    #[schema(example = "1.254300")]
    pub costo_unitario_promedio: Decimal,
    pub precio_venta: Option<Decimal>,
    pub peso_unitario_kg: Option<Decimal>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Receta (BOM) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponenteReceta {
    pub producto_id: i32,
    pub insumo_id: i32,
    pub insumo_codigo: String,
    pub insumo_nombre: String,
    pub unidad_medida: String,
    #[schema(example = "0.850000")]
    pub cantidad_por_unidad: Decimal,
}

// --- 3. Movimientos (Kardex) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_movimiento")]
pub enum TipoMovimiento {
    Entrada,
    Salida,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "motivo_movimiento")]
pub enum MotivoMovimiento {
    #[serde(rename = "Inventario Inicial")]
    #[sqlx(rename = "Inventario Inicial")]
    InventarioInicial,
    Compra,
    #[serde(rename = "Consumo Producción")]
    #[sqlx(rename = "Consumo Producción")]
    ConsumoProduccion,
    #[serde(rename = "Producción")]
    #[sqlx(rename = "Producción")]
    Produccion,
    #[serde(rename = "Reversión Producción")]
    #[sqlx(rename = "Reversión Producción")]
    ReversionProduccion,
    Despacho,
    #[serde(rename = "Ajuste Positivo")]
    #[sqlx(rename = "Ajuste Positivo")]
    AjustePositivo,
    #[serde(rename = "Ajuste Negativo")]
    #[sqlx(rename = "Ajuste Negativo")]
    AjusteNegativo,
}

impl MotivoMovimiento {
    pub fn tipo(&self) -> TipoMovimiento {
        match self {
            MotivoMovimiento::ConsumoProduccion
            | MotivoMovimiento::Despacho
            | MotivoMovimiento::AjusteNegativo => TipoMovimiento::Salida,
            _ => TipoMovimiento::Entrada,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovimientoInventario {
    pub id: i32,
    pub producto_id: i32,
    pub tipo: TipoMovimiento,
    pub motivo: MotivoMovimiento,
    pub cantidad: Decimal,
    pub costo_unitario: Decimal,
    pub stock_resultante: Decimal,
    pub cup_resultante: Decimal,
    pub referencia: Option<String>,
    pub proveedor_id: Option<i32>,
    pub usuario_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

// --- 4. Ajustes de inventario ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_ajuste")]
pub enum TipoAjuste {
    Positivo,
    Negativo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "origen_ajuste")]
pub enum OrigenAjuste {
    #[serde(rename = "Conteo Físico")]
    #[sqlx(rename = "Conteo Físico")]
    ConteoFisico,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "estado_ajuste")]
pub enum EstadoAjuste {
    Pendiente,
    Aprobado,
    Rechazado,
    Aplicado,
}

impl EstadoAjuste {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoAjuste::Pendiente => "Pendiente",
            EstadoAjuste::Aprobado => "Aprobado",
            EstadoAjuste::Rechazado => "Rechazado",
            EstadoAjuste::Aplicado => "Aplicado",
        }
    }

    /// Solo un ajuste pendiente puede revisarse.
    pub fn can_transition_to(&self, next: EstadoAjuste) -> bool {
        matches!(
            (self, next),
            (EstadoAjuste::Pendiente, EstadoAjuste::Aprobado)
                | (EstadoAjuste::Pendiente, EstadoAjuste::Rechazado)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AjusteInventario {
    pub id: i32,
    pub producto_id: i32,
    pub origen: OrigenAjuste,
    pub tipo: TipoAjuste,
    pub stock_sistema: Decimal,
    pub stock_fisico: Option<Decimal>,
    pub cantidad: Decimal,
    pub costo_unitario: Option<Decimal>,
    pub motivo: String,
    pub estado: EstadoAjuste,
    pub observacion: Option<String>,
    pub solicitado_por: i32,
    pub revisado_por: Option<i32>,
    pub fecha_revision: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Kardex {
    pub producto: Producto,
    pub movimientos: Vec<MovimientoInventario>,
}

// --- 5. Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductoPayload {
    #[validate(length(min = 1, max = 30, message = "El código es obligatorio (máx. 30)."))]
    pub codigo: String,
    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub nombre: String,
    pub descripcion: Option<String>,
    pub tipo: TipoProducto,
    #[validate(length(min = 1, max = 10, message = "La unidad de medida es obligatoria."))]
    pub unidad_medida: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub stock_minimo: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub precio_venta: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub peso_unitario_kg: Option<Decimal>,

    // Si no hay stock inicial se puede omitir
    #[validate(custom(function = "validate_stock_count"))]
    #[serde(default)]
    pub stock_inicial: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub costo_inicial: Decimal,
}

/// Edición de datos maestros; stock y CUP solo cambian por movimientos.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductoPayload {
    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub nombre: String,
    pub descripcion: Option<String>,
    #[validate(length(min = 1, max = 10, message = "La unidad de medida es obligatoria."))]
    pub unidad_medida: String,
    #[validate(custom(function = "validate_not_negative"))]
    pub stock_minimo: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub precio_venta: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub peso_unitario_kg: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentePayload {
    pub insumo_id: i32,
    #[validate(custom(function = "validate_recipe_quantity"))]
    #[schema(example = "0.85")]
    pub cantidad_por_unidad: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecetaPayload {
    #[validate(nested)]
    pub componentes: Vec<ComponentePayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntradaPayload {
    pub producto_id: i32,
    pub proveedor_id: Option<i32>,
    #[validate(custom(function = "validate_quantity"))]
    pub cantidad: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub costo_unitario: Decimal,
    #[schema(example = "F001-00004521")]
    pub documento_referencia: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConteoFisicoPayload {
    pub producto_id: i32,
    #[validate(custom(function = "validate_stock_count"))]
    pub stock_fisico: Decimal,
    #[validate(length(min = 1, message = "El motivo es obligatorio."))]
    pub motivo: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AjusteManualPayload {
    pub producto_id: i32,
    pub tipo: TipoAjuste,
    #[validate(custom(function = "validate_quantity"))]
    pub cantidad: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub costo_unitario: Option<Decimal>,
    #[validate(length(min = 1, message = "El motivo es obligatorio."))]
    pub motivo: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_reasons_are_exits() {
        assert_eq!(MotivoMovimiento::Despacho.tipo(), TipoMovimiento::Salida);
        assert_eq!(MotivoMovimiento::ConsumoProduccion.tipo(), TipoMovimiento::Salida);
        assert_eq!(MotivoMovimiento::AjusteNegativo.tipo(), TipoMovimiento::Salida);
        assert_eq!(MotivoMovimiento::ReversionProduccion.tipo(), TipoMovimiento::Entrada);
        assert_eq!(MotivoMovimiento::Compra.tipo(), TipoMovimiento::Entrada);
    }

    #[test]
    fn only_pending_adjustments_can_be_reviewed() {
        assert!(EstadoAjuste::Pendiente.can_transition_to(EstadoAjuste::Aprobado));
        assert!(EstadoAjuste::Pendiente.can_transition_to(EstadoAjuste::Rechazado));
        assert!(!EstadoAjuste::Aprobado.can_transition_to(EstadoAjuste::Rechazado));
        assert!(!EstadoAjuste::Aplicado.can_transition_to(EstadoAjuste::Aprobado));
    }

    #[test]
    fn labels_serialize_with_accents() {
        let json = serde_json::to_string(&MotivoMovimiento::ReversionProduccion).unwrap();
        assert_eq!(json, "\"Reversión Producción\"");
        let tipo: TipoProducto = serde_json::from_str("\"Producto Terminado\"").unwrap();
        assert_eq!(tipo, TipoProducto::ProductoTerminado);
    }

    #[test]
    fn payload_quantities_must_fit_stock_columns() {
        let conteo: ConteoFisicoPayload = serde_json::from_str(
            r#"{"productoId":4,"stockFisico":10.12345,"motivo":"Inventario mensual"}"#,
        )
        .unwrap();
        let errors = conteo.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("stock_fisico"));

        let entrada: EntradaPayload = serde_json::from_str(
            r#"{"productoId":4,"cantidad":250.5,"costoUnitario":1.2}"#,
        )
        .unwrap();
        assert!(entrada.validate().is_ok());

        let ajuste: AjusteManualPayload = serde_json::from_str(
            r#"{"productoId":4,"tipo":"Negativo","cantidad":0.00001,"motivo":"Merma"}"#,
        )
        .unwrap();
        assert!(ajuste.validate().is_err());
    }
}
