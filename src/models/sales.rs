// src/models/sales.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::{validate_not_negative, validate_quantity};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "estado_verificacion")]
pub enum EstadoVerificacion {
    Pendiente,
    Aprobada,
    Rechazada,
}

impl EstadoVerificacion {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoVerificacion::Pendiente => "Pendiente",
            EstadoVerificacion::Aprobada => "Aprobada",
            EstadoVerificacion::Rechazada => "Rechazada",
        }
    }

    // Pendiente → {Aprobada, Rechazada}; Rechazada → Pendiente al reenviarse
    pub fn can_transition_to(&self, next: EstadoVerificacion) -> bool {
        use EstadoVerificacion::*;
        matches!(
            (self, next),
            (Pendiente, Aprobada) | (Pendiente, Rechazada) | (Rechazada, Pendiente)
        )
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, EstadoVerificacion::Pendiente | EstadoVerificacion::Rechazada)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "estado_orden_venta")]
pub enum EstadoOrdenVenta {
    Registrada,
    Despachada,
    Entregada,
    Anulada,
}

impl EstadoOrdenVenta {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoOrdenVenta::Registrada => "Registrada",
            EstadoOrdenVenta::Despachada => "Despachada",
            EstadoOrdenVenta::Entregada => "Entregada",
            EstadoOrdenVenta::Anulada => "Anulada",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "estado_pago")]
pub enum EstadoPago {
    Pendiente,
    Parcial,
    Pagado,
}

impl EstadoPago {
    pub fn from_amounts(total: Decimal, pagado: Decimal) -> Self {
        if pagado <= Decimal::ZERO {
            EstadoPago::Pendiente
        } else if pagado >= total {
            EstadoPago::Pagado
        } else {
            EstadoPago::Parcial
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "condicion_pago")]
pub enum CondicionPago {
    Contado,
    #[serde(rename = "Crédito")]
    #[sqlx(rename = "Crédito")]
    Credito,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdenVenta {
    pub id: i32,
    pub cliente_id: i32,
    #[schema(value_type = String, format = Date)]
    pub fecha: NaiveDate,
    pub condicion_pago: CondicionPago,
    #[schema(value_type = Option<String>, format = Date)]
    pub fecha_vencimiento: Option<NaiveDate>,
    pub direccion_entrega: Option<String>,
    pub observaciones: Option<String>,
    #[schema(example = "1000.00")]
    pub subtotal: Decimal,
    #[schema(example = "180.00")]
    pub igv: Decimal,
    #[schema(example = "1180.00")]
    pub total: Decimal,
    pub monto_pagado: Decimal,
    pub estado_verificacion: EstadoVerificacion,
    pub motivo_rechazo: Option<String>,
    pub verificado_por: Option<i32>,
    pub fecha_verificacion: Option<DateTime<Utc>>,
    pub estado: EstadoOrdenVenta,
    pub estado_pago: EstadoPago,
    pub creado_por: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrdenVenta {
    pub fn saldo(&self) -> Decimal {
        self.total - self.monto_pagado
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetalleOrdenVenta {
    pub id: i32,
    pub orden_id: i32,
    pub producto_id: i32,
    pub producto_codigo: String,
    pub producto_nombre: String,
    pub unidad_medida: String,
    pub cantidad: Decimal,
    pub precio_unitario: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdenVentaDetalle {
    #[serde(flatten)]
    pub orden: OrdenVenta,
    #[schema(example = "OV-000031")]
    pub codigo: String,
    pub cliente_razon_social: String,
    pub cliente_documento: String,
    pub items: Vec<DetalleOrdenVenta>,
}

// --- Payloads ---

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineaVentaPayload {
    pub producto_id: i32,
    #[validate(custom(function = "validate_quantity"))]
    pub cantidad: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub precio_unitario: Decimal,
}

/// Alta y edición de una orden de venta.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdenVentaPayload {
    pub cliente_id: i32,
    pub condicion_pago: CondicionPago,
    pub direccion_entrega: Option<String>,
    pub observaciones: Option<String>,
    #[validate(length(min = 1, message = "La orden debe tener al menos un ítem."))]
    #[validate(nested)]
    pub items: Vec<LineaVentaPayload>,
}

impl OrdenVentaPayload {
    pub fn lineas(&self) -> Vec<(i32, Decimal, Decimal)> {
        self.items
            .iter()
            .map(|i| (i.producto_id, i.cantidad, i.precio_unitario))
            .collect()
    }
}

// --- Totales ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineaVenta {
    pub producto_id: i32,
    pub cantidad: Decimal,
    pub precio_unitario: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalesVenta {
    pub lineas: Vec<LineaVenta>,
    pub subtotal: Decimal,
    pub igv: Decimal,
    pub total: Decimal,
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Calcula subtotales por línea, IGV y total de una orden.
pub fn compute_totals(items: &[(i32, Decimal, Decimal)], tasa_igv: Decimal) -> TotalesVenta {
    let lineas: Vec<LineaVenta> = items
        .iter()
        .map(|(producto_id, cantidad, precio)| LineaVenta {
            producto_id: *producto_id,
            cantidad: *cantidad,
            precio_unitario: *precio,
            subtotal: round_money(*cantidad * *precio),
        })
        .collect();

    let subtotal: Decimal = lineas.iter().map(|l| l.subtotal).sum();
    let igv = round_money(subtotal * tasa_igv);

    TotalesVenta {
        lineas,
        subtotal,
        igv,
        total: subtotal + igv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn totals_apply_igv_over_rounded_lines() {
        let totales = compute_totals(
            &[(1, d("100"), d("1.255")), (2, d("3"), d("10"))],
            d("0.18"),
        );

        assert_eq!(totales.lineas[0].subtotal, d("125.50"));
        assert_eq!(totales.subtotal, d("155.50"));
        assert_eq!(totales.igv, d("27.99"));
        assert_eq!(totales.total, d("183.49"));
    }

    #[test]
    fn payment_state_follows_paid_amount() {
        assert_eq!(EstadoPago::from_amounts(d("100"), d("0")), EstadoPago::Pendiente);
        assert_eq!(EstadoPago::from_amounts(d("100"), d("40")), EstadoPago::Parcial);
        assert_eq!(EstadoPago::from_amounts(d("100"), d("100")), EstadoPago::Pagado);
    }

    #[test]
    fn verification_flow() {
        use EstadoVerificacion::*;
        assert!(Pendiente.can_transition_to(Aprobada));
        assert!(Pendiente.can_transition_to(Rechazada));
        assert!(Rechazada.can_transition_to(Pendiente));
        assert!(!Rechazada.can_transition_to(Aprobada));
        assert!(!Aprobada.can_transition_to(Rechazada));
        assert!(!Aprobada.is_editable());
        assert!(Rechazada.is_editable());
    }
}
