// src/models/finance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::validate_positive;
use crate::models::sales::{CondicionPago, EstadoPago};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "metodo_pago")]
pub enum MetodoPago {
    Efectivo,
    Transferencia,
    #[serde(rename = "Depósito")]
    #[sqlx(rename = "Depósito")]
    Deposito,
    Yape,
    Cheque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "estado_solicitud_credito")]
pub enum EstadoSolicitudCredito {
    Pendiente,
    Aprobada,
    Rechazada,
}

impl EstadoSolicitudCredito {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoSolicitudCredito::Pendiente => "Pendiente",
            EstadoSolicitudCredito::Aprobada => "Aprobada",
            EstadoSolicitudCredito::Rechazada => "Rechazada",
        }
    }
}

// --- Pagos ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pago {
    pub id: i32,
    pub orden_id: i32,
    #[schema(example = "500.00")]
    pub monto: Decimal,
    pub metodo: MetodoPago,
    #[schema(value_type = String, format = Date)]
    pub fecha_pago: NaiveDate,
    #[schema(example = "OP-778812")]
    pub numero_operacion: Option<String>,
    pub observaciones: Option<String>,
    pub registrado_por: i32,
    pub created_at: DateTime<Utc>,
}

// --- Cuentas por cobrar ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentoPorCobrar {
    pub orden_id: i32,
    pub cliente_id: i32,
    pub cliente_razon_social: String,
    #[schema(value_type = String, format = Date)]
    pub fecha: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub fecha_vencimiento: Option<NaiveDate>,
    pub condicion_pago: CondicionPago,
    pub total: Decimal,
    pub monto_pagado: Decimal,
    pub saldo: Decimal,
    pub estado_pago: EstadoPago,
    // Días transcurridos desde el vencimiento (0 si aún no vence)
    pub dias_vencido: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumenDeuda {
    pub cliente_id: i32,
    pub cliente_razon_social: String,
    pub cliente_documento: String,
    pub limite_credito: Decimal,
    pub deuda_total: Decimal,
    pub deuda_vencida: Decimal,
    pub credito_disponible: Decimal,
    pub documentos: Vec<DocumentoPorCobrar>,
}

impl ResumenDeuda {
    pub fn from_documents(
        cliente_id: i32,
        cliente_razon_social: String,
        cliente_documento: String,
        limite_credito: Decimal,
        documentos: Vec<DocumentoPorCobrar>,
    ) -> Self {
        let deuda_total: Decimal = documentos.iter().map(|d| d.saldo).sum();
        let deuda_vencida: Decimal = documentos
            .iter()
            .filter(|d| d.dias_vencido > 0)
            .map(|d| d.saldo)
            .sum();

        Self {
            cliente_id,
            cliente_razon_social,
            cliente_documento,
            limite_credito,
            deuda_total,
            deuda_vencida,
            credito_disponible: (limite_credito - deuda_total).max(Decimal::ZERO),
            documentos,
        }
    }
}

// --- Solicitudes de crédito ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolicitudCredito {
    pub id: i32,
    pub cliente_id: i32,
    #[schema(example = "20000.00")]
    pub monto_solicitado: Decimal,
    #[schema(example = 30)]
    pub plazo_dias: i32,
    pub motivo: Option<String>,
    pub estado: EstadoSolicitudCredito,
    pub monto_aprobado: Option<Decimal>,
    pub observacion: Option<String>,
    pub solicitado_por: i32,
    pub revisado_por: Option<i32>,
    pub fecha_revision: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagoPayload {
    #[validate(custom(function = "validate_positive"))]
    pub monto: Decimal,
    pub metodo: MetodoPago,
    #[schema(value_type = Option<String>, format = Date)]
    pub fecha_pago: Option<NaiveDate>,
    pub numero_operacion: Option<String>,
    pub observaciones: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolicitudCreditoPayload {
    pub cliente_id: i32,
    #[validate(custom(function = "validate_positive"))]
    pub monto_solicitado: Decimal,
    #[validate(range(min = 1, max = 180, message = "El plazo debe estar entre 1 y 180 días."))]
    pub plazo_dias: i32,
    pub motivo: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AprobarCreditoPayload {
    // Si se omite se aprueba el monto solicitado
    #[validate(custom(function = "validate_positive"))]
    pub monto_aprobado: Option<Decimal>,
    pub observacion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documento(saldo: i64, dias_vencido: i32) -> DocumentoPorCobrar {
        DocumentoPorCobrar {
            orden_id: 1,
            cliente_id: 1,
            cliente_razon_social: "Cliente".into(),
            fecha: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            fecha_vencimiento: None,
            condicion_pago: CondicionPago::Credito,
            total: Decimal::from(saldo),
            monto_pagado: Decimal::ZERO,
            saldo: Decimal::from(saldo),
            estado_pago: EstadoPago::Pendiente,
            dias_vencido,
        }
    }

    #[test]
    fn summary_adds_up_debt_and_overdue() {
        let resumen = ResumenDeuda::from_documents(
            1,
            "Cliente".into(),
            "20100070970".into(),
            Decimal::from(1000),
            vec![documento(300, 0), documento(200, 15)],
        );

        assert_eq!(resumen.deuda_total, Decimal::from(500));
        assert_eq!(resumen.deuda_vencida, Decimal::from(200));
        assert_eq!(resumen.credito_disponible, Decimal::from(500));
    }

    #[test]
    fn available_credit_never_goes_negative() {
        let resumen = ResumenDeuda::from_documents(
            1,
            "Cliente".into(),
            "20100070970".into(),
            Decimal::from(100),
            vec![documento(300, 0)],
        );

        assert_eq!(resumen.credito_disponible, Decimal::ZERO);
    }
}
