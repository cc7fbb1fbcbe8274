// src/models/dispatch.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "estado_guia")]
pub enum EstadoGuia {
    Emitida,
    #[serde(rename = "En Tránsito")]
    #[sqlx(rename = "En Tránsito")]
    EnTransito,
    Entregada,
    Anulada,
}

impl EstadoGuia {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoGuia::Emitida => "Emitida",
            EstadoGuia::EnTransito => "En Tránsito",
            EstadoGuia::Entregada => "Entregada",
            EstadoGuia::Anulada => "Anulada",
        }
    }

    // Emitida → En Tránsito → Entregada, o Emitida → Anulada
    pub fn can_transition_to(&self, next: EstadoGuia) -> bool {
        use EstadoGuia::*;
        matches!(
            (self, next),
            (Emitida, EnTransito) | (EnTransito, Entregada) | (Emitida, Anulada)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "modalidad_transporte")]
pub enum ModalidadTransporte {
    // Vehículo y conductor propios
    Privado,
    // Empresa de transporte (transportista) con RUC
    #[serde(rename = "Público")]
    #[sqlx(rename = "Público")]
    Publico,
}

impl ModalidadTransporte {
    /// Catálogo 18 de SUNAT.
    pub fn sunat_code(&self) -> &'static str {
        match self {
            ModalidadTransporte::Publico => "01",
            ModalidadTransporte::Privado => "02",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuiaRemision {
    pub id: i32,
    #[schema(example = "T001")]
    pub serie: String,
    pub orden_venta_id: i32,
    #[schema(value_type = String, format = Date)]
    pub fecha_emision: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub fecha_traslado: NaiveDate,
    pub punto_partida: String,
    pub punto_llegada: String,
    #[schema(example = "Venta")]
    pub motivo_traslado: String,
    pub modalidad: ModalidadTransporte,
    pub vehiculo_id: Option<i32>,
    pub conductor_id: Option<i32>,
    pub transportista_ruc: Option<String>,
    pub transportista_razon_social: Option<String>,
    pub peso_bruto_kg: Option<Decimal>,
    pub estado: EstadoGuia,
    pub motivo_anulacion: Option<String>,
    pub observaciones: Option<String>,
    pub fecha_despacho: Option<DateTime<Utc>>,
    pub fecha_entrega: Option<DateTime<Utc>>,
    pub creado_por: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetalleGuia {
    pub id: i32,
    pub guia_id: i32,
    pub producto_id: i32,
    pub producto_codigo: String,
    pub producto_nombre: String,
    pub unidad_medida: String,
    pub cantidad: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuiaRemisionDetalle {
    #[serde(flatten)]
    pub guia: GuiaRemision,
    #[schema(example = "T001-00000045")]
    pub numero: String,
    pub cliente_razon_social: String,
    pub cliente_documento: String,
    pub vehiculo_placa: Option<String>,
    pub conductor_nombre: Option<String>,
    pub conductor_licencia: Option<String>,
    pub items: Vec<DetalleGuia>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuiaPayload {
    pub orden_venta_id: i32,
    #[schema(value_type = String, format = Date)]
    pub fecha_traslado: NaiveDate,
    #[validate(length(min = 1, message = "El punto de partida es obligatorio."))]
    pub punto_partida: String,
    #[validate(length(min = 1, message = "El punto de llegada es obligatorio."))]
    pub punto_llegada: String,
    pub motivo_traslado: Option<String>,
    pub modalidad: ModalidadTransporte,
    pub vehiculo_id: Option<i32>,
    pub conductor_id: Option<i32>,
    pub transportista_ruc: Option<String>,
    pub transportista_razon_social: Option<String>,
    pub observaciones: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::EstadoGuia::*;

    #[test]
    fn guide_lifecycle() {
        assert!(Emitida.can_transition_to(EnTransito));
        assert!(EnTransito.can_transition_to(Entregada));
        assert!(Emitida.can_transition_to(Anulada));
    }

    #[test]
    fn dispatched_guides_cannot_be_annulled() {
        assert!(!EnTransito.can_transition_to(Anulada));
        assert!(!Entregada.can_transition_to(Anulada));
        assert!(!Emitida.can_transition_to(Entregada));
        assert!(!Anulada.can_transition_to(Emitida));
    }
}
