// src/models/production.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::validate_quantity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "estado_produccion")]
pub enum EstadoProduccion {
    Pendiente,
    #[serde(rename = "En Curso")]
    #[sqlx(rename = "En Curso")]
    EnCurso,
    #[serde(rename = "En Pausa")]
    #[sqlx(rename = "En Pausa")]
    EnPausa,
    Finalizada,
    Cancelada,
}

impl EstadoProduccion {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoProduccion::Pendiente => "Pendiente",
            EstadoProduccion::EnCurso => "En Curso",
            EstadoProduccion::EnPausa => "En Pausa",
            EstadoProduccion::Finalizada => "Finalizada",
            EstadoProduccion::Cancelada => "Cancelada",
        }
    }

    // Pendiente → En Curso → {En Pausa ⇄ En Curso} → Finalizada; cualquier estado abierto → Cancelada
    pub fn can_transition_to(&self, next: EstadoProduccion) -> bool {
        use EstadoProduccion::*;
        matches!(
            (self, next),
            (Pendiente, EnCurso)
                | (EnCurso, EnPausa)
                | (EnPausa, EnCurso)
                | (EnCurso, Finalizada)
                | (Pendiente, Cancelada)
                | (EnCurso, Cancelada)
                | (EnPausa, Cancelada)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdenProduccion {
    pub id: i32,
    pub producto_id: i32,
    #[schema(example = "500.0000")]
    pub cantidad_planificada: Decimal,
    pub cantidad_producida: Option<Decimal>,
    pub estado: EstadoProduccion,
    pub costo_materiales: Decimal,
    pub costo_unitario_resultado: Option<Decimal>,
    pub responsable_id: Option<i32>,
    pub observaciones: Option<String>,
    pub motivo_cancelacion: Option<String>,
    pub creado_por: i32,
    pub fecha_inicio: Option<DateTime<Utc>>,
    pub fecha_fin: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumoProduccion {
    pub id: i32,
    pub orden_id: i32,
    pub insumo_id: i32,
    pub insumo_nombre: String,
    pub cantidad: Decimal,
    pub costo_unitario: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdenProduccionDetalle {
    #[serde(flatten)]
    pub orden: OrdenProduccion,
    #[schema(example = "OP-000007")]
    pub codigo: String,
    pub producto_nombre: String,
    pub consumos: Vec<ConsumoProduccion>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduccionPayload {
    pub producto_id: i32,
    #[validate(custom(function = "validate_quantity"))]
    pub cantidad_planificada: Decimal,
    pub responsable_id: Option<i32>,
    pub observaciones: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizarProduccionPayload {
    #[validate(custom(function = "validate_quantity"))]
    #[schema(example = "480")]
    pub cantidad_producida: Decimal,
}

#[cfg(test)]
mod tests {
    use super::EstadoProduccion::*;

    #[test]
    fn follows_the_production_lifecycle() {
        assert!(Pendiente.can_transition_to(EnCurso));
        assert!(EnCurso.can_transition_to(EnPausa));
        assert!(EnPausa.can_transition_to(EnCurso));
        assert!(EnCurso.can_transition_to(Finalizada));
    }

    #[test]
    fn cannot_finish_from_pause_or_pending() {
        assert!(!EnPausa.can_transition_to(Finalizada));
        assert!(!Pendiente.can_transition_to(Finalizada));
        assert!(!Pendiente.can_transition_to(EnPausa));
    }

    #[test]
    fn closed_orders_are_terminal() {
        for next in [Pendiente, EnCurso, EnPausa, Finalizada, Cancelada] {
            assert!(!Finalizada.can_transition_to(next));
            assert!(!Cancelada.can_transition_to(next));
        }
    }

    #[test]
    fn open_orders_can_be_cancelled() {
        assert!(Pendiente.can_transition_to(Cancelada));
        assert!(EnCurso.can_transition_to(Cancelada));
        assert!(EnPausa.can_transition_to(Cancelada));
    }
}
