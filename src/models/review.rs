// src/models/review.rs
// Cuerpos comunes para rechazar, anular o aprobar documentos.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MotivoPayload {
    #[validate(length(min = 3, message = "Indique el motivo."))]
    #[schema(example = "Precio desactualizado")]
    pub motivo: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ObservacionPayload {
    pub observacion: Option<String>,
}
