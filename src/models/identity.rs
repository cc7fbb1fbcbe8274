// src/models/identity.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::directory::TipoDocumento;

/// Resultado normalizado de una consulta RUC (SUNAT) o DNI (RENIEC).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsultaIdentidad {
    pub tipo_documento: TipoDocumento,
    #[schema(example = "20100070970")]
    pub numero_documento: String,
    #[schema(example = "SUPERMERCADOS PERUANOS SOCIEDAD ANONIMA")]
    pub nombre: String,
    pub direccion: Option<String>,
    #[schema(example = "ACTIVO")]
    pub estado: Option<String>,
    #[schema(example = "HABIDO")]
    pub condicion: Option<String>,
}

// Respuestas del proveedor (apis.net.pe v2)

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RucResponse {
    pub razon_social: String,
    pub numero_documento: Option<String>,
    pub direccion: Option<String>,
    pub estado: Option<String>,
    pub condicion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DniResponse {
    pub nombres: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub numero_documento: Option<String>,
}

impl DniResponse {
    pub fn nombre_completo(&self) -> String {
        format!(
            "{} {} {}",
            self.nombres.trim(),
            self.apellido_paterno.trim(),
            self.apellido_materno.trim()
        )
    }
}
