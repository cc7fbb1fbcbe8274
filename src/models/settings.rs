// src/models/settings.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguracionEmpresa {
    #[schema(ignore)] // Fila única
    #[serde(skip_serializing)]
    pub id: i32,

    #[schema(example = "20601234567")]
    pub ruc: Option<String>,

    #[schema(example = "Envases del Pacífico S.A.C.")]
    pub razon_social: Option<String>,

    pub nombre_comercial: Option<String>,

    #[schema(example = "Av. Argentina 1234, Cercado de Lima")]
    pub direccion: Option<String>,

    #[schema(example = "(01) 555-1234")]
    pub telefono: Option<String>,

    pub email: Option<String>,

    #[schema(example = "F001")]
    pub serie_factura: String,

    #[schema(example = "T001")]
    pub serie_guia: String,

    #[schema(example = "0.18")]
    pub tasa_igv: Decimal,

    #[schema(example = "BCP Soles 191-1234567-0-12")]
    pub cuenta_bancaria: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl ConfiguracionEmpresa {
    pub fn razon_social_o_default(&self) -> &str {
        self.razon_social.as_deref().unwrap_or("EMPRESA")
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfiguracionPayload {
    #[validate(length(equal = 11, message = "El RUC debe tener 11 dígitos."))]
    pub ruc: Option<String>,
    pub razon_social: Option<String>,
    pub nombre_comercial: Option<String>,
    pub direccion: Option<String>,
    pub telefono: Option<String>,
    #[validate(email(message = "El e-mail no es válido."))]
    pub email: Option<String>,
    #[validate(length(equal = 4, message = "La serie debe tener 4 caracteres."))]
    pub serie_factura: Option<String>,
    #[validate(length(equal = 4, message = "La serie debe tener 4 caracteres."))]
    pub serie_guia: Option<String>,
    #[schema(example = "0.18")]
    pub tasa_igv: Option<Decimal>,
    pub cuenta_bancaria: Option<String>,
}
