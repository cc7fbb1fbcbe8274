// src/models/directory.rs
// Registros maestros: empleados, clientes, proveedores y flota.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::{validate_dni, validate_not_negative, validate_ruc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_documento_identidad")]
pub enum TipoDocumento {
    #[serde(rename = "RUC")]
    #[sqlx(rename = "RUC")]
    Ruc,
    #[serde(rename = "DNI")]
    #[sqlx(rename = "DNI")]
    Dni,
}

impl TipoDocumento {
    /// Código del catálogo 06 de SUNAT (tipo de documento de identidad).
    pub fn sunat_code(&self) -> &'static str {
        match self {
            TipoDocumento::Ruc => "6",
            TipoDocumento::Dni => "1",
        }
    }
}

// --- EMPLEADOS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Empleado {
    pub id: i32,
    #[schema(example = "45678912")]
    pub dni: String,
    pub nombres: String,
    pub apellidos: String,
    #[schema(example = "Chofer")]
    pub cargo: String,
    pub area: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub direccion: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub fecha_ingreso: Option<NaiveDate>,
    #[schema(example = "Q45678912")]
    pub licencia_conducir: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Empleado {
    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombres, self.apellidos)
    }
}

// --- CLIENTES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    pub id: i32,
    pub tipo_documento: TipoDocumento,
    #[schema(example = "20100070970")]
    pub numero_documento: String,
    #[schema(example = "Distribuidora Andina S.A.C.")]
    pub razon_social: String,
    pub direccion: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub contacto: Option<String>,
    #[schema(example = "15000.00")]
    pub limite_credito: Decimal,
    #[schema(example = 30)]
    pub dias_credito: i32,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- PROVEEDORES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Proveedor {
    pub id: i32,
    #[schema(example = "20512345678")]
    pub ruc: String,
    pub razon_social: String,
    pub direccion: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub contacto: Option<String>,
    #[schema(example = "Cartón corrugado")]
    pub rubro: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- FLOTA ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "estado_vehiculo")]
pub enum EstadoVehiculo {
    Operativo,
    #[serde(rename = "En Mantenimiento")]
    #[sqlx(rename = "En Mantenimiento")]
    EnMantenimiento,
    #[serde(rename = "Fuera de Servicio")]
    #[sqlx(rename = "Fuera de Servicio")]
    FueraDeServicio,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehiculo {
    pub id: i32,
    #[schema(example = "ABC-123")]
    pub placa: String,
    pub marca: String,
    pub modelo: Option<String>,
    pub anio: Option<i32>,
    pub capacidad_kg: Option<Decimal>,
    // Certificado de inscripción del MTC
    pub certificado_inscripcion: Option<String>,
    pub estado: EstadoVehiculo,
    pub conductor_habitual_id: Option<i32>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// Payloads (alta y edición comparten el mismo cuerpo)
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmpleadoPayload {
    #[validate(custom(function = "validate_dni"))]
    #[schema(example = "45678912")]
    pub dni: String,
    #[validate(length(min = 1, message = "Los nombres son obligatorios."))]
    pub nombres: String,
    #[validate(length(min = 1, message = "Los apellidos son obligatorios."))]
    pub apellidos: String,
    #[validate(length(min = 1, message = "El cargo es obligatorio."))]
    pub cargo: String,
    pub area: Option<String>,
    pub telefono: Option<String>,
    #[validate(email(message = "El e-mail no es válido."))]
    pub email: Option<String>,
    pub direccion: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub fecha_ingreso: Option<NaiveDate>,
    pub licencia_conducir: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientePayload {
    pub tipo_documento: TipoDocumento,
    // El formato depende de tipo_documento; se valida en el servicio
    #[schema(example = "20100070970")]
    pub numero_documento: String,
    #[validate(length(min = 1, message = "La razón social es obligatoria."))]
    pub razon_social: String,
    pub direccion: Option<String>,
    pub telefono: Option<String>,
    #[validate(email(message = "El e-mail no es válido."))]
    pub email: Option<String>,
    pub contacto: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProveedorPayload {
    #[validate(custom(function = "validate_ruc"))]
    pub ruc: String,
    #[validate(length(min = 1, message = "La razón social es obligatoria."))]
    pub razon_social: String,
    pub direccion: Option<String>,
    pub telefono: Option<String>,
    #[validate(email(message = "El e-mail no es válido."))]
    pub email: Option<String>,
    pub contacto: Option<String>,
    pub rubro: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehiculoPayload {
    #[validate(length(min = 6, max = 10, message = "La placa no es válida."))]
    #[schema(example = "ABC-123")]
    pub placa: String,
    #[validate(length(min = 1, message = "La marca es obligatoria."))]
    pub marca: String,
    pub modelo: Option<String>,
    #[validate(range(min = 1950, max = 2100, message = "El año no es válido."))]
    pub anio: Option<i32>,
    #[validate(custom(function = "validate_not_negative"))]
    pub capacidad_kg: Option<Decimal>,
    pub certificado_inscripcion: Option<String>,
    pub estado: Option<EstadoVehiculo>,
    pub conductor_habitual_id: Option<i32>,
}
