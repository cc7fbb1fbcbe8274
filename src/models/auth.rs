// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Mapea el CREATE TYPE rol_usuario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "rol_usuario")]
pub enum Rol {
    Administrador,
    Gerente,
    Vendedor,
    Almacenero,
    Produccion,
}

impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Administrador => "Administrador",
            Rol::Gerente => "Gerente",
            Rol::Vendedor => "Vendedor",
            Rol::Almacenero => "Almacenero",
            Rol::Produccion => "Produccion",
        }
    }
}

// Usuario tal como viene de la base de datos
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "admin@envases.pe")]
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    #[schema(example = "Rosa Quispe")]
    pub nombre: String,
    pub rol: Rol,
    pub empleado_id: Option<i32>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Usuario {
    pub fn is_admin(&self) -> bool {
        self.rol == Rol::Administrador
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "El e-mail no es válido."))]
    #[schema(example = "admin@envases.pe")]
    pub email: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email(message = "El e-mail no es válido."))]
    pub email: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub nombre: String,
    pub rol: Rol,
    pub empleado_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub usuario: Usuario,
}

// "Claims" dentro del JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,    // ID del usuario
    pub rol: Rol,
    pub exp: usize,
    pub iat: usize,
}
