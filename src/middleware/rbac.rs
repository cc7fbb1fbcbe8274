// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{common::error::AppError, models::auth::{Rol, Usuario}};

/// Conjunto de roles autorizados para una ruta.
pub trait RoleSet: Send + Sync + 'static {
    fn roles() -> &'static [Rol];
}

/// Guardián: rechaza con 403 si el rol del usuario no está en `T`.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let usuario = parts
            .extensions
            .get::<Usuario>()
            .ok_or(AppError::InvalidToken)?;

        if !T::roles().contains(&usuario.rol) {
            return Err(AppError::Forbidden(format!(
                "El rol {} no tiene permiso para esta acción.",
                usuario.rol.as_str()
            )));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// Conjuntos de roles
// ---

pub struct SoloAdministrador;
impl RoleSet for SoloAdministrador {
    fn roles() -> &'static [Rol] {
        &[Rol::Administrador]
    }
}

pub struct Supervisores;
impl RoleSet for Supervisores {
    fn roles() -> &'static [Rol] {
        &[Rol::Administrador, Rol::Gerente]
    }
}

pub struct GestionAlmacen;
impl RoleSet for GestionAlmacen {
    fn roles() -> &'static [Rol] {
        &[Rol::Administrador, Rol::Gerente, Rol::Almacenero]
    }
}

pub struct GestionProduccion;
impl RoleSet for GestionProduccion {
    fn roles() -> &'static [Rol] {
        &[Rol::Administrador, Rol::Gerente, Rol::Produccion]
    }
}

pub struct GestionVentas;
impl RoleSet for GestionVentas {
    fn roles() -> &'static [Rol] {
        &[Rol::Administrador, Rol::Gerente, Rol::Vendedor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;

    fn usuario(rol: Rol) -> Usuario {
        Usuario {
            id: 1,
            email: "test@envases.pe".into(),
            password_hash: String::new(),
            nombre: "Prueba".into(),
            rol,
            empleado_id: None,
            activo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn check<T: RoleSet>(rol: Option<Rol>) -> Result<RequireRole<T>, AppError> {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(rol) = rol {
            parts.extensions.insert(usuario(rol));
        }
        RequireRole::<T>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn allows_roles_in_the_set() {
        assert!(check::<GestionAlmacen>(Some(Rol::Almacenero)).await.is_ok());
        assert!(check::<Supervisores>(Some(Rol::Gerente)).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_other_roles_with_forbidden() {
        let err = check::<Supervisores>(Some(Rol::Vendedor)).await.err().unwrap();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = check::<SoloAdministrador>(Some(Rol::Gerente)).await.err().unwrap();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn role_sets_list_their_members() {
        assert_eq!(SoloAdministrador::roles(), &[Rol::Administrador]);
        assert_eq!(Supervisores::roles(), &[Rol::Administrador, Rol::Gerente]);
        assert!(GestionAlmacen::roles().contains(&Rol::Almacenero));
        assert!(GestionProduccion::roles().contains(&Rol::Produccion));
        assert!(GestionVentas::roles().contains(&Rol::Vendedor));
        assert!(!GestionVentas::roles().contains(&Rol::Almacenero));
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let err = check::<GestionVentas>(None).await.err().unwrap();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
