// src/services/directory_service.rs

use sqlx::PgPool;

use crate::{
    common::{
        error::AppError,
        validation::{is_valid_dni, is_valid_ruc},
    },
    db::{directory_repo::DirectoryTable, DirectoryRepository},
    models::directory::{
        Cliente, ClientePayload, Empleado, EmpleadoPayload, Proveedor, ProveedorPayload,
        TipoDocumento, Vehiculo, VehiculoPayload,
    },
};

/// El número de documento debe corresponder al tipo declarado.
pub fn check_client_document(tipo: TipoDocumento, numero: &str) -> Result<(), AppError> {
    let valid = match tipo {
        TipoDocumento::Ruc => is_valid_ruc(numero),
        TipoDocumento::Dni => is_valid_dni(numero),
    };
    if !valid {
        return Err(AppError::bad_request(match tipo {
            TipoDocumento::Ruc => "El RUC no es válido.",
            TipoDocumento::Dni => "El DNI debe tener 8 dígitos.",
        }));
    }
    Ok(())
}

#[derive(Clone)]
pub struct DirectoryService {
    repo: DirectoryRepository,
    pool: PgPool,
}

impl DirectoryService {
    pub fn new(repo: DirectoryRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    async fn deactivate(&self, table: DirectoryTable, id: i32, label: &str) -> Result<(), AppError> {
        if !self.repo.deactivate(&self.pool, table, id).await? {
            return Err(AppError::not_found(format!("{} {}", label, id)));
        }
        tracing::info!(id, "{} dado de baja", label);
        Ok(())
    }

    // --- Empleados ---

    pub async fn list_employees(&self) -> Result<Vec<Empleado>, AppError> {
        self.repo.list_employees().await
    }

    pub async fn get_employee(&self, id: i32) -> Result<Empleado, AppError> {
        self.repo
            .find_employee(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Empleado {}", id)))
    }

    pub async fn create_employee(&self, input: &EmpleadoPayload) -> Result<Empleado, AppError> {
        self.repo.create_employee(&self.pool, input).await
    }

    pub async fn update_employee(&self, id: i32, input: &EmpleadoPayload) -> Result<Empleado, AppError> {
        self.repo
            .update_employee(&self.pool, id, input)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Empleado {}", id)))
    }

    pub async fn delete_employee(&self, id: i32) -> Result<(), AppError> {
        self.deactivate(DirectoryTable::Empleados, id, "Empleado").await
    }

    // --- Clientes ---

    pub async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Cliente>, AppError> {
        self.repo.list_clients(search.filter(|s| !s.trim().is_empty())).await
    }

    pub async fn get_client(&self, id: i32) -> Result<Cliente, AppError> {
        self.repo
            .find_client(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cliente {}", id)))
    }

    pub async fn create_client(&self, input: &ClientePayload) -> Result<Cliente, AppError> {
        check_client_document(input.tipo_documento, &input.numero_documento)?;
        self.repo.create_client(&self.pool, input).await
    }

    pub async fn update_client(&self, id: i32, input: &ClientePayload) -> Result<Cliente, AppError> {
        check_client_document(input.tipo_documento, &input.numero_documento)?;
        self.repo
            .update_client(&self.pool, id, input)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cliente {}", id)))
    }

    pub async fn delete_client(&self, id: i32) -> Result<(), AppError> {
        self.deactivate(DirectoryTable::Clientes, id, "Cliente").await
    }

    // --- Proveedores ---

    pub async fn list_suppliers(&self) -> Result<Vec<Proveedor>, AppError> {
        self.repo.list_suppliers().await
    }

    pub async fn get_supplier(&self, id: i32) -> Result<Proveedor, AppError> {
        self.repo
            .find_supplier(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Proveedor {}", id)))
    }

    pub async fn create_supplier(&self, input: &ProveedorPayload) -> Result<Proveedor, AppError> {
        self.repo.create_supplier(&self.pool, input).await
    }

    pub async fn update_supplier(&self, id: i32, input: &ProveedorPayload) -> Result<Proveedor, AppError> {
        self.repo
            .update_supplier(&self.pool, id, input)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Proveedor {}", id)))
    }

    pub async fn delete_supplier(&self, id: i32) -> Result<(), AppError> {
        self.deactivate(DirectoryTable::Proveedores, id, "Proveedor").await
    }

    // --- Flota ---

    pub async fn list_vehicles(&self) -> Result<Vec<Vehiculo>, AppError> {
        self.repo.list_vehicles().await
    }

    pub async fn get_vehicle(&self, id: i32) -> Result<Vehiculo, AppError> {
        self.repo
            .find_vehicle(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Vehículo {}", id)))
    }

    async fn check_driver(&self, conductor_id: Option<i32>) -> Result<(), AppError> {
        if let Some(id) = conductor_id {
            let empleado = self.get_employee(id).await?;
            if !empleado.activo {
                return Err(AppError::bad_request("El conductor habitual está dado de baja."));
            }
        }
        Ok(())
    }

    pub async fn create_vehicle(&self, input: &VehiculoPayload) -> Result<Vehiculo, AppError> {
        self.check_driver(input.conductor_habitual_id).await?;
        self.repo.create_vehicle(&self.pool, input).await
    }

    pub async fn update_vehicle(&self, id: i32, input: &VehiculoPayload) -> Result<Vehiculo, AppError> {
        self.check_driver(input.conductor_habitual_id).await?;
        self.repo
            .update_vehicle(&self.pool, id, input)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Vehículo {}", id)))
    }

    pub async fn delete_vehicle(&self, id: i32) -> Result<(), AppError> {
        self.deactivate(DirectoryTable::Vehiculos, id, "Vehículo").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_document_must_match_its_type() {
        assert!(check_client_document(TipoDocumento::Ruc, "20100070970").is_ok());
        assert!(check_client_document(TipoDocumento::Dni, "45678912").is_ok());
        assert!(check_client_document(TipoDocumento::Ruc, "45678912").is_err());
        assert!(check_client_document(TipoDocumento::Dni, "20100070970").is_err());
    }
}
