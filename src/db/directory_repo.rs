// src/db/directory_repo.rs
// Registros maestros: empleados, clientes, proveedores y vehículos.

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::directory::{
        Cliente, ClientePayload, Empleado, EmpleadoPayload, EstadoVehiculo, Proveedor,
        ProveedorPayload, Vehiculo, VehiculoPayload,
    },
};

#[derive(Clone)]
pub struct DirectoryRepository {
    pool: PgPool,
}

impl DirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  EMPLEADOS
    // =========================================================================

    pub async fn list_employees(&self) -> Result<Vec<Empleado>, AppError> {
        let rows = sqlx::query_as::<_, Empleado>(
            "SELECT * FROM empleados WHERE activo = TRUE ORDER BY apellidos, nombres",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_employee<'e, E>(&self, executor: E, id: i32) -> Result<Option<Empleado>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Empleado>("SELECT * FROM empleados WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn create_employee<'e, E>(
        &self,
        executor: E,
        input: &EmpleadoPayload,
    ) -> Result<Empleado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Empleado>(
            r#"
            INSERT INTO empleados (
                dni, nombres, apellidos, cargo, area, telefono, email,
                direccion, fecha_ingreso, licencia_conducir
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&input.dni)
        .bind(&input.nombres)
        .bind(&input.apellidos)
        .bind(&input.cargo)
        .bind(&input.area)
        .bind(&input.telefono)
        .bind(&input.email)
        .bind(&input.direccion)
        .bind(input.fecha_ingreso)
        .bind(&input.licencia_conducir)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un empleado con ese DNI."))
    }

    pub async fn update_employee<'e, E>(
        &self,
        executor: E,
        id: i32,
        input: &EmpleadoPayload,
    ) -> Result<Option<Empleado>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Empleado>(
            r#"
            UPDATE empleados SET
                dni = $2, nombres = $3, apellidos = $4, cargo = $5, area = $6,
                telefono = $7, email = $8, direccion = $9, fecha_ingreso = $10,
                licencia_conducir = $11, updated_at = NOW()
            WHERE id = $1 AND activo = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.dni)
        .bind(&input.nombres)
        .bind(&input.apellidos)
        .bind(&input.cargo)
        .bind(&input.area)
        .bind(&input.telefono)
        .bind(&input.email)
        .bind(&input.direccion)
        .bind(input.fecha_ingreso)
        .bind(&input.licencia_conducir)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un empleado con ese DNI."))
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Cliente>, AppError> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));
        let rows = sqlx::query_as::<_, Cliente>(
            r#"
            SELECT * FROM clientes
            WHERE activo = TRUE
              AND ($1::TEXT IS NULL OR razon_social ILIKE $1 OR numero_documento LIKE $1)
            ORDER BY razon_social
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_client<'e, E>(&self, executor: E, id: i32) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Cliente>("SELECT * FROM clientes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn create_client<'e, E>(
        &self,
        executor: E,
        input: &ClientePayload,
    ) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cliente>(
            r#"
            INSERT INTO clientes (
                tipo_documento, numero_documento, razon_social, direccion,
                telefono, email, contacto
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.tipo_documento)
        .bind(&input.numero_documento)
        .bind(&input.razon_social)
        .bind(&input.direccion)
        .bind(&input.telefono)
        .bind(&input.email)
        .bind(&input.contacto)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un cliente con ese documento."))
    }

    pub async fn update_client<'e, E>(
        &self,
        executor: E,
        id: i32,
        input: &ClientePayload,
    ) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cliente>(
            r#"
            UPDATE clientes SET
                tipo_documento = $2, numero_documento = $3, razon_social = $4,
                direccion = $5, telefono = $6, email = $7, contacto = $8,
                updated_at = NOW()
            WHERE id = $1 AND activo = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.tipo_documento)
        .bind(&input.numero_documento)
        .bind(&input.razon_social)
        .bind(&input.direccion)
        .bind(&input.telefono)
        .bind(&input.email)
        .bind(&input.contacto)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un cliente con ese documento."))
    }

    /// Solo la aprobación de una solicitud de crédito modifica estas columnas.
    pub async fn update_client_credit<'e, E>(
        &self,
        executor: E,
        id: i32,
        limite_credito: Decimal,
        dias_credito: i32,
    ) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Cliente>(
            r#"
            UPDATE clientes
            SET limite_credito = $2, dias_credito = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(limite_credito)
        .bind(dias_credito)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    // =========================================================================
    //  PROVEEDORES
    // =========================================================================

    pub async fn list_suppliers(&self) -> Result<Vec<Proveedor>, AppError> {
        let rows = sqlx::query_as::<_, Proveedor>(
            "SELECT * FROM proveedores WHERE activo = TRUE ORDER BY razon_social",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_supplier<'e, E>(&self, executor: E, id: i32) -> Result<Option<Proveedor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Proveedor>("SELECT * FROM proveedores WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn create_supplier<'e, E>(
        &self,
        executor: E,
        input: &ProveedorPayload,
    ) -> Result<Proveedor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Proveedor>(
            r#"
            INSERT INTO proveedores (ruc, razon_social, direccion, telefono, email, contacto, rubro)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&input.ruc)
        .bind(&input.razon_social)
        .bind(&input.direccion)
        .bind(&input.telefono)
        .bind(&input.email)
        .bind(&input.contacto)
        .bind(&input.rubro)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un proveedor con ese RUC."))
    }

    pub async fn update_supplier<'e, E>(
        &self,
        executor: E,
        id: i32,
        input: &ProveedorPayload,
    ) -> Result<Option<Proveedor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Proveedor>(
            r#"
            UPDATE proveedores SET
                ruc = $2, razon_social = $3, direccion = $4, telefono = $5,
                email = $6, contacto = $7, rubro = $8, updated_at = NOW()
            WHERE id = $1 AND activo = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.ruc)
        .bind(&input.razon_social)
        .bind(&input.direccion)
        .bind(&input.telefono)
        .bind(&input.email)
        .bind(&input.contacto)
        .bind(&input.rubro)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un proveedor con ese RUC."))
    }

    // =========================================================================
    //  FLOTA
    // =========================================================================

    pub async fn list_vehicles(&self) -> Result<Vec<Vehiculo>, AppError> {
        let rows = sqlx::query_as::<_, Vehiculo>(
            "SELECT * FROM vehiculos WHERE activo = TRUE ORDER BY placa",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_vehicle<'e, E>(&self, executor: E, id: i32) -> Result<Option<Vehiculo>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Vehiculo>("SELECT * FROM vehiculos WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn create_vehicle<'e, E>(
        &self,
        executor: E,
        input: &VehiculoPayload,
    ) -> Result<Vehiculo, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Vehiculo>(
            r#"
            INSERT INTO vehiculos (
                placa, marca, modelo, anio, capacidad_kg, certificado_inscripcion,
                estado, conductor_habitual_id
            )
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&input.placa)
        .bind(&input.marca)
        .bind(&input.modelo)
        .bind(input.anio)
        .bind(input.capacidad_kg)
        .bind(&input.certificado_inscripcion)
        .bind(input.estado.unwrap_or(EstadoVehiculo::Operativo))
        .bind(input.conductor_habitual_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un vehículo con esa placa."))
    }

    pub async fn update_vehicle<'e, E>(
        &self,
        executor: E,
        id: i32,
        input: &VehiculoPayload,
    ) -> Result<Option<Vehiculo>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Vehiculo>(
            r#"
            UPDATE vehiculos SET
                placa = UPPER($2), marca = $3, modelo = $4, anio = $5, capacidad_kg = $6,
                certificado_inscripcion = $7, estado = COALESCE($8, estado),
                conductor_habitual_id = $9, updated_at = NOW()
            WHERE id = $1 AND activo = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.placa)
        .bind(&input.marca)
        .bind(&input.modelo)
        .bind(input.anio)
        .bind(input.capacidad_kg)
        .bind(&input.certificado_inscripcion)
        .bind(input.estado)
        .bind(input.conductor_habitual_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un vehículo con esa placa."))
    }

    // =========================================================================
    //  BAJA LÓGICA
    // =========================================================================

    /// Marca `activo = FALSE` en la tabla indicada. Devuelve si existía el registro.
    pub async fn deactivate<'e, E>(
        &self,
        executor: E,
        table: DirectoryTable,
        id: i32,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE {} SET activo = FALSE, updated_at = NOW() WHERE id = $1 AND activo = TRUE",
            table.name()
        );
        let result = sqlx::query(&sql).bind(id).execute(executor).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryTable {
    Empleados,
    Clientes,
    Proveedores,
    Vehiculos,
}

impl DirectoryTable {
    fn name(&self) -> &'static str {
        match self {
            DirectoryTable::Empleados => "empleados",
            DirectoryTable::Clientes => "clientes",
            DirectoryTable::Proveedores => "proveedores",
            DirectoryTable::Vehiculos => "vehiculos",
        }
    }
}
