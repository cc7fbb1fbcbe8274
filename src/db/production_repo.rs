// src/db/production_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::production::{ConsumoProduccion, EstadoProduccion, OrdenProduccion},
};

#[derive(Clone)]
pub struct ProductionRepository {
    pool: PgPool,
}

impl ProductionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, estado: Option<EstadoProduccion>) -> Result<Vec<OrdenProduccion>, AppError> {
        let rows = sqlx::query_as::<_, OrdenProduccion>(
            r#"
            SELECT * FROM ordenes_produccion
            WHERE ($1::estado_produccion IS NULL OR estado = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(estado)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find<'e, E>(&self, executor: E, id: i32) -> Result<Option<OrdenProduccion>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenProduccion>("SELECT * FROM ordenes_produccion WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn lock<'e, E>(&self, executor: E, id: i32) -> Result<OrdenProduccion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, OrdenProduccion>(
            "SELECT * FROM ordenes_produccion WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Orden de producción {}", id)))
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        producto_id: i32,
        cantidad_planificada: Decimal,
        responsable_id: Option<i32>,
        observaciones: Option<&str>,
        creado_por: i32,
    ) -> Result<OrdenProduccion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenProduccion>(
            r#"
            INSERT INTO ordenes_produccion (
                producto_id, cantidad_planificada, responsable_id, observaciones, creado_por
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(producto_id)
        .bind(cantidad_planificada)
        .bind(responsable_id)
        .bind(observaciones)
        .bind(creado_por)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Orden de producción duplicada."))?;
        Ok(row)
    }

    /// Cambia el estado y, según el destino, sella fechas y resultados.
    pub async fn update_state<'e, E>(
        &self,
        executor: E,
        id: i32,
        estado: EstadoProduccion,
    ) -> Result<OrdenProduccion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenProduccion>(
            r#"
            UPDATE ordenes_produccion SET
                estado = $2,
                fecha_inicio = COALESCE(fecha_inicio, CASE WHEN $2 = 'En Curso'::estado_produccion THEN NOW() END),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(estado)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn set_material_cost<'e, E>(
        &self,
        executor: E,
        id: i32,
        costo_materiales: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE ordenes_produccion SET costo_materiales = $2 WHERE id = $1")
            .bind(id)
            .bind(costo_materiales)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn finish<'e, E>(
        &self,
        executor: E,
        id: i32,
        cantidad_producida: Decimal,
        costo_unitario: Decimal,
    ) -> Result<OrdenProduccion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenProduccion>(
            r#"
            UPDATE ordenes_produccion SET
                estado = 'Finalizada', cantidad_producida = $2, costo_unitario_resultado = $3,
                fecha_fin = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(cantidad_producida)
        .bind(costo_unitario)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn cancel<'e, E>(&self, executor: E, id: i32, motivo: &str) -> Result<OrdenProduccion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenProduccion>(
            r#"
            UPDATE ordenes_produccion SET
                estado = 'Cancelada', motivo_cancelacion = $2, fecha_fin = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(motivo)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    // ---
    // Consumos
    // ---

    pub async fn add_consumption<'e, E>(
        &self,
        executor: E,
        orden_id: i32,
        insumo_id: i32,
        cantidad: Decimal,
        costo_unitario: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO consumos_produccion (orden_id, insumo_id, cantidad, costo_unitario)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(orden_id)
        .bind(insumo_id)
        .bind(cantidad)
        .bind(costo_unitario)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_consumptions<'e, E>(
        &self,
        executor: E,
        orden_id: i32,
    ) -> Result<Vec<ConsumoProduccion>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ConsumoProduccion>(
            r#"
            SELECT c.id, c.orden_id, c.insumo_id, p.nombre AS insumo_nombre,
                   c.cantidad, c.costo_unitario, c.created_at
            FROM consumos_produccion c
            JOIN productos p ON p.id = c.insumo_id
            WHERE c.orden_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(orden_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
