// src/db/dispatch_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::dispatch::{DetalleGuia, EstadoGuia, GuiaRemision, ModalidadTransporte},
};

#[derive(Debug, Clone)]
pub struct NuevaGuia<'a> {
    pub serie: &'a str,
    pub orden_venta_id: i32,
    pub fecha_traslado: NaiveDate,
    pub punto_partida: &'a str,
    pub punto_llegada: &'a str,
    pub motivo_traslado: &'a str,
    pub modalidad: ModalidadTransporte,
    pub vehiculo_id: Option<i32>,
    pub conductor_id: Option<i32>,
    pub transportista_ruc: Option<&'a str>,
    pub transportista_razon_social: Option<&'a str>,
    pub peso_bruto_kg: Decimal,
    pub observaciones: Option<&'a str>,
    pub creado_por: i32,
}

#[derive(Clone)]
pub struct DispatchRepository {
    pool: PgPool,
}

impl DispatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, estado: Option<EstadoGuia>) -> Result<Vec<GuiaRemision>, AppError> {
        let rows = sqlx::query_as::<_, GuiaRemision>(
            r#"
            SELECT * FROM guias_remision
            WHERE ($1::estado_guia IS NULL OR estado = $1)
            ORDER BY fecha_emision DESC, id DESC
            "#,
        )
        .bind(estado)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find<'e, E>(&self, executor: E, id: i32) -> Result<Option<GuiaRemision>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, GuiaRemision>("SELECT * FROM guias_remision WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn lock<'e, E>(&self, executor: E, id: i32) -> Result<GuiaRemision, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, GuiaRemision>("SELECT * FROM guias_remision WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Guía de remisión {}", id)))
    }

    pub async fn create<'e, E>(&self, executor: E, guia: &NuevaGuia<'_>) -> Result<GuiaRemision, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, GuiaRemision>(
            r#"
            INSERT INTO guias_remision (
                serie, orden_venta_id, fecha_traslado, punto_partida, punto_llegada,
                motivo_traslado, modalidad, vehiculo_id, conductor_id, transportista_ruc,
                transportista_razon_social, peso_bruto_kg, observaciones, creado_por
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(guia.serie)
        .bind(guia.orden_venta_id)
        .bind(guia.fecha_traslado)
        .bind(guia.punto_partida)
        .bind(guia.punto_llegada)
        .bind(guia.motivo_traslado)
        .bind(guia.modalidad)
        .bind(guia.vehiculo_id)
        .bind(guia.conductor_id)
        .bind(guia.transportista_ruc)
        .bind(guia.transportista_razon_social)
        .bind(guia.peso_bruto_kg)
        .bind(guia.observaciones)
        .bind(guia.creado_por)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, "La orden de venta ya tiene una guía vigente."))
    }

    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        guia_id: i32,
        producto_id: i32,
        cantidad: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO detalle_guia_remision (guia_id, producto_id, cantidad) VALUES ($1, $2, $3)")
            .bind(guia_id)
            .bind(producto_id)
            .bind(cantidad)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list_items<'e, E>(&self, executor: E, guia_id: i32) -> Result<Vec<DetalleGuia>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, DetalleGuia>(
            r#"
            SELECT d.id, d.guia_id, d.producto_id, p.codigo AS producto_codigo,
                   p.nombre AS producto_nombre, p.unidad_medida, d.cantidad
            FROM detalle_guia_remision d
            JOIN productos p ON p.id = d.producto_id
            WHERE d.guia_id = $1
            ORDER BY d.id
            "#,
        )
        .bind(guia_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn set_state<'e, E>(
        &self,
        executor: E,
        id: i32,
        estado: EstadoGuia,
        motivo_anulacion: Option<&str>,
    ) -> Result<GuiaRemision, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, GuiaRemision>(
            r#"
            UPDATE guias_remision SET
                estado = $2,
                motivo_anulacion = COALESCE($3, motivo_anulacion),
                fecha_despacho = CASE WHEN $2 = 'En Tránsito'::estado_guia THEN NOW() ELSE fecha_despacho END,
                fecha_entrega = CASE WHEN $2 = 'Entregada'::estado_guia THEN NOW() ELSE fecha_entrega END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(estado)
        .bind(motivo_anulacion)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }
}
