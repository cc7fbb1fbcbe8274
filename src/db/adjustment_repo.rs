// src/db/adjustment_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::inventory::{AjusteInventario, EstadoAjuste, OrigenAjuste, TipoAjuste},
};

#[derive(Debug, Clone)]
pub struct NuevoAjuste<'a> {
    pub producto_id: i32,
    pub origen: OrigenAjuste,
    pub tipo: TipoAjuste,
    pub stock_sistema: Decimal,
    pub stock_fisico: Option<Decimal>,
    pub cantidad: Decimal,
    pub costo_unitario: Option<Decimal>,
    pub motivo: &'a str,
    pub estado: EstadoAjuste,
    pub solicitado_por: i32,
}

#[derive(Clone)]
pub struct AdjustmentRepository {
    pool: PgPool,
}

impl AdjustmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, estado: Option<EstadoAjuste>) -> Result<Vec<AjusteInventario>, AppError> {
        let rows = sqlx::query_as::<_, AjusteInventario>(
            r#"
            SELECT * FROM ajustes_inventario
            WHERE ($1::estado_ajuste IS NULL OR estado = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(estado)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn lock<'e, E>(&self, executor: E, id: i32) -> Result<AjusteInventario, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, AjusteInventario>(
            "SELECT * FROM ajustes_inventario WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Ajuste {}", id)))
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        ajuste: &NuevoAjuste<'_>,
    ) -> Result<AjusteInventario, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Los conteos físicos nacen aplicados y revisados por quien los registra
        let row = sqlx::query_as::<_, AjusteInventario>(
            r#"
            INSERT INTO ajustes_inventario (
                producto_id, origen, tipo, stock_sistema, stock_fisico, cantidad,
                costo_unitario, motivo, estado, solicitado_por,
                revisado_por, fecha_revision
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                CASE WHEN $9 = 'Aplicado'::estado_ajuste THEN $10 END,
                CASE WHEN $9 = 'Aplicado'::estado_ajuste THEN NOW() END
            )
            RETURNING *
            "#,
        )
        .bind(ajuste.producto_id)
        .bind(ajuste.origen)
        .bind(ajuste.tipo)
        .bind(ajuste.stock_sistema)
        .bind(ajuste.stock_fisico)
        .bind(ajuste.cantidad)
        .bind(ajuste.costo_unitario)
        .bind(ajuste.motivo)
        .bind(ajuste.estado)
        .bind(ajuste.solicitado_por)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn set_review<'e, E>(
        &self,
        executor: E,
        id: i32,
        estado: EstadoAjuste,
        revisado_por: i32,
        observacion: Option<&str>,
        stock_sistema: Option<Decimal>,
    ) -> Result<AjusteInventario, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, AjusteInventario>(
            r#"
            UPDATE ajustes_inventario SET
                estado = $2, revisado_por = $3, observacion = $4,
                stock_sistema = COALESCE($5, stock_sistema), fecha_revision = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(estado)
        .bind(revisado_por)
        .bind(observacion)
        .bind(stock_sistema)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }
}
