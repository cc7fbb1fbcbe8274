// src/db/finance_repo.rs
// Pagos, cuentas por cobrar y solicitudes de crédito.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::finance::{
        DocumentoPorCobrar, EstadoSolicitudCredito, MetodoPago, Pago, SolicitudCredito,
    },
};

#[derive(Debug, Clone)]
pub struct NuevoPago<'a> {
    pub orden_id: i32,
    pub monto: Decimal,
    pub metodo: MetodoPago,
    pub fecha_pago: NaiveDate,
    pub numero_operacion: Option<&'a str>,
    pub observaciones: Option<&'a str>,
    pub registrado_por: i32,
}

// Columnas comunes del reporte de cuentas por cobrar
const RECEIVABLES_SELECT: &str = r#"
    SELECT o.id AS orden_id, o.cliente_id, c.razon_social AS cliente_razon_social,
           o.fecha, o.fecha_vencimiento, o.condicion_pago, o.total, o.monto_pagado,
           (o.total - o.monto_pagado) AS saldo, o.estado_pago,
           GREATEST(0, CURRENT_DATE - COALESCE(o.fecha_vencimiento, o.fecha))::INT AS dias_vencido
    FROM ordenes_venta o
    JOIN clientes c ON c.id = o.cliente_id
    WHERE o.estado <> 'Anulada'
      AND o.estado_verificacion = 'Aprobada'
      AND o.total > o.monto_pagado
"#;

#[derive(Clone)]
pub struct FinanceRepository {
    pool: PgPool,
}

impl FinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Pagos
    // ---

    pub async fn list_payments(&self, orden_id: i32) -> Result<Vec<Pago>, AppError> {
        let rows = sqlx::query_as::<_, Pago>(
            "SELECT * FROM pagos WHERE orden_id = $1 ORDER BY fecha_pago, id",
        )
        .bind(orden_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_payment<'e, E>(&self, executor: E, id: i32) -> Result<Option<Pago>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Pago>("SELECT * FROM pagos WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn create_payment<'e, E>(&self, executor: E, pago: &NuevoPago<'_>) -> Result<Pago, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Pago>(
            r#"
            INSERT INTO pagos (
                orden_id, monto, metodo, fecha_pago, numero_operacion, observaciones, registrado_por
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(pago.orden_id)
        .bind(pago.monto)
        .bind(pago.metodo)
        .bind(pago.fecha_pago)
        .bind(pago.numero_operacion)
        .bind(pago.observaciones)
        .bind(pago.registrado_por)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn delete_payment<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM pagos WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn sum_payments<'e, E>(&self, executor: E, orden_id: i32) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(monto), 0) FROM pagos WHERE orden_id = $1")
                .bind(orden_id)
                .fetch_one(executor)
                .await?;
        Ok(total)
    }

    // ---
    // Cuentas por cobrar
    // ---

    pub async fn list_receivables(&self, cliente_id: Option<i32>) -> Result<Vec<DocumentoPorCobrar>, AppError> {
        let sql = format!(
            "{} AND ($1::INT IS NULL OR o.cliente_id = $1) ORDER BY o.fecha_vencimiento NULLS LAST, o.fecha",
            RECEIVABLES_SELECT
        );
        let rows = sqlx::query_as::<_, DocumentoPorCobrar>(&sql)
            .bind(cliente_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // ---
    // Solicitudes de crédito
    // ---

    pub async fn list_credit_requests(
        &self,
        estado: Option<EstadoSolicitudCredito>,
    ) -> Result<Vec<SolicitudCredito>, AppError> {
        let rows = sqlx::query_as::<_, SolicitudCredito>(
            r#"
            SELECT * FROM solicitudes_credito
            WHERE ($1::estado_solicitud_credito IS NULL OR estado = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(estado)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn lock_credit_request<'e, E>(&self, executor: E, id: i32) -> Result<SolicitudCredito, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, SolicitudCredito>("SELECT * FROM solicitudes_credito WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Solicitud de crédito {}", id)))
    }

    pub async fn create_credit_request<'e, E>(
        &self,
        executor: E,
        cliente_id: i32,
        monto_solicitado: Decimal,
        plazo_dias: i32,
        motivo: Option<&str>,
        solicitado_por: i32,
    ) -> Result<SolicitudCredito, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, SolicitudCredito>(
            r#"
            INSERT INTO solicitudes_credito (cliente_id, monto_solicitado, plazo_dias, motivo, solicitado_por)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(cliente_id)
        .bind(monto_solicitado)
        .bind(plazo_dias)
        .bind(motivo)
        .bind(solicitado_por)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_constraint_error(e, "El cliente ya tiene una solicitud de crédito pendiente.")
        })
    }

    pub async fn review_credit_request<'e, E>(
        &self,
        executor: E,
        id: i32,
        estado: EstadoSolicitudCredito,
        monto_aprobado: Option<Decimal>,
        observacion: Option<&str>,
        revisado_por: i32,
    ) -> Result<SolicitudCredito, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, SolicitudCredito>(
            r#"
            UPDATE solicitudes_credito SET
                estado = $2, monto_aprobado = $3, observacion = $4,
                revisado_por = $5, fecha_revision = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(estado)
        .bind(monto_aprobado)
        .bind(observacion)
        .bind(revisado_por)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }
}
