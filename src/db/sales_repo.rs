// src/db/sales_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::sales::{
        CondicionPago, DetalleOrdenVenta, EstadoOrdenVenta, EstadoPago, EstadoVerificacion,
        LineaVenta, OrdenVenta, TotalesVenta,
    },
};

/// Cabecera editable de una orden (alta o edición).
#[derive(Debug, Clone)]
pub struct CabeceraOrden<'a> {
    pub cliente_id: i32,
    pub condicion_pago: CondicionPago,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub direccion_entrega: Option<&'a str>,
    pub observaciones: Option<&'a str>,
}

#[derive(Debug, FromRow)]
pub struct ClienteResumen {
    pub razon_social: String,
    pub numero_documento: String,
}

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, estado: Option<EstadoVerificacion>) -> Result<Vec<OrdenVenta>, AppError> {
        let rows = sqlx::query_as::<_, OrdenVenta>(
            r#"
            SELECT * FROM ordenes_venta
            WHERE ($1::estado_verificacion IS NULL OR estado_verificacion = $1)
            ORDER BY fecha DESC, id DESC
            "#,
        )
        .bind(estado)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find<'e, E>(&self, executor: E, id: i32) -> Result<Option<OrdenVenta>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenVenta>("SELECT * FROM ordenes_venta WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn lock<'e, E>(&self, executor: E, id: i32) -> Result<OrdenVenta, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, OrdenVenta>("SELECT * FROM ordenes_venta WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Orden de venta {}", id)))
    }

    pub async fn client_summary<'e, E>(&self, executor: E, cliente_id: i32) -> Result<ClienteResumen, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ClienteResumen>(
            "SELECT razon_social, numero_documento FROM clientes WHERE id = $1",
        )
        .bind(cliente_id)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        cabecera: &CabeceraOrden<'_>,
        totales: &TotalesVenta,
        creado_por: i32,
    ) -> Result<OrdenVenta, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenVenta>(
            r#"
            INSERT INTO ordenes_venta (
                cliente_id, condicion_pago, fecha_vencimiento, direccion_entrega,
                observaciones, subtotal, igv, total, creado_por
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(cabecera.cliente_id)
        .bind(cabecera.condicion_pago)
        .bind(cabecera.fecha_vencimiento)
        .bind(cabecera.direccion_entrega)
        .bind(cabecera.observaciones)
        .bind(totales.subtotal)
        .bind(totales.igv)
        .bind(totales.total)
        .bind(creado_por)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Reemplaza la cabecera y devuelve la orden a verificación pendiente.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i32,
        cabecera: &CabeceraOrden<'_>,
        totales: &TotalesVenta,
    ) -> Result<OrdenVenta, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenVenta>(
            r#"
            UPDATE ordenes_venta SET
                cliente_id = $2, condicion_pago = $3, fecha_vencimiento = $4,
                direccion_entrega = $5, observaciones = $6, subtotal = $7, igv = $8,
                total = $9, estado_verificacion = 'Pendiente', motivo_rechazo = NULL,
                verificado_por = NULL, fecha_verificacion = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(cabecera.cliente_id)
        .bind(cabecera.condicion_pago)
        .bind(cabecera.fecha_vencimiento)
        .bind(cabecera.direccion_entrega)
        .bind(cabecera.observaciones)
        .bind(totales.subtotal)
        .bind(totales.igv)
        .bind(totales.total)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn delete_items<'e, E>(&self, executor: E, orden_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM detalle_orden_venta WHERE orden_id = $1")
            .bind(orden_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn add_item<'e, E>(&self, executor: E, orden_id: i32, linea: &LineaVenta) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO detalle_orden_venta (orden_id, producto_id, cantidad, precio_unitario, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(orden_id)
        .bind(linea.producto_id)
        .bind(linea.cantidad)
        .bind(linea.precio_unitario)
        .bind(linea.subtotal)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_items<'e, E>(&self, executor: E, orden_id: i32) -> Result<Vec<DetalleOrdenVenta>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, DetalleOrdenVenta>(
            r#"
            SELECT d.id, d.orden_id, d.producto_id, p.codigo AS producto_codigo,
                   p.nombre AS producto_nombre, p.unidad_medida,
                   d.cantidad, d.precio_unitario, d.subtotal
            FROM detalle_orden_venta d
            JOIN productos p ON p.id = d.producto_id
            WHERE d.orden_id = $1
            ORDER BY d.id
            "#,
        )
        .bind(orden_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn set_verification<'e, E>(
        &self,
        executor: E,
        id: i32,
        estado: EstadoVerificacion,
        verificado_por: i32,
        motivo_rechazo: Option<&str>,
    ) -> Result<OrdenVenta, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenVenta>(
            r#"
            UPDATE ordenes_venta SET
                estado_verificacion = $2, verificado_por = $3, motivo_rechazo = $4,
                fecha_verificacion = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(estado)
        .bind(verificado_por)
        .bind(motivo_rechazo)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn set_state<'e, E>(&self, executor: E, id: i32, estado: EstadoOrdenVenta) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE ordenes_venta SET estado = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(estado)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_paid_amount<'e, E>(
        &self,
        executor: E,
        id: i32,
        monto_pagado: Decimal,
        estado_pago: EstadoPago,
    ) -> Result<OrdenVenta, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrdenVenta>(
            r#"
            UPDATE ordenes_venta SET monto_pagado = $2, estado_pago = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(monto_pagado)
        .bind(estado_pago)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Saldo pendiente de las órdenes aprobadas y vigentes del cliente.
    pub async fn outstanding_debt<'e, E>(
        &self,
        executor: E,
        cliente_id: i32,
        excluir_orden: Option<i32>,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deuda: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total - monto_pagado), 0)
            FROM ordenes_venta
            WHERE cliente_id = $1
              AND estado <> 'Anulada'
              AND estado_verificacion = 'Aprobada'
              AND ($2::INT IS NULL OR id <> $2)
            "#,
        )
        .bind(cliente_id)
        .bind(excluir_orden)
        .fetch_one(executor)
        .await?;
        Ok(deuda)
    }

    pub async fn has_active_guide<'e, E>(&self, executor: E, orden_id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM guias_remision WHERE orden_venta_id = $1 AND estado <> 'Anulada')",
        )
        .bind(orden_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn has_payments<'e, E>(&self, executor: E, orden_id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pagos WHERE orden_id = $1)")
            .bind(orden_id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }
}
