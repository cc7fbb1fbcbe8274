// src/services/finance_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{finance_repo::NuevoPago, DirectoryRepository, FinanceRepository, SalesRepository},
    models::{
        finance::{
            AprobarCreditoPayload, DocumentoPorCobrar, EstadoSolicitudCredito, Pago, PagoPayload,
            ResumenDeuda, SolicitudCredito, SolicitudCreditoPayload,
        },
        sales::{EstadoOrdenVenta, EstadoPago, EstadoVerificacion, OrdenVenta},
    },
};

/// Un pago no puede exceder el saldo pendiente de la orden.
pub fn check_payment(orden: &OrdenVenta, monto: Decimal) -> Result<(), AppError> {
    if orden.estado_verificacion != EstadoVerificacion::Aprobada {
        return Err(AppError::bad_request(
            "Solo se registran pagos de órdenes aprobadas.",
        ));
    }
    if orden.estado == EstadoOrdenVenta::Anulada {
        return Err(AppError::bad_request("La orden está anulada."));
    }
    let saldo = orden.saldo();
    if monto > saldo {
        return Err(AppError::bad_request(format!(
            "El monto S/ {} excede el saldo pendiente S/ {}.",
            monto.round_dp(2),
            saldo.round_dp(2)
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct FinanceService {
    repo: FinanceRepository,
    sales_repo: SalesRepository,
    directory_repo: DirectoryRepository,
    pool: PgPool,
}

impl FinanceService {
    pub fn new(
        repo: FinanceRepository,
        sales_repo: SalesRepository,
        directory_repo: DirectoryRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, sales_repo, directory_repo, pool }
    }

    // ---
    // Pagos
    // ---

    pub async fn list_payments(&self, orden_id: i32) -> Result<Vec<Pago>, AppError> {
        self.sales_repo
            .find(&self.pool, orden_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Orden de venta {}", orden_id)))?;
        self.repo.list_payments(orden_id).await
    }

    pub async fn register_payment(
        &self,
        orden_id: i32,
        input: &PagoPayload,
        usuario_id: i32,
    ) -> Result<Pago, AppError> {
        let mut tx = self.pool.begin().await?;

        let orden = self.sales_repo.lock(&mut *tx, orden_id).await?;
        check_payment(&orden, input.monto)?;

        let pago = self
            .repo
            .create_payment(
                &mut *tx,
                &NuevoPago {
                    orden_id,
                    monto: input.monto,
                    metodo: input.metodo,
                    fecha_pago: input.fecha_pago.unwrap_or_else(|| Utc::now().date_naive()),
                    numero_operacion: input.numero_operacion.as_deref(),
                    observaciones: input.observaciones.as_deref(),
                    registrado_por: usuario_id,
                },
            )
            .await?;

        let orden = self.recompute_paid(&mut tx, &orden).await?;
        tx.commit().await?;

        tracing::info!(
            orden_id,
            monto = %pago.monto,
            estado_pago = ?orden.estado_pago,
            "Pago registrado"
        );
        Ok(pago)
    }

    pub async fn delete_payment(&self, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let pago = self
            .repo
            .find_payment(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Pago {}", id)))?;
        let orden = self.sales_repo.lock(&mut *tx, pago.orden_id).await?;

        self.repo.delete_payment(&mut *tx, id).await?;
        self.recompute_paid(&mut tx, &orden).await?;

        tx.commit().await?;

        tracing::info!(pago_id = id, orden_id = orden.id, "Pago eliminado");
        Ok(())
    }

    async fn recompute_paid(
        &self,
        conn: &mut sqlx::PgConnection,
        orden: &OrdenVenta,
    ) -> Result<OrdenVenta, AppError> {
        let pagado = self.repo.sum_payments(&mut *conn, orden.id).await?;
        let estado = EstadoPago::from_amounts(orden.total, pagado);
        self.sales_repo.set_paid_amount(&mut *conn, orden.id, pagado, estado).await
    }

    // ---
    // Cuentas por cobrar
    // ---

    pub async fn list_receivables(&self) -> Result<Vec<DocumentoPorCobrar>, AppError> {
        self.repo.list_receivables(None).await
    }

    pub async fn client_debt(&self, cliente_id: i32) -> Result<ResumenDeuda, AppError> {
        let cliente = self
            .directory_repo
            .find_client(&self.pool, cliente_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cliente {}", cliente_id)))?;
        let documentos = self.repo.list_receivables(Some(cliente_id)).await?;

        Ok(ResumenDeuda::from_documents(
            cliente.id,
            cliente.razon_social,
            cliente.numero_documento,
            cliente.limite_credito,
            documentos,
        ))
    }

    // ---
    // Solicitudes de crédito
    // ---

    pub async fn list_credit_requests(
        &self,
        estado: Option<EstadoSolicitudCredito>,
    ) -> Result<Vec<SolicitudCredito>, AppError> {
        self.repo.list_credit_requests(estado).await
    }

    pub async fn request_credit(
        &self,
        input: &SolicitudCreditoPayload,
        usuario_id: i32,
    ) -> Result<SolicitudCredito, AppError> {
        self.directory_repo
            .find_client(&self.pool, input.cliente_id)
            .await?
            .filter(|c| c.activo)
            .ok_or_else(|| AppError::not_found(format!("Cliente {}", input.cliente_id)))?;

        let solicitud = self
            .repo
            .create_credit_request(
                &self.pool,
                input.cliente_id,
                input.monto_solicitado,
                input.plazo_dias,
                input.motivo.as_deref(),
                usuario_id,
            )
            .await?;

        tracing::info!(solicitud_id = solicitud.id, cliente_id = input.cliente_id, "Solicitud de crédito registrada");
        Ok(solicitud)
    }

    /// Aprueba la solicitud y fija la línea de crédito del cliente.
    pub async fn approve_credit(
        &self,
        id: i32,
        input: &AprobarCreditoPayload,
        usuario_id: i32,
    ) -> Result<SolicitudCredito, AppError> {
        let mut tx = self.pool.begin().await?;

        let solicitud = self.repo.lock_credit_request(&mut *tx, id).await?;
        check_pending(&solicitud)?;

        let monto = input.monto_aprobado.unwrap_or(solicitud.monto_solicitado);
        self.directory_repo
            .update_client_credit(&mut *tx, solicitud.cliente_id, monto, solicitud.plazo_dias)
            .await?;

        let solicitud = self
            .repo
            .review_credit_request(
                &mut *tx,
                id,
                EstadoSolicitudCredito::Aprobada,
                Some(monto),
                input.observacion.as_deref(),
                usuario_id,
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            solicitud_id = id,
            cliente_id = solicitud.cliente_id,
            limite = %monto,
            "Línea de crédito aprobada"
        );
        Ok(solicitud)
    }

    pub async fn reject_credit(
        &self,
        id: i32,
        observacion: Option<&str>,
        usuario_id: i32,
    ) -> Result<SolicitudCredito, AppError> {
        let mut tx = self.pool.begin().await?;

        let solicitud = self.repo.lock_credit_request(&mut *tx, id).await?;
        check_pending(&solicitud)?;

        let solicitud = self
            .repo
            .review_credit_request(
                &mut *tx,
                id,
                EstadoSolicitudCredito::Rechazada,
                None,
                observacion,
                usuario_id,
            )
            .await?;
        tx.commit().await?;

        Ok(solicitud)
    }
}

fn check_pending(solicitud: &SolicitudCredito) -> Result<(), AppError> {
    if solicitud.estado != EstadoSolicitudCredito::Pendiente {
        return Err(AppError::InvalidTransition {
            entidad: "Solicitud de crédito",
            desde: solicitud.estado.as_str().to_string(),
            hacia: "revisada".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sales::CondicionPago;
    use chrono::NaiveDate;

    fn orden(total: i64, pagado: i64) -> OrdenVenta {
        OrdenVenta {
            id: 10,
            cliente_id: 1,
            fecha: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            condicion_pago: CondicionPago::Credito,
            fecha_vencimiento: NaiveDate::from_ymd_opt(2025, 3, 3),
            direccion_entrega: None,
            observaciones: None,
            subtotal: Decimal::from(total),
            igv: Decimal::ZERO,
            total: Decimal::from(total),
            monto_pagado: Decimal::from(pagado),
            estado_verificacion: EstadoVerificacion::Aprobada,
            motivo_rechazo: None,
            verificado_por: Some(1),
            fecha_verificacion: None,
            estado: EstadoOrdenVenta::Registrada,
            estado_pago: EstadoPago::from_amounts(Decimal::from(total), Decimal::from(pagado)),
            creado_por: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn payment_up_to_the_balance_is_accepted() {
        assert!(check_payment(&orden(1180, 180), Decimal::from(1000)).is_ok());
    }

    #[test]
    fn payment_over_the_balance_is_rejected() {
        let err = check_payment(&orden(1180, 180), Decimal::from(1001)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("excede")));
    }

    #[test]
    fn payments_require_an_approved_live_order() {
        let mut pendiente = orden(100, 0);
        pendiente.estado_verificacion = EstadoVerificacion::Pendiente;
        assert!(check_payment(&pendiente, Decimal::ONE).is_err());

        let mut anulada = orden(100, 0);
        anulada.estado = EstadoOrdenVenta::Anulada;
        assert!(check_payment(&anulada, Decimal::ONE).is_err());
    }
}
