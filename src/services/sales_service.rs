// src/services/sales_service.rs

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::{
    common::{db_utils::internal_code, error::AppError},
    db::{sales_repo::CabeceraOrden, DirectoryRepository, SalesRepository, SettingsRepository},
    models::{
        auth::Usuario,
        directory::Cliente,
        sales::{
            compute_totals, CondicionPago, EstadoOrdenVenta, EstadoVerificacion, OrdenVenta,
            OrdenVentaDetalle, OrdenVentaPayload, TotalesVenta,
        },
    },
    services::inventory_service::InventoryService,
};

/// La línea disponible (límite − deuda) debe cubrir el total.
pub fn check_credit(cliente: &Cliente, deuda: Decimal, total: Decimal) -> Result<(), AppError> {
    if cliente.limite_credito <= Decimal::ZERO {
        return Err(AppError::bad_request(format!(
            "El cliente {} no tiene línea de crédito aprobada.",
            cliente.razon_social
        )));
    }
    let disponible = cliente.limite_credito - deuda;
    if disponible < total {
        return Err(AppError::bad_request(format!(
            "Crédito insuficiente: disponible S/ {}, requerido S/ {}.",
            disponible.max(Decimal::ZERO).round_dp(2),
            total.round_dp(2)
        )));
    }
    Ok(())
}

pub fn due_date(fecha: NaiveDate, dias_credito: i32) -> Option<NaiveDate> {
    fecha.checked_add_days(Days::new(dias_credito.max(0) as u64))
}

fn check_verification(orden: &OrdenVenta, hacia: EstadoVerificacion) -> Result<(), AppError> {
    if !orden.estado_verificacion.can_transition_to(hacia) {
        return Err(AppError::InvalidTransition {
            entidad: "Orden de venta",
            desde: orden.estado_verificacion.as_str().to_string(),
            hacia: hacia.as_str().to_string(),
        });
    }
    if orden.estado != EstadoOrdenVenta::Registrada {
        return Err(AppError::bad_request(format!(
            "La orden está {}.",
            orden.estado.as_str()
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct SalesService {
    repo: SalesRepository,
    directory_repo: DirectoryRepository,
    settings_repo: SettingsRepository,
    inventory: InventoryService,
    pool: PgPool,
}

impl SalesService {
    pub fn new(
        repo: SalesRepository,
        directory_repo: DirectoryRepository,
        settings_repo: SettingsRepository,
        inventory: InventoryService,
        pool: PgPool,
    ) -> Self {
        Self { repo, directory_repo, settings_repo, inventory, pool }
    }

    pub async fn list(&self, estado: Option<EstadoVerificacion>) -> Result<Vec<OrdenVenta>, AppError> {
        self.repo.list(estado).await
    }

    pub async fn get(&self, id: i32) -> Result<OrdenVenta, AppError> {
        self.repo
            .find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Orden de venta {}", id)))
    }

    pub async fn get_detail(&self, id: i32) -> Result<OrdenVentaDetalle, AppError> {
        let orden = self.get(id).await?;
        let items = self.repo.list_items(&self.pool, id).await?;
        let cliente = self.repo.client_summary(&self.pool, orden.cliente_id).await?;

        Ok(OrdenVentaDetalle {
            codigo: internal_code("OV", orden.id),
            cliente_razon_social: cliente.razon_social,
            cliente_documento: cliente.numero_documento,
            orden,
            items,
        })
    }

    /// Valida cliente, productos y crédito; devuelve totales y vencimiento.
    async fn prepare(
        &self,
        conn: &mut PgConnection,
        input: &OrdenVentaPayload,
        excluir_orden: Option<i32>,
    ) -> Result<(TotalesVenta, Option<NaiveDate>), AppError> {
        let cliente = self
            .directory_repo
            .find_client(&mut *conn, input.cliente_id)
            .await?
            .filter(|c| c.activo)
            .ok_or_else(|| AppError::not_found(format!("Cliente {}", input.cliente_id)))?;

        for item in &input.items {
            let producto = self.inventory.get_product(item.producto_id).await?;
            if !producto.activo {
                return Err(AppError::bad_request(format!(
                    "El producto {} está dado de baja.",
                    producto.codigo
                )));
            }
        }

        let settings = self.settings_repo.get_settings(&mut *conn).await?;
        let totales = compute_totals(&input.lineas(), settings.tasa_igv);

        let vencimiento = match input.condicion_pago {
            CondicionPago::Contado => None,
            CondicionPago::Credito => {
                let deuda = self
                    .repo
                    .outstanding_debt(&mut *conn, cliente.id, excluir_orden)
                    .await?;
                check_credit(&cliente, deuda, totales.total)?;
                due_date(Utc::now().date_naive(), cliente.dias_credito)
            }
        };

        Ok((totales, vencimiento))
    }

    pub async fn create(&self, input: &OrdenVentaPayload, usuario_id: i32) -> Result<OrdenVenta, AppError> {
        let mut tx = self.pool.begin().await?;

        let (totales, fecha_vencimiento) = self.prepare(&mut tx, input, None).await?;

        let cabecera = CabeceraOrden {
            cliente_id: input.cliente_id,
            condicion_pago: input.condicion_pago,
            fecha_vencimiento,
            direccion_entrega: input.direccion_entrega.as_deref(),
            observaciones: input.observaciones.as_deref(),
        };

        let orden = self.repo.create(&mut *tx, &cabecera, &totales, usuario_id).await?;
        for linea in &totales.lineas {
            self.repo.add_item(&mut *tx, orden.id, linea).await?;
        }

        tx.commit().await?;

        tracing::info!(orden_id = orden.id, total = %orden.total, "Orden de venta registrada");
        Ok(orden)
    }

    /// Editable por su autor o un administrador mientras no esté aprobada.
    pub async fn update(
        &self,
        id: i32,
        input: &OrdenVentaPayload,
        usuario: &Usuario,
    ) -> Result<OrdenVenta, AppError> {
        let mut tx = self.pool.begin().await?;

        let actual = self.repo.lock(&mut *tx, id).await?;
        if actual.creado_por != usuario.id && !usuario.is_admin() {
            return Err(AppError::Forbidden(
                "Solo el autor o un administrador puede editar la orden.".into(),
            ));
        }
        if actual.estado != EstadoOrdenVenta::Registrada || !actual.estado_verificacion.is_editable() {
            return Err(AppError::bad_request(format!(
                "No se puede editar una orden {} / {}.",
                actual.estado.as_str(),
                actual.estado_verificacion.as_str()
            )));
        }

        let (totales, fecha_vencimiento) = self.prepare(&mut tx, input, Some(id)).await?;

        let cabecera = CabeceraOrden {
            cliente_id: input.cliente_id,
            condicion_pago: input.condicion_pago,
            fecha_vencimiento,
            direccion_entrega: input.direccion_entrega.as_deref(),
            observaciones: input.observaciones.as_deref(),
        };

        self.repo.delete_items(&mut *tx, id).await?;
        for linea in &totales.lineas {
            self.repo.add_item(&mut *tx, id, linea).await?;
        }
        let orden = self.repo.update(&mut *tx, id, &cabecera, &totales).await?;

        tx.commit().await?;

        if actual.estado_verificacion == EstadoVerificacion::Rechazada {
            tracing::info!(orden_id = id, "Orden rechazada reenviada a verificación");
        }
        Ok(orden)
    }

    pub async fn approve(&self, id: i32, usuario_id: i32) -> Result<OrdenVenta, AppError> {
        let mut tx = self.pool.begin().await?;

        let orden = self.repo.lock(&mut *tx, id).await?;
        check_verification(&orden, EstadoVerificacion::Aprobada)?;

        if orden.condicion_pago == CondicionPago::Credito {
            let cliente = self
                .directory_repo
                .find_client(&mut *tx, orden.cliente_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Cliente {}", orden.cliente_id)))?;
            let deuda = self
                .repo
                .outstanding_debt(&mut *tx, orden.cliente_id, Some(id))
                .await?;
            check_credit(&cliente, deuda, orden.total)?;
        }

        let orden = self
            .repo
            .set_verification(&mut *tx, id, EstadoVerificacion::Aprobada, usuario_id, None)
            .await?;
        tx.commit().await?;

        tracing::info!(orden_id = id, verificado_por = usuario_id, "Orden de venta aprobada");
        Ok(orden)
    }

    pub async fn reject(&self, id: i32, motivo: &str, usuario_id: i32) -> Result<OrdenVenta, AppError> {
        let mut tx = self.pool.begin().await?;

        let orden = self.repo.lock(&mut *tx, id).await?;
        check_verification(&orden, EstadoVerificacion::Rechazada)?;

        let orden = self
            .repo
            .set_verification(&mut *tx, id, EstadoVerificacion::Rechazada, usuario_id, Some(motivo))
            .await?;
        tx.commit().await?;

        tracing::info!(orden_id = id, verificado_por = usuario_id, "Orden de venta rechazada");
        Ok(orden)
    }

    pub async fn cancel(&self, id: i32) -> Result<OrdenVenta, AppError> {
        let mut tx = self.pool.begin().await?;

        let orden = self.repo.lock(&mut *tx, id).await?;
        if orden.estado != EstadoOrdenVenta::Registrada {
            return Err(AppError::InvalidTransition {
                entidad: "Orden de venta",
                desde: orden.estado.as_str().to_string(),
                hacia: EstadoOrdenVenta::Anulada.as_str().to_string(),
            });
        }
        if self.repo.has_active_guide(&mut *tx, id).await? {
            return Err(AppError::Conflict(
                "La orden tiene una guía de remisión vigente.".into(),
            ));
        }
        if self.repo.has_payments(&mut *tx, id).await? {
            return Err(AppError::Conflict("La orden tiene pagos registrados.".into()));
        }

        self.repo.set_state(&mut *tx, id, EstadoOrdenVenta::Anulada).await?;
        let orden = self.repo.lock(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(orden_id = id, "Orden de venta anulada");
        Ok(orden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::Rol, directory::TipoDocumento, inventory::TipoProducto};
    use crate::services::fixtures::{self, dec};

    fn cliente(limite: i64) -> Cliente {
        Cliente {
            id: 1,
            tipo_documento: TipoDocumento::Ruc,
            numero_documento: "20100070970".into(),
            razon_social: "Distribuidora Andina S.A.C.".into(),
            direccion: None,
            telefono: None,
            email: None,
            contacto: None,
            limite_credito: Decimal::from(limite),
            dias_credito: 30,
            activo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn credit_covers_total_within_available_line() {
        assert!(check_credit(&cliente(10_000), Decimal::from(4_000), Decimal::from(6_000)).is_ok());
    }

    #[test]
    fn credit_rejects_totals_over_available_line() {
        let err = check_credit(&cliente(10_000), Decimal::from(4_000), Decimal::from(6_001)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("Crédito insuficiente")));
    }

    #[test]
    fn clients_without_line_cannot_buy_on_credit() {
        assert!(check_credit(&cliente(0), Decimal::ZERO, Decimal::ONE).is_err());
    }

    #[test]
    fn due_date_adds_credit_days() {
        let fecha = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(due_date(fecha, 30), NaiveDate::from_ymd_opt(2025, 2, 14));
        assert_eq!(due_date(fecha, 0), Some(fecha));
    }

    struct Mostrador {
        vendedor: Usuario,
        admin: Usuario,
        cliente_id: i32,
        producto_id: i32,
    }

    async fn mostrador(pool: &PgPool) -> Mostrador {
        let vendedor = fixtures::usuario(pool, "ventas@envases.pe", Rol::Vendedor).await;
        let admin = fixtures::usuario(pool, "admin@envases.pe", Rol::Administrador).await;
        let botella =
            fixtures::producto(pool, "PT-BOT500", TipoProducto::ProductoTerminado, "500", "1.2").await;
        Mostrador {
            vendedor,
            admin,
            cliente_id: fixtures::cliente(pool).await,
            producto_id: botella.id,
        }
    }

    #[sqlx::test]
    async fn editing_a_rejected_order_sends_it_back_to_verification(pool: PgPool) {
        let m = mostrador(&pool).await;
        let service = fixtures::sales(&pool);

        let orden = service
            .create(&fixtures::orden_contado(m.cliente_id, m.producto_id, "120"), m.vendedor.id)
            .await
            .unwrap();
        assert_eq!(orden.total, dec("354"));

        let rechazada = service
            .reject(orden.id, "Precio fuera de lista", m.admin.id)
            .await
            .unwrap();
        assert_eq!(rechazada.estado_verificacion, EstadoVerificacion::Rechazada);
        assert_eq!(rechazada.motivo_rechazo.as_deref(), Some("Precio fuera de lista"));
        assert_eq!(rechazada.verificado_por, Some(m.admin.id));

        let reenviada = service
            .update(
                orden.id,
                &fixtures::orden_contado(m.cliente_id, m.producto_id, "150"),
                &m.vendedor,
            )
            .await
            .unwrap();

        assert_eq!(reenviada.estado_verificacion, EstadoVerificacion::Pendiente);
        assert_eq!(reenviada.motivo_rechazo, None);
        assert_eq!(reenviada.verificado_por, None);
        assert_eq!(reenviada.fecha_verificacion, None);
        assert_eq!(reenviada.subtotal, dec("375"));
        assert_eq!(reenviada.igv, dec("67.50"));
        assert_eq!(reenviada.total, dec("442.50"));

        let detalle = service.get_detail(orden.id).await.unwrap();
        assert_eq!(detalle.items.len(), 1);
        assert_eq!(detalle.items[0].cantidad, dec("150"));
    }

    #[sqlx::test]
    async fn only_the_author_or_an_admin_can_edit(pool: PgPool) {
        let m = mostrador(&pool).await;
        let otro = fixtures::usuario(&pool, "ventas2@envases.pe", Rol::Vendedor).await;
        let service = fixtures::sales(&pool);
        let orden = service
            .create(&fixtures::orden_contado(m.cliente_id, m.producto_id, "120"), m.vendedor.id)
            .await
            .unwrap();
        let cambio = fixtures::orden_contado(m.cliente_id, m.producto_id, "80");

        let result = service.update(orden.id, &cambio, &otro).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(service.get(orden.id).await.unwrap().total, dec("354"));

        let editada = service.update(orden.id, &cambio, &m.admin).await.unwrap();
        assert_eq!(editada.subtotal, dec("200"));
    }

    #[sqlx::test]
    async fn approved_orders_are_locked_for_editing(pool: PgPool) {
        let m = mostrador(&pool).await;
        let service = fixtures::sales(&pool);
        let orden = service
            .create(&fixtures::orden_contado(m.cliente_id, m.producto_id, "120"), m.vendedor.id)
            .await
            .unwrap();
        service.approve(orden.id, m.admin.id).await.unwrap();

        let result = service
            .update(
                orden.id,
                &fixtures::orden_contado(m.cliente_id, m.producto_id, "80"),
                &m.admin,
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(
            service.get(orden.id).await.unwrap().estado_verificacion,
            EstadoVerificacion::Aprobada
        );
    }
}
