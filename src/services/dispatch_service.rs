// src/services/dispatch_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::{
    common::{db_utils::document_number, error::AppError, validation::is_valid_ruc},
    db::{dispatch_repo::NuevaGuia, DirectoryRepository, DispatchRepository, SalesRepository, SettingsRepository},
    models::{
        dispatch::{CreateGuiaPayload, EstadoGuia, GuiaRemision, GuiaRemisionDetalle, ModalidadTransporte},
        directory::EstadoVehiculo,
        inventory::MotivoMovimiento,
        sales::{EstadoOrdenVenta, EstadoVerificacion},
    },
    services::inventory_service::{InventoryService, Origen},
};

const MOTIVO_TRASLADO_DEFECTO: &str = "Venta";

/// Reglas del transportista según la modalidad del traslado.
pub fn check_carrier(input: &CreateGuiaPayload) -> Result<(), AppError> {
    match input.modalidad {
        ModalidadTransporte::Privado => {
            if input.vehiculo_id.is_none() || input.conductor_id.is_none() {
                return Err(AppError::bad_request(
                    "El transporte privado requiere vehículo y conductor.",
                ));
            }
        }
        ModalidadTransporte::Publico => {
            let ruc = input.transportista_ruc.as_deref().unwrap_or_default();
            if !is_valid_ruc(ruc) {
                return Err(AppError::bad_request("El RUC del transportista no es válido."));
            }
            let razon = input.transportista_razon_social.as_deref().unwrap_or_default();
            if razon.trim().is_empty() {
                return Err(AppError::bad_request(
                    "La razón social del transportista es obligatoria.",
                ));
            }
        }
    }
    Ok(())
}

/// Peso bruto: cantidad × peso unitario; los productos sin peso no suman.
pub fn gross_weight(items: &[(Decimal, Option<Decimal>)]) -> Decimal {
    items
        .iter()
        .filter_map(|(cantidad, peso)| peso.map(|p| *cantidad * p))
        .sum::<Decimal>()
        .round_dp(2)
}

/// Ordena por producto para que dos transacciones bloqueen las filas en el mismo orden.
pub fn lock_order<T>(mut items: Vec<T>, producto_id: impl Fn(&T) -> i32) -> Vec<T> {
    items.sort_by_key(|i| producto_id(i));
    items
}

fn check_transition(guia: &GuiaRemision, hacia: EstadoGuia) -> Result<(), AppError> {
    if !guia.estado.can_transition_to(hacia) {
        return Err(AppError::InvalidTransition {
            entidad: "Guía de remisión",
            desde: guia.estado.as_str().to_string(),
            hacia: hacia.as_str().to_string(),
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct DispatchService {
    repo: DispatchRepository,
    sales_repo: SalesRepository,
    directory_repo: DirectoryRepository,
    settings_repo: SettingsRepository,
    inventory: InventoryService,
    pool: PgPool,
}

impl DispatchService {
    pub fn new(
        repo: DispatchRepository,
        sales_repo: SalesRepository,
        directory_repo: DirectoryRepository,
        settings_repo: SettingsRepository,
        inventory: InventoryService,
        pool: PgPool,
    ) -> Self {
        Self { repo, sales_repo, directory_repo, settings_repo, inventory, pool }
    }

    pub async fn list(&self, estado: Option<EstadoGuia>) -> Result<Vec<GuiaRemision>, AppError> {
        self.repo.list(estado).await
    }

    pub async fn get(&self, id: i32) -> Result<GuiaRemision, AppError> {
        self.repo
            .find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Guía de remisión {}", id)))
    }

    pub async fn get_detail(&self, id: i32) -> Result<GuiaRemisionDetalle, AppError> {
        let guia = self.get(id).await?;
        let items = self.repo.list_items(&self.pool, id).await?;

        let orden = self
            .sales_repo
            .find(&self.pool, guia.orden_venta_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Orden de venta {}", guia.orden_venta_id)))?;
        let cliente = self.sales_repo.client_summary(&self.pool, orden.cliente_id).await?;

        let vehiculo = match guia.vehiculo_id {
            Some(vid) => self.directory_repo.find_vehicle(&self.pool, vid).await?,
            None => None,
        };
        let conductor = match guia.conductor_id {
            Some(cid) => self.directory_repo.find_employee(&self.pool, cid).await?,
            None => None,
        };

        Ok(GuiaRemisionDetalle {
            numero: document_number(&guia.serie, guia.id),
            cliente_razon_social: cliente.razon_social,
            cliente_documento: cliente.numero_documento,
            vehiculo_placa: vehiculo.map(|v| v.placa),
            conductor_licencia: conductor.as_ref().and_then(|c| c.licencia_conducir.clone()),
            conductor_nombre: conductor.map(|c| format!("{} {}", c.nombres, c.apellidos)),
            guia,
            items,
        })
    }

    async fn check_private_transport(
        &self,
        conn: &mut PgConnection,
        vehiculo_id: i32,
        conductor_id: i32,
    ) -> Result<(), AppError> {
        let vehiculo = self
            .directory_repo
            .find_vehicle(&mut *conn, vehiculo_id)
            .await?
            .filter(|v| v.activo)
            .ok_or_else(|| AppError::not_found(format!("Vehículo {}", vehiculo_id)))?;
        if vehiculo.estado != EstadoVehiculo::Operativo {
            return Err(AppError::bad_request(format!(
                "El vehículo {} no está operativo.",
                vehiculo.placa
            )));
        }

        let conductor = self
            .directory_repo
            .find_employee(&mut *conn, conductor_id)
            .await?
            .filter(|e| e.activo)
            .ok_or_else(|| AppError::not_found(format!("Conductor {}", conductor_id)))?;
        if conductor.licencia_conducir.as_deref().map_or(true, |l| l.trim().is_empty()) {
            return Err(AppError::bad_request(format!(
                "{} {} no tiene licencia de conducir registrada.",
                conductor.nombres, conductor.apellidos
            )));
        }
        Ok(())
    }

    pub async fn create(&self, input: &CreateGuiaPayload, usuario_id: i32) -> Result<GuiaRemision, AppError> {
        check_carrier(input)?;

        let mut tx = self.pool.begin().await?;

        let orden = self.sales_repo.lock(&mut *tx, input.orden_venta_id).await?;
        if orden.estado_verificacion != EstadoVerificacion::Aprobada
            || orden.estado != EstadoOrdenVenta::Registrada
        {
            return Err(AppError::bad_request(format!(
                "La orden de venta debe estar aprobada y registrada (actual: {} / {}).",
                orden.estado_verificacion.as_str(),
                orden.estado.as_str()
            )));
        }
        if self.sales_repo.has_active_guide(&mut *tx, orden.id).await? {
            return Err(AppError::Conflict(
                "La orden de venta ya tiene una guía vigente.".into(),
            ));
        }

        if let (ModalidadTransporte::Privado, Some(vid), Some(cid)) =
            (input.modalidad, input.vehiculo_id, input.conductor_id)
        {
            self.check_private_transport(&mut tx, vid, cid).await?;
        }

        let items = lock_order(
            self.sales_repo.list_items(&mut *tx, orden.id).await?,
            |i| i.producto_id,
        );
        let mut pesos = Vec::with_capacity(items.len());
        for item in &items {
            let producto = self.inventory.lock_product(&mut tx, item.producto_id).await?;
            pesos.push((item.cantidad, producto.peso_unitario_kg));
        }

        let settings = self.settings_repo.get_settings(&mut *tx).await?;
        let publico = input.modalidad == ModalidadTransporte::Publico;

        let guia = self
            .repo
            .create(
                &mut *tx,
                &NuevaGuia {
                    serie: &settings.serie_guia,
                    orden_venta_id: orden.id,
                    fecha_traslado: input.fecha_traslado,
                    punto_partida: &input.punto_partida,
                    punto_llegada: &input.punto_llegada,
                    motivo_traslado: input
                        .motivo_traslado
                        .as_deref()
                        .unwrap_or(MOTIVO_TRASLADO_DEFECTO),
                    modalidad: input.modalidad,
                    vehiculo_id: if publico { None } else { input.vehiculo_id },
                    conductor_id: if publico { None } else { input.conductor_id },
                    transportista_ruc: if publico { input.transportista_ruc.as_deref() } else { None },
                    transportista_razon_social: if publico {
                        input.transportista_razon_social.as_deref()
                    } else {
                        None
                    },
                    peso_bruto_kg: gross_weight(&pesos),
                    observaciones: input.observaciones.as_deref(),
                    creado_por: usuario_id,
                },
            )
            .await?;

        for item in &items {
            self.repo.add_item(&mut *tx, guia.id, item.producto_id, item.cantidad).await?;
        }

        tx.commit().await?;

        tracing::info!(guia_id = guia.id, orden_id = orden.id, "Guía de remisión emitida");
        Ok(guia)
    }

    /// Salida de almacén de todos los ítems y orden a Despachada.
    pub async fn dispatch(&self, id: i32, usuario_id: i32) -> Result<GuiaRemision, AppError> {
        let mut tx = self.pool.begin().await?;

        let guia = self.repo.lock(&mut *tx, id).await?;
        check_transition(&guia, EstadoGuia::EnTransito)?;

        let items = lock_order(self.repo.list_items(&mut *tx, id).await?, |i| {
            i.producto_id
        });

        // Primero se bloquean y verifican todos los productos
        for item in &items {
            let producto = self.inventory.lock_product(&mut tx, item.producto_id).await?;
            if producto.stock_actual < item.cantidad {
                return Err(AppError::InsufficientStock {
                    producto: producto.nombre,
                    disponible: producto.stock_actual,
                    requerido: item.cantidad,
                });
            }
        }

        let referencia = document_number(&guia.serie, guia.id);
        for item in &items {
            self.inventory
                .post_exit(
                    &mut tx,
                    item.producto_id,
                    item.cantidad,
                    MotivoMovimiento::Despacho,
                    Origen::new(&referencia, usuario_id),
                )
                .await?;
        }

        self.sales_repo
            .set_state(&mut *tx, guia.orden_venta_id, EstadoOrdenVenta::Despachada)
            .await?;
        let guia = self.repo.set_state(&mut *tx, id, EstadoGuia::EnTransito, None).await?;

        tx.commit().await?;

        tracing::info!(guia_id = id, items = items.len(), "Guía despachada");
        Ok(guia)
    }

    pub async fn deliver(&self, id: i32) -> Result<GuiaRemision, AppError> {
        let mut tx = self.pool.begin().await?;

        let guia = self.repo.lock(&mut *tx, id).await?;
        check_transition(&guia, EstadoGuia::Entregada)?;

        self.sales_repo
            .set_state(&mut *tx, guia.orden_venta_id, EstadoOrdenVenta::Entregada)
            .await?;
        let guia = self.repo.set_state(&mut *tx, id, EstadoGuia::Entregada, None).await?;

        tx.commit().await?;

        tracing::info!(guia_id = id, "Guía entregada");
        Ok(guia)
    }

    pub async fn cancel(&self, id: i32, motivo: &str) -> Result<GuiaRemision, AppError> {
        let mut tx = self.pool.begin().await?;

        let guia = self.repo.lock(&mut *tx, id).await?;
        check_transition(&guia, EstadoGuia::Anulada)?;

        let guia = self
            .repo
            .set_state(&mut *tx, id, EstadoGuia::Anulada, Some(motivo))
            .await?;
        tx.commit().await?;

        tracing::info!(guia_id = id, "Guía anulada");
        Ok(guia)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        auth::Rol,
        inventory::{TipoMovimiento, TipoProducto},
    };
    use crate::services::fixtures::{self, dec};
    use chrono::NaiveDate;

    fn payload(modalidad: ModalidadTransporte) -> CreateGuiaPayload {
        CreateGuiaPayload {
            orden_venta_id: 1,
            fecha_traslado: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            punto_partida: "Av. Argentina 1234, Lima".into(),
            punto_llegada: "Jr. Ucayali 55, Callao".into(),
            motivo_traslado: None,
            modalidad,
            vehiculo_id: None,
            conductor_id: None,
            transportista_ruc: None,
            transportista_razon_social: None,
            observaciones: None,
        }
    }

    #[test]
    fn private_transport_needs_vehicle_and_driver() {
        let mut input = payload(ModalidadTransporte::Privado);
        assert!(check_carrier(&input).is_err());

        input.vehiculo_id = Some(3);
        input.conductor_id = Some(8);
        assert!(check_carrier(&input).is_ok());
    }

    #[test]
    fn public_transport_needs_valid_carrier() {
        let mut input = payload(ModalidadTransporte::Publico);
        input.transportista_ruc = Some("20100070971".into());
        input.transportista_razon_social = Some("Transportes del Sur S.A.".into());
        assert!(check_carrier(&input).is_err());

        input.transportista_ruc = Some("20100070970".into());
        assert!(check_carrier(&input).is_ok());

        input.transportista_razon_social = Some("  ".into());
        assert!(check_carrier(&input).is_err());
    }

    #[test]
    fn rows_are_locked_in_product_order() {
        let lineas = vec![(7, "bolsas"), (2, "tapas"), (5, "frascos"), (2, "etiquetas")];
        let ordenadas = lock_order(lineas, |l| l.0);
        let ids: Vec<i32> = ordenadas.iter().map(|l| l.0).collect();
        assert_eq!(ids, vec![2, 2, 5, 7]);
        // Estable: las líneas del mismo producto mantienen su orden
        assert_eq!(ordenadas[0].1, "tapas");
    }

    #[test]
    fn gross_weight_skips_products_without_weight() {
        let d = |s: &str| s.parse::<Decimal>().unwrap();
        let peso = gross_weight(&[
            (d("100"), Some(d("0.35"))),
            (d("20"), None),
            (d("3"), Some(d("12.5"))),
        ]);
        assert_eq!(peso, d("72.50"));
    }

    struct Venta {
        almacenero_id: i32,
        producto_id: i32,
        orden_id: i32,
    }

    // Orden al contado aprobada por un administrador, lista para emitir guía
    async fn venta_aprobada(pool: &PgPool, stock: &str, cantidad: &str) -> Venta {
        let vendedor = fixtures::usuario(pool, "ventas@envases.pe", Rol::Vendedor).await;
        let admin = fixtures::usuario(pool, "admin@envases.pe", Rol::Administrador).await;
        let almacenero = fixtures::usuario(pool, "almacen@envases.pe", Rol::Almacenero).await;
        let botella =
            fixtures::producto(pool, "PT-BOT500", TipoProducto::ProductoTerminado, stock, "1.2").await;
        let cliente_id = fixtures::cliente(pool).await;

        let ventas = fixtures::sales(pool);
        let orden = ventas
            .create(&fixtures::orden_contado(cliente_id, botella.id, cantidad), vendedor.id)
            .await
            .unwrap();
        ventas.approve(orden.id, admin.id).await.unwrap();

        Venta {
            almacenero_id: almacenero.id,
            producto_id: botella.id,
            orden_id: orden.id,
        }
    }

    #[sqlx::test]
    async fn dispatch_moves_stock_out_and_marks_the_order_dispatched(pool: PgPool) {
        let venta = venta_aprobada(&pool, "500", "120").await;
        let service = fixtures::dispatch(&pool);

        let guia = service
            .create(&fixtures::guia_publica(venta.orden_id), venta.almacenero_id)
            .await
            .unwrap();
        assert_eq!(guia.estado, EstadoGuia::Emitida);
        assert_eq!(guia.peso_bruto_kg, Some(dec("30")));
        assert_eq!(fixtures::releer(&pool, venta.producto_id).await.stock_actual, dec("500"));

        let despachada = service.dispatch(guia.id, venta.almacenero_id).await.unwrap();
        assert_eq!(despachada.estado, EstadoGuia::EnTransito);

        let producto = fixtures::releer(&pool, venta.producto_id).await;
        assert_eq!(producto.stock_actual, dec("380"));
        assert_eq!(producto.costo_unitario_promedio, dec("1.2"));

        let movs = fixtures::movimientos(&pool, venta.producto_id).await;
        assert_eq!(movs.len(), 1);
        assert_eq!(movs[0].tipo, TipoMovimiento::Salida);
        assert_eq!(movs[0].motivo, MotivoMovimiento::Despacho);
        assert_eq!(movs[0].cantidad, dec("120"));
        assert_eq!(movs[0].costo_unitario, dec("1.2"));
        assert_eq!(movs[0].stock_resultante, dec("380"));

        let orden = fixtures::sales(&pool).get(venta.orden_id).await.unwrap();
        assert_eq!(orden.estado, EstadoOrdenVenta::Despachada);
    }

    #[sqlx::test]
    async fn dispatch_without_stock_leaves_guide_and_order_untouched(pool: PgPool) {
        let venta = venta_aprobada(&pool, "100", "120").await;
        let service = fixtures::dispatch(&pool);
        let guia = service
            .create(&fixtures::guia_publica(venta.orden_id), venta.almacenero_id)
            .await
            .unwrap();

        let result = service.dispatch(guia.id, venta.almacenero_id).await;
        assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

        assert_eq!(service.get(guia.id).await.unwrap().estado, EstadoGuia::Emitida);
        let orden = fixtures::sales(&pool).get(venta.orden_id).await.unwrap();
        assert_eq!(orden.estado, EstadoOrdenVenta::Registrada);
        assert_eq!(fixtures::releer(&pool, venta.producto_id).await.stock_actual, dec("100"));
        assert!(fixtures::movimientos(&pool, venta.producto_id).await.is_empty());
    }

    #[sqlx::test]
    async fn second_guide_for_the_same_order_conflicts(pool: PgPool) {
        let venta = venta_aprobada(&pool, "500", "120").await;
        let service = fixtures::dispatch(&pool);
        service
            .create(&fixtures::guia_publica(venta.orden_id), venta.almacenero_id)
            .await
            .unwrap();

        let result = service
            .create(&fixtures::guia_publica(venta.orden_id), venta.almacenero_id)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
