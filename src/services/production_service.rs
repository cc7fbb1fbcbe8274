// src/services/production_service.rs

use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;

use crate::{
    common::{db_utils::internal_code, error::AppError},
    db::ProductionRepository,
    models::{
        inventory::{ComponenteReceta, MotivoMovimiento, TipoProducto},
        production::{
            CreateProduccionPayload, EstadoProduccion, OrdenProduccion, OrdenProduccionDetalle,
        },
        sales::round_money,
    },
    services::{
        costing::production_unit_cost,
        inventory_service::{InventoryService, Origen},
    },
};

/// Cantidad de un insumo que exige una orden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requerimiento {
    pub insumo_id: i32,
    pub insumo_nombre: String,
    pub cantidad: Decimal,
}

/// Receta × cantidad planificada, redondeado hacia arriba a la escala del stock (4 decimales).
pub fn requirements(receta: &[ComponenteReceta], cantidad_planificada: Decimal) -> Vec<Requerimiento> {
    receta
        .iter()
        .map(|c| Requerimiento {
            insumo_id: c.insumo_id,
            insumo_nombre: c.insumo_nombre.clone(),
            cantidad: (c.cantidad_por_unidad * cantidad_planificada)
                .round_dp_with_strategy(4, RoundingStrategy::AwayFromZero),
        })
        .collect()
}

fn check_transition(orden: &OrdenProduccion, hacia: EstadoProduccion) -> Result<(), AppError> {
    if !orden.estado.can_transition_to(hacia) {
        return Err(AppError::InvalidTransition {
            entidad: "Orden de producción",
            desde: orden.estado.as_str().to_string(),
            hacia: hacia.as_str().to_string(),
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProductionService {
    repo: ProductionRepository,
    inventory: InventoryService,
    pool: PgPool,
}

impl ProductionService {
    pub fn new(repo: ProductionRepository, inventory: InventoryService, pool: PgPool) -> Self {
        Self { repo, inventory, pool }
    }

    pub async fn list(&self, estado: Option<EstadoProduccion>) -> Result<Vec<OrdenProduccion>, AppError> {
        self.repo.list(estado).await
    }

    pub async fn get_detail(&self, id: i32) -> Result<OrdenProduccionDetalle, AppError> {
        let orden = self
            .repo
            .find(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Orden de producción {}", id)))?;
        let producto = self.inventory.get_product(orden.producto_id).await?;
        let consumos = self.repo.list_consumptions(&self.pool, id).await?;

        Ok(OrdenProduccionDetalle {
            codigo: internal_code("OP", orden.id),
            producto_nombre: producto.nombre,
            orden,
            consumos,
        })
    }

    pub async fn create(
        &self,
        input: &CreateProduccionPayload,
        usuario_id: i32,
    ) -> Result<OrdenProduccion, AppError> {
        let producto = self.inventory.get_product(input.producto_id).await?;
        if producto.tipo != TipoProducto::ProductoTerminado || !producto.activo {
            return Err(AppError::bad_request(
                "Solo se puede producir un producto terminado activo.",
            ));
        }
        if self.inventory.get_recipe(producto.id).await?.is_empty() {
            return Err(AppError::bad_request(format!(
                "El producto {} no tiene receta registrada.",
                producto.codigo
            )));
        }

        let orden = self
            .repo
            .create(
                &self.pool,
                producto.id,
                input.cantidad_planificada,
                input.responsable_id,
                input.observaciones.as_deref(),
                usuario_id,
            )
            .await?;

        tracing::info!(orden_id = orden.id, producto_id = producto.id, "Orden de producción creada");
        Ok(orden)
    }

    /// Pendiente → En Curso: consume los insumos de la receta al CUP vigente.
    pub async fn start(&self, id: i32, usuario_id: i32) -> Result<OrdenProduccion, AppError> {
        let mut tx = self.pool.begin().await?;

        let orden = self.repo.lock(&mut *tx, id).await?;
        check_transition(&orden, EstadoProduccion::EnCurso)?;
        if orden.estado != EstadoProduccion::Pendiente {
            return Err(AppError::bad_request("La orden ya fue iniciada; use reanudar."));
        }

        let receta = self.inventory.recipe_in(&mut tx, orden.producto_id).await?;
        if receta.is_empty() {
            return Err(AppError::bad_request("El producto no tiene receta registrada."));
        }
        let requeridos = requirements(&receta, orden.cantidad_planificada);

        // Primero se verifica todo el stock, luego se consume
        for req in &requeridos {
            let insumo = self.inventory.lock_product(&mut tx, req.insumo_id).await?;
            if insumo.stock_actual < req.cantidad {
                return Err(AppError::InsufficientStock {
                    producto: insumo.nombre,
                    disponible: insumo.stock_actual,
                    requerido: req.cantidad,
                });
            }
        }

        let referencia = internal_code("OP", orden.id);
        let mut costo_materiales = Decimal::ZERO;

        for req in &requeridos {
            let mov = self
                .inventory
                .post_exit(
                    &mut tx,
                    req.insumo_id,
                    req.cantidad,
                    MotivoMovimiento::ConsumoProduccion,
                    Origen::new(&referencia, usuario_id),
                )
                .await?;

            self.repo
                .add_consumption(&mut *tx, orden.id, req.insumo_id, req.cantidad, mov.costo_unitario)
                .await?;
            costo_materiales += req.cantidad * mov.costo_unitario;
        }

        self.repo
            .set_material_cost(&mut *tx, orden.id, round_money(costo_materiales))
            .await?;
        let orden = self.repo.update_state(&mut *tx, orden.id, EstadoProduccion::EnCurso).await?;

        tx.commit().await?;

        tracing::info!(
            orden_id = orden.id,
            costo_materiales = %orden.costo_materiales,
            "Producción iniciada"
        );
        Ok(orden)
    }

    pub async fn pause(&self, id: i32) -> Result<OrdenProduccion, AppError> {
        self.simple_transition(id, EstadoProduccion::EnCurso, EstadoProduccion::EnPausa).await
    }

    pub async fn resume(&self, id: i32) -> Result<OrdenProduccion, AppError> {
        self.simple_transition(id, EstadoProduccion::EnPausa, EstadoProduccion::EnCurso).await
    }

    async fn simple_transition(
        &self,
        id: i32,
        desde: EstadoProduccion,
        hacia: EstadoProduccion,
    ) -> Result<OrdenProduccion, AppError> {
        let mut tx = self.pool.begin().await?;

        let orden = self.repo.lock(&mut *tx, id).await?;
        if orden.estado != desde {
            return Err(AppError::InvalidTransition {
                entidad: "Orden de producción",
                desde: orden.estado.as_str().to_string(),
                hacia: hacia.as_str().to_string(),
            });
        }
        check_transition(&orden, hacia)?;

        let orden = self.repo.update_state(&mut *tx, id, hacia).await?;
        tx.commit().await?;

        tracing::info!(orden_id = id, estado = hacia.as_str(), "Producción actualizada");
        Ok(orden)
    }

    /// En Curso → Finalizada: ingresa el producto terminado al costo de materiales.
    pub async fn finish(
        &self,
        id: i32,
        cantidad_producida: Decimal,
        usuario_id: i32,
    ) -> Result<OrdenProduccion, AppError> {
        let mut tx = self.pool.begin().await?;

        let orden = self.repo.lock(&mut *tx, id).await?;
        check_transition(&orden, EstadoProduccion::Finalizada)?;

        let costo_unitario = production_unit_cost(orden.costo_materiales, cantidad_producida)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        self.inventory
            .post_entry(
                &mut tx,
                orden.producto_id,
                cantidad_producida,
                costo_unitario,
                MotivoMovimiento::Produccion,
                Origen::new(&internal_code("OP", orden.id), usuario_id),
            )
            .await?;

        let orden = self
            .repo
            .finish(&mut *tx, id, cantidad_producida, costo_unitario)
            .await?;
        tx.commit().await?;

        tracing::info!(
            orden_id = id,
            cantidad = %cantidad_producida,
            costo_unitario = %costo_unitario,
            "Producción finalizada"
        );
        Ok(orden)
    }

    /// Cancela y devuelve al almacén cada insumo consumido a su costo de consumo.
    pub async fn cancel(&self, id: i32, motivo: &str, usuario_id: i32) -> Result<OrdenProduccion, AppError> {
        let mut tx = self.pool.begin().await?;

        let orden = self.repo.lock(&mut *tx, id).await?;
        check_transition(&orden, EstadoProduccion::Cancelada)?;

        let consumos = self.repo.list_consumptions(&mut *tx, id).await?;
        let referencia = format!("Anulación {}", internal_code("OP", orden.id));

        for consumo in &consumos {
            self.inventory
                .post_entry(
                    &mut tx,
                    consumo.insumo_id,
                    consumo.cantidad,
                    consumo.costo_unitario,
                    MotivoMovimiento::ReversionProduccion,
                    Origen::new(&referencia, usuario_id),
                )
                .await?;
        }

        let orden = self.repo.cancel(&mut *tx, id, motivo).await?;
        tx.commit().await?;

        tracing::info!(orden_id = id, revertidos = consumos.len(), "Producción cancelada");
        Ok(orden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        auth::Rol,
        inventory::{EntradaPayload, TipoMovimiento},
    };
    use crate::services::fixtures::{self, dec};

    fn componente(insumo_id: i32, por_unidad: &str) -> ComponenteReceta {
        ComponenteReceta {
            producto_id: 1,
            insumo_id,
            insumo_codigo: format!("MP-{}", insumo_id),
            insumo_nombre: format!("Insumo {}", insumo_id),
            unidad_medida: "KG".into(),
            cantidad_por_unidad: por_unidad.parse().unwrap(),
        }
    }

    #[test]
    fn requirements_scale_recipe_by_planned_quantity() {
        let receta = vec![componente(2, "0.85"), componente(3, "0.000125")];
        let reqs = requirements(&receta, Decimal::from(500));

        assert_eq!(reqs[0].cantidad, "425".parse::<Decimal>().unwrap());
        // 0.0625 → se conserva con 4 decimales
        assert_eq!(reqs[1].cantidad, "0.0625".parse::<Decimal>().unwrap());
    }

    #[test]
    fn requirements_round_up_to_four_decimals() {
        let reqs = requirements(&[componente(2, "0.333333")], Decimal::from(1));
        assert_eq!(reqs[0].cantidad, "0.3334".parse::<Decimal>().unwrap());
    }

    #[test]
    fn tiny_recipe_quantities_never_round_to_zero() {
        let reqs = requirements(&[componente(2, "0.00004")], Decimal::from(1));
        assert_eq!(reqs[0].cantidad, "0.0001".parse::<Decimal>().unwrap());
        assert!(reqs[0].cantidad > Decimal::ZERO);
    }

    struct Planta {
        usuario_id: i32,
        resina: i32,
        tapa: i32,
        botella: i32,
    }

    // Botella: 0.5 de resina (CUP 2) y 1 tapa (CUP 0.5) por unidad
    async fn planta(pool: &PgPool, stock_tapas: &str) -> Planta {
        let usuario = fixtures::usuario(pool, "planta@envases.pe", Rol::Produccion).await;
        let resina = fixtures::producto(pool, "MP-PET", TipoProducto::MateriaPrima, "100", "2").await;
        let tapa = fixtures::producto(pool, "IN-TAPA", TipoProducto::Insumo, stock_tapas, "0.5").await;
        let botella =
            fixtures::producto(pool, "PT-BOT500", TipoProducto::ProductoTerminado, "0", "0").await;
        fixtures::receta(pool, botella.id, resina.id, "0.5").await;
        fixtures::receta(pool, botella.id, tapa.id, "1").await;

        Planta {
            usuario_id: usuario.id,
            resina: resina.id,
            tapa: tapa.id,
            botella: botella.id,
        }
    }

    async fn orden(service: &ProductionService, planta: &Planta, cantidad: &str) -> OrdenProduccion {
        service
            .create(
                &CreateProduccionPayload {
                    producto_id: planta.botella,
                    cantidad_planificada: dec(cantidad),
                    responsable_id: None,
                    observaciones: None,
                },
                planta.usuario_id,
            )
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn start_consumes_recipe_and_finish_enters_at_material_cost(pool: PgPool) {
        let planta = planta(&pool, "50").await;
        let service = fixtures::production(&pool);
        let pendiente = orden(&service, &planta, "40").await;

        let en_curso = service.start(pendiente.id, planta.usuario_id).await.unwrap();
        assert_eq!(en_curso.estado, EstadoProduccion::EnCurso);
        assert_eq!(en_curso.costo_materiales, dec("60"));

        assert_eq!(fixtures::releer(&pool, planta.resina).await.stock_actual, dec("80"));
        assert_eq!(fixtures::releer(&pool, planta.tapa).await.stock_actual, dec("10"));

        let consumo = fixtures::movimientos(&pool, planta.resina).await;
        assert_eq!(consumo.len(), 1);
        assert_eq!(consumo[0].motivo, MotivoMovimiento::ConsumoProduccion);
        assert_eq!(consumo[0].cantidad, dec("20"));
        assert_eq!(consumo[0].costo_unitario, dec("2"));

        let detalle = service.get_detail(pendiente.id).await.unwrap();
        assert_eq!(detalle.consumos.len(), 2);

        let finalizada = service.finish(pendiente.id, dec("40"), planta.usuario_id).await.unwrap();
        assert_eq!(finalizada.estado, EstadoProduccion::Finalizada);
        assert_eq!(finalizada.cantidad_producida, Some(dec("40")));
        assert_eq!(finalizada.costo_unitario_resultado, Some(dec("1.5")));

        let botella = fixtures::releer(&pool, planta.botella).await;
        assert_eq!(botella.stock_actual, dec("40"));
        assert_eq!(botella.costo_unitario_promedio, dec("1.5"));

        let ingreso = fixtures::movimientos(&pool, planta.botella).await;
        assert_eq!(ingreso.len(), 1);
        assert_eq!(ingreso[0].motivo, MotivoMovimiento::Produccion);
        assert_eq!(ingreso[0].costo_unitario, dec("1.5"));
    }

    #[sqlx::test]
    async fn cancel_returns_inputs_at_their_consumption_cost(pool: PgPool) {
        let planta = planta(&pool, "50").await;
        let service = fixtures::production(&pool);
        let inventario = fixtures::inventory(&pool);
        let pendiente = orden(&service, &planta, "40").await;
        service.start(pendiente.id, planta.usuario_id).await.unwrap();

        // Compra posterior a otro costo: CUP de la resina 80 @ 2 + 80 @ 5 = 3.5
        inventario
            .register_entry(
                &EntradaPayload {
                    producto_id: planta.resina,
                    proveedor_id: None,
                    cantidad: dec("80"),
                    costo_unitario: dec("5"),
                    documento_referencia: Some("F001-00004521".into()),
                },
                planta.usuario_id,
            )
            .await
            .unwrap();
        assert_eq!(
            fixtures::releer(&pool, planta.resina).await.costo_unitario_promedio,
            dec("3.5")
        );

        let cancelada = service
            .cancel(pendiente.id, "Falla en la sopladora", planta.usuario_id)
            .await
            .unwrap();
        assert_eq!(cancelada.estado, EstadoProduccion::Cancelada);
        assert_eq!(cancelada.motivo_cancelacion.as_deref(), Some("Falla en la sopladora"));

        // (160 × 3.5 + 20 × 2) / 180
        let resina = fixtures::releer(&pool, planta.resina).await;
        assert_eq!(resina.stock_actual, dec("180"));
        assert_eq!(resina.costo_unitario_promedio, dec("3.333333"));

        let movs = fixtures::movimientos(&pool, planta.resina).await;
        let reversion = movs.last().unwrap();
        assert_eq!(reversion.tipo, TipoMovimiento::Entrada);
        assert_eq!(reversion.motivo, MotivoMovimiento::ReversionProduccion);
        assert_eq!(reversion.cantidad, dec("20"));
        assert_eq!(reversion.costo_unitario, dec("2"));

        let tapa = fixtures::releer(&pool, planta.tapa).await;
        assert_eq!(tapa.stock_actual, dec("50"));
        assert_eq!(tapa.costo_unitario_promedio, dec("0.5"));
    }

    #[sqlx::test]
    async fn start_without_enough_stock_changes_nothing(pool: PgPool) {
        let planta = planta(&pool, "30").await;
        let service = fixtures::production(&pool);
        let pendiente = orden(&service, &planta, "40").await;

        let result = service.start(pendiente.id, planta.usuario_id).await;
        assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

        let detalle = service.get_detail(pendiente.id).await.unwrap();
        assert_eq!(detalle.orden.estado, EstadoProduccion::Pendiente);
        assert!(detalle.consumos.is_empty());
        assert_eq!(fixtures::releer(&pool, planta.resina).await.stock_actual, dec("100"));
        assert!(fixtures::movimientos(&pool, planta.resina).await.is_empty());
        assert!(fixtures::movimientos(&pool, planta.tapa).await.is_empty());
    }
}
