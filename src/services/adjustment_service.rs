// src/services/adjustment_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{adjustment_repo::NuevoAjuste, AdjustmentRepository},
    models::inventory::{
        AjusteInventario, AjusteManualPayload, ConteoFisicoPayload, EstadoAjuste,
        MotivoMovimiento, OrigenAjuste, TipoAjuste,
    },
    services::{
        costing::StockPosition,
        inventory_service::{InventoryService, Origen},
    },
};

fn invalid_transition(desde: EstadoAjuste, hacia: EstadoAjuste) -> AppError {
    AppError::InvalidTransition {
        entidad: "Ajuste de inventario",
        desde: desde.as_str().to_string(),
        hacia: hacia.as_str().to_string(),
    }
}

#[derive(Clone)]
pub struct AdjustmentService {
    repo: AdjustmentRepository,
    inventory: InventoryService,
    pool: PgPool,
}

impl AdjustmentService {
    pub fn new(repo: AdjustmentRepository, inventory: InventoryService, pool: PgPool) -> Self {
        Self { repo, inventory, pool }
    }

    pub async fn list(&self, estado: Option<EstadoAjuste>) -> Result<Vec<AjusteInventario>, AppError> {
        self.repo.list(estado).await
    }

    /// Conteo físico: el stock pasa a ser lo contado, de inmediato.
    pub async fn physical_count(
        &self,
        input: &ConteoFisicoPayload,
        usuario_id: i32,
    ) -> Result<AjusteInventario, AppError> {
        let mut tx = self.pool.begin().await?;

        let producto = self.inventory.lock_product(&mut tx, input.producto_id).await?;
        let conteo = StockPosition::new(producto.stock_actual, producto.costo_unitario_promedio)
            .physical_count(input.stock_fisico)
            .map_err(|e| e.for_product(&producto.nombre))?;

        let motivo = match conteo.tipo {
            TipoAjuste::Positivo => MotivoMovimiento::AjustePositivo,
            TipoAjuste::Negativo => MotivoMovimiento::AjusteNegativo,
        };

        let ajuste = self
            .repo
            .create(
                &mut *tx,
                &NuevoAjuste {
                    producto_id: producto.id,
                    origen: OrigenAjuste::ConteoFisico,
                    tipo: conteo.tipo,
                    stock_sistema: producto.stock_actual,
                    stock_fisico: Some(input.stock_fisico),
                    cantidad: conteo.change.cantidad,
                    costo_unitario: Some(producto.costo_unitario_promedio),
                    motivo: &input.motivo,
                    estado: EstadoAjuste::Aplicado,
                    solicitado_por: usuario_id,
                },
            )
            .await?;

        let referencia = format!("Conteo físico #{}", ajuste.id);
        self.inventory
            .post_change(
                &mut tx,
                &producto,
                conteo.change,
                motivo,
                Origen::new(&referencia, usuario_id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            ajuste_id = ajuste.id,
            producto_id = producto.id,
            diferencia = %conteo.diferencia,
            "Conteo físico aplicado"
        );
        Ok(ajuste)
    }

    /// Ajuste manual: queda pendiente de aprobación y no mueve stock.
    pub async fn create_manual(
        &self,
        input: &AjusteManualPayload,
        usuario_id: i32,
    ) -> Result<AjusteInventario, AppError> {
        let producto = self.inventory.get_product(input.producto_id).await?;

        let ajuste = self
            .repo
            .create(
                &self.pool,
                &NuevoAjuste {
                    producto_id: producto.id,
                    origen: OrigenAjuste::Manual,
                    tipo: input.tipo,
                    stock_sistema: producto.stock_actual,
                    stock_fisico: None,
                    cantidad: input.cantidad,
                    costo_unitario: input.costo_unitario,
                    motivo: &input.motivo,
                    estado: EstadoAjuste::Pendiente,
                    solicitado_por: usuario_id,
                },
            )
            .await?;

        tracing::info!(ajuste_id = ajuste.id, producto_id = producto.id, "Ajuste manual registrado");
        Ok(ajuste)
    }

    pub async fn approve(
        &self,
        id: i32,
        usuario_id: i32,
        observacion: Option<&str>,
    ) -> Result<AjusteInventario, AppError> {
        let mut tx = self.pool.begin().await?;

        let ajuste = self.repo.lock(&mut *tx, id).await?;
        if !ajuste.estado.can_transition_to(EstadoAjuste::Aprobado) {
            return Err(invalid_transition(ajuste.estado, EstadoAjuste::Aprobado));
        }

        let referencia = format!("Ajuste #{}", ajuste.id);
        let origen = Origen::new(&referencia, usuario_id);

        let mov = match ajuste.tipo {
            TipoAjuste::Positivo => {
                let producto = self.inventory.lock_product(&mut tx, ajuste.producto_id).await?;
                let costo = ajuste
                    .costo_unitario
                    .unwrap_or(producto.costo_unitario_promedio);
                self.inventory
                    .post_entry(
                        &mut tx,
                        ajuste.producto_id,
                        ajuste.cantidad,
                        costo,
                        MotivoMovimiento::AjustePositivo,
                        origen,
                    )
                    .await?
            }
            TipoAjuste::Negativo => {
                self.inventory
                    .post_exit(
                        &mut tx,
                        ajuste.producto_id,
                        ajuste.cantidad,
                        MotivoMovimiento::AjusteNegativo,
                        origen,
                    )
                    .await?
            }
        };

        // stock_sistema refleja el stock al momento de aplicarse
        let stock_previo = match ajuste.tipo {
            TipoAjuste::Positivo => mov.stock_resultante - mov.cantidad,
            TipoAjuste::Negativo => mov.stock_resultante + mov.cantidad,
        };

        let ajuste = self
            .repo
            .set_review(
                &mut *tx,
                id,
                EstadoAjuste::Aprobado,
                usuario_id,
                observacion,
                Some(stock_previo),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(ajuste_id = id, revisado_por = usuario_id, "Ajuste aprobado");
        Ok(ajuste)
    }

    pub async fn reject(
        &self,
        id: i32,
        usuario_id: i32,
        observacion: Option<&str>,
    ) -> Result<AjusteInventario, AppError> {
        let mut tx = self.pool.begin().await?;

        let ajuste = self.repo.lock(&mut *tx, id).await?;
        if !ajuste.estado.can_transition_to(EstadoAjuste::Rechazado) {
            return Err(invalid_transition(ajuste.estado, EstadoAjuste::Rechazado));
        }

        let ajuste = self
            .repo
            .set_review(&mut *tx, id, EstadoAjuste::Rechazado, usuario_id, observacion, None)
            .await?;

        tx.commit().await?;

        tracing::info!(ajuste_id = id, revisado_por = usuario_id, "Ajuste rechazado");
        Ok(ajuste)
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

    fn conteo(producto_id: i32, stock_fisico: &str) -> ConteoFisicoPayload {
        ConteoFisicoPayload {
            producto_id,
            stock_fisico: dec(stock_fisico),
            motivo: "Inventario mensual".into(),
        }
    }

    #[sqlx::test]
    async fn physical_count_below_system_stock_posts_a_negative_adjustment(pool: PgPool) {
        let almacenero = fixtures::usuario(&pool, "almacen@envases.pe", Rol::Almacenero).await;
        let resina = fixtures::producto(&pool, "MP-PET", TipoProducto::MateriaPrima, "100", "2.5").await;
        let service = fixtures::adjustments(&pool);

        let ajuste = service
            .physical_count(&conteo(resina.id, "92.5"), almacenero.id)
            .await
            .unwrap();

        assert_eq!(ajuste.origen, OrigenAjuste::ConteoFisico);
        assert_eq!(ajuste.tipo, TipoAjuste::Negativo);
        assert_eq!(ajuste.estado, EstadoAjuste::Aplicado);
        assert_eq!(ajuste.stock_sistema, dec("100"));
        assert_eq!(ajuste.stock_fisico, Some(dec("92.5")));
        assert_eq!(ajuste.cantidad, dec("7.5"));

        let producto = fixtures::releer(&pool, resina.id).await;
        assert_eq!(producto.stock_actual, dec("92.5"));
        assert_eq!(producto.costo_unitario_promedio, dec("2.5"));

        let movs = fixtures::movimientos(&pool, resina.id).await;
        assert_eq!(movs.len(), 1);
        assert_eq!(movs[0].tipo, TipoMovimiento::Salida);
        assert_eq!(movs[0].motivo, MotivoMovimiento::AjusteNegativo);
        assert_eq!(movs[0].cantidad, dec("7.5"));
        assert_eq!(movs[0].costo_unitario, dec("2.5"));
        assert_eq!(movs[0].stock_resultante, dec("92.5"));
        assert_eq!(movs[0].usuario_id, Some(almacenero.id));
    }

    #[sqlx::test]
    async fn physical_count_above_system_stock_enters_at_current_cup(pool: PgPool) {
        let almacenero = fixtures::usuario(&pool, "almacen@envases.pe", Rol::Almacenero).await;
        let tapas = fixtures::producto(&pool, "IN-TAPA", TipoProducto::Insumo, "40", "0.12").await;
        let service = fixtures::adjustments(&pool);

        let ajuste = service
            .physical_count(&conteo(tapas.id, "55"), almacenero.id)
            .await
            .unwrap();

        assert_eq!(ajuste.tipo, TipoAjuste::Positivo);
        assert_eq!(ajuste.cantidad, dec("15"));

        let producto = fixtures::releer(&pool, tapas.id).await;
        assert_eq!(producto.stock_actual, dec("55"));
        assert_eq!(producto.costo_unitario_promedio, dec("0.12"));

        let movs = fixtures::movimientos(&pool, tapas.id).await;
        assert_eq!(movs.len(), 1);
        assert_eq!(movs[0].motivo, MotivoMovimiento::AjustePositivo);
        assert_eq!(movs[0].cup_resultante, dec("0.12"));
    }

    #[sqlx::test]
    async fn physical_count_equal_to_stock_is_rejected(pool: PgPool) {
        let almacenero = fixtures::usuario(&pool, "almacen@envases.pe", Rol::Almacenero).await;
        let tapas = fixtures::producto(&pool, "IN-TAPA", TipoProducto::Insumo, "40", "0.12").await;
        let service = fixtures::adjustments(&pool);

        let result = service.physical_count(&conteo(tapas.id, "40"), almacenero.id).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(service.list(None).await.unwrap().is_empty());
        assert!(fixtures::movimientos(&pool, tapas.id).await.is_empty());
    }

    #[sqlx::test]
    async fn approving_a_positive_adjustment_revalues_the_cup(pool: PgPool) {
        let almacenero = fixtures::usuario(&pool, "almacen@envases.pe", Rol::Almacenero).await;
        let gerente = fixtures::usuario(&pool, "gerencia@envases.pe", Rol::Gerente).await;
        let resina = fixtures::producto(&pool, "MP-PET", TipoProducto::MateriaPrima, "10", "2").await;
        let service = fixtures::adjustments(&pool);

        let pendiente = service
            .create_manual(
                &AjusteManualPayload {
                    producto_id: resina.id,
                    tipo: TipoAjuste::Positivo,
                    cantidad: dec("10"),
                    costo_unitario: Some(dec("4")),
                    motivo: "Sobrante de inventario".into(),
                },
                almacenero.id,
            )
            .await
            .unwrap();
        assert_eq!(pendiente.estado, EstadoAjuste::Pendiente);
        assert_eq!(fixtures::releer(&pool, resina.id).await.stock_actual, dec("10"));

        let aprobado = service
            .approve(pendiente.id, gerente.id, Some("Verificado en almacén"))
            .await
            .unwrap();

        assert_eq!(aprobado.estado, EstadoAjuste::Aprobado);
        assert_eq!(aprobado.revisado_por, Some(gerente.id));
        assert_eq!(aprobado.stock_sistema, dec("10"));

        let producto = fixtures::releer(&pool, resina.id).await;
        assert_eq!(producto.stock_actual, dec("20"));
        assert_eq!(producto.costo_unitario_promedio, dec("3"));

        let movs = fixtures::movimientos(&pool, resina.id).await;
        assert_eq!(movs.len(), 1);
        assert_eq!(movs[0].motivo, MotivoMovimiento::AjustePositivo);
        assert_eq!(movs[0].costo_unitario, dec("4"));
        assert_eq!(movs[0].usuario_id, Some(gerente.id));
    }

    #[sqlx::test]
    async fn negative_adjustment_beyond_stock_stays_pending(pool: PgPool) {
        let almacenero = fixtures::usuario(&pool, "almacen@envases.pe", Rol::Almacenero).await;
        let gerente = fixtures::usuario(&pool, "gerencia@envases.pe", Rol::Gerente).await;
        let resina = fixtures::producto(&pool, "MP-PET", TipoProducto::MateriaPrima, "5", "2").await;
        let service = fixtures::adjustments(&pool);

        let pendiente = service
            .create_manual(
                &AjusteManualPayload {
                    producto_id: resina.id,
                    tipo: TipoAjuste::Negativo,
                    cantidad: dec("8"),
                    costo_unitario: None,
                    motivo: "Merma".into(),
                },
                almacenero.id,
            )
            .await
            .unwrap();

        let result = service.approve(pendiente.id, gerente.id, None).await;
        assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

        let ajustes = service.list(Some(EstadoAjuste::Pendiente)).await.unwrap();
        assert_eq!(ajustes.len(), 1);
        assert_eq!(fixtures::releer(&pool, resina.id).await.stock_actual, dec("5"));
        assert!(fixtures::movimientos(&pool, resina.id).await.is_empty());
    }
}
