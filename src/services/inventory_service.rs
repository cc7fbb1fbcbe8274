// src/services/inventory_service.rs

use std::collections::HashSet;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::{
    common::error::AppError,
    db::{inventory_repo::NuevoMovimiento, InventoryRepository},
    models::inventory::{
        ComponentePayload, ComponenteReceta, CreateProductoPayload, EntradaPayload, Kardex,
        MotivoMovimiento, MovimientoInventario, Producto, TipoProducto, UpdateProductoPayload,
    },
    services::costing::{StockChange, StockPosition},
};

/// Origen de un movimiento: documento, proveedor y usuario responsable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Origen<'a> {
    pub referencia: Option<&'a str>,
    pub proveedor_id: Option<i32>,
    pub usuario_id: Option<i32>,
}

impl<'a> Origen<'a> {
    pub fn new(referencia: &'a str, usuario_id: i32) -> Self {
        Self {
            referencia: Some(referencia),
            proveedor_id: None,
            usuario_id: Some(usuario_id),
        }
    }
}

/// Reglas de una receta: sin autorreferencias ni componentes repetidos.
pub fn check_recipe(producto_id: i32, componentes: &[ComponentePayload]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for c in componentes {
        if c.insumo_id == producto_id {
            return Err(AppError::bad_request(
                "Un producto no puede ser componente de sí mismo.",
            ));
        }
        if c.cantidad_por_unidad <= Decimal::ZERO {
            return Err(AppError::bad_request(
                "La cantidad por unidad debe ser mayor que cero.",
            ));
        }
        if !seen.insert(c.insumo_id) {
            return Err(AppError::bad_request(format!(
                "El componente {} está repetido en la receta.",
                c.insumo_id
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(repo: InventoryRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    // ---
    // Kardex: movimientos dentro de una transacción abierta
    // ---

    async fn apply_change(
        &self,
        conn: &mut PgConnection,
        producto: &Producto,
        change: StockChange,
        motivo: MotivoMovimiento,
        origen: Origen<'_>,
    ) -> Result<MovimientoInventario, AppError> {
        self.repo
            .update_stock(&mut *conn, producto.id, change.after.stock, change.after.cup)
            .await?;

        let mov = self
            .repo
            .record_movement(
                &mut *conn,
                &NuevoMovimiento {
                    producto_id: producto.id,
                    motivo,
                    cantidad: change.cantidad,
                    costo_unitario: change.costo_unitario,
                    stock_resultante: change.after.stock,
                    cup_resultante: change.after.cup,
                    referencia: origen.referencia,
                    proveedor_id: origen.proveedor_id,
                    usuario_id: origen.usuario_id,
                },
            )
            .await?;

        tracing::info!(
            producto_id = producto.id,
            motivo = ?motivo,
            cantidad = %change.cantidad,
            stock = %change.after.stock,
            cup = %change.after.cup,
            "Movimiento de inventario registrado"
        );

        Ok(mov)
    }

    /// Entrada valorizada: recalcula el CUP.
    pub async fn post_entry(
        &self,
        conn: &mut PgConnection,
        producto_id: i32,
        cantidad: Decimal,
        costo_unitario: Decimal,
        motivo: MotivoMovimiento,
        origen: Origen<'_>,
    ) -> Result<MovimientoInventario, AppError> {
        let producto = self.repo.lock_product(&mut *conn, producto_id).await?;
        let change = StockPosition::new(producto.stock_actual, producto.costo_unitario_promedio)
            .entry(cantidad, costo_unitario)
            .map_err(|e| e.for_product(&producto.nombre))?;

        self.apply_change(conn, &producto, change, motivo, origen).await
    }

    /// Salida al CUP vigente; falla si el stock no alcanza.
    pub async fn post_exit(
        &self,
        conn: &mut PgConnection,
        producto_id: i32,
        cantidad: Decimal,
        motivo: MotivoMovimiento,
        origen: Origen<'_>,
    ) -> Result<MovimientoInventario, AppError> {
        let producto = self.repo.lock_product(&mut *conn, producto_id).await?;
        let change = StockPosition::new(producto.stock_actual, producto.costo_unitario_promedio)
            .exit(cantidad)
            .map_err(|e| e.for_product(&producto.nombre))?;

        self.apply_change(conn, &producto, change, motivo, origen).await
    }

    /// Aplica un cambio ya calculado (conteo físico) sobre un producto bloqueado.
    pub async fn post_change(
        &self,
        conn: &mut PgConnection,
        producto: &Producto,
        change: StockChange,
        motivo: MotivoMovimiento,
        origen: Origen<'_>,
    ) -> Result<MovimientoInventario, AppError> {
        self.apply_change(conn, producto, change, motivo, origen).await
    }

    pub async fn lock_product(&self, conn: &mut PgConnection, id: i32) -> Result<Producto, AppError> {
        self.repo.lock_product(conn, id).await
    }

    // ---
    // Productos
    // ---

    pub async fn list_products(&self, incluir_inactivos: bool) -> Result<Vec<Producto>, AppError> {
        self.repo.list_products(incluir_inactivos).await
    }

    pub async fn list_low_stock(&self) -> Result<Vec<Producto>, AppError> {
        self.repo.list_low_stock().await
    }

    pub async fn get_product(&self, id: i32) -> Result<Producto, AppError> {
        self.repo
            .find_product(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Producto {}", id)))
    }

    pub async fn create_product(
        &self,
        input: &CreateProductoPayload,
        usuario_id: i32,
    ) -> Result<Producto, AppError> {
        let mut tx = self.pool.begin().await?;

        let nuevo = self.repo.create_product(&mut *tx, input).await?;

        if input.stock_inicial > Decimal::ZERO {
            self.post_entry(
                &mut tx,
                nuevo.id,
                input.stock_inicial,
                input.costo_inicial,
                MotivoMovimiento::InventarioInicial,
                Origen::new("Alta de producto", usuario_id),
            )
            .await?;
        }

        // Relee stock y CUP ya actualizados
        let producto = self.repo.lock_product(&mut *tx, nuevo.id).await?;
        tx.commit().await?;

        tracing::info!(producto_id = producto.id, codigo = %producto.codigo, "Producto creado");
        Ok(producto)
    }

    pub async fn update_product(&self, id: i32, input: &UpdateProductoPayload) -> Result<Producto, AppError> {
        self.repo
            .update_product(&self.pool, id, input)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Producto {}", id)))
    }

    pub async fn delete_product(&self, id: i32) -> Result<(), AppError> {
        if !self.repo.deactivate_product(&self.pool, id).await? {
            return Err(AppError::not_found(format!("Producto {}", id)));
        }
        tracing::info!(producto_id = id, "Producto dado de baja");
        Ok(())
    }

    pub async fn kardex(&self, id: i32) -> Result<Kardex, AppError> {
        let producto = self.get_product(id).await?;
        let movimientos = self.repo.list_movements(id).await?;
        Ok(Kardex { producto, movimientos })
    }

    // ---
    // Recetas
    // ---

    pub async fn get_recipe(&self, producto_id: i32) -> Result<Vec<ComponenteReceta>, AppError> {
        self.get_product(producto_id).await?;
        self.repo.get_recipe(&self.pool, producto_id).await
    }

    pub async fn set_recipe(
        &self,
        producto_id: i32,
        componentes: &[ComponentePayload],
    ) -> Result<Vec<ComponenteReceta>, AppError> {
        let producto = self.get_product(producto_id).await?;
        if producto.tipo != TipoProducto::ProductoTerminado {
            return Err(AppError::bad_request(
                "Solo un producto terminado puede tener receta.",
            ));
        }
        check_recipe(producto_id, componentes)?;

        let mut tx = self.pool.begin().await?;

        self.repo.clear_recipe(&mut *tx, producto_id).await?;
        for c in componentes {
            let insumo = self
                .repo
                .find_product(&mut *tx, c.insumo_id)
                .await?
                .filter(|p| p.activo)
                .ok_or_else(|| AppError::not_found(format!("Insumo {}", c.insumo_id)))?;

            self.repo
                .add_recipe_component(&mut *tx, producto_id, insumo.id, c.cantidad_por_unidad)
                .await?;
        }

        let receta = self.repo.get_recipe(&mut *tx, producto_id).await?;
        tx.commit().await?;

        tracing::info!(producto_id, componentes = receta.len(), "Receta actualizada");
        Ok(receta)
    }

    pub async fn recipe_in(
        &self,
        conn: &mut PgConnection,
        producto_id: i32,
    ) -> Result<Vec<ComponenteReceta>, AppError> {
        self.repo.get_recipe(conn, producto_id).await
    }

    // ---
    // Entradas por compra
    // ---

    pub async fn register_entry(
        &self,
        input: &EntradaPayload,
        usuario_id: i32,
    ) -> Result<MovimientoInventario, AppError> {
        let producto = self.get_product(input.producto_id).await?;
        if !producto.activo {
            return Err(AppError::bad_request("El producto está dado de baja."));
        }

        let mut tx = self.pool.begin().await?;

        let mov = self
            .post_entry(
                &mut tx,
                input.producto_id,
                input.cantidad,
                input.costo_unitario,
                MotivoMovimiento::Compra,
                Origen {
                    referencia: input.documento_referencia.as_deref(),
                    proveedor_id: input.proveedor_id,
                    usuario_id: Some(usuario_id),
                },
            )
            .await?;

        tx.commit().await?;
        Ok(mov)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn componente(insumo_id: i32, cantidad: &str) -> ComponentePayload {
        ComponentePayload {
            insumo_id,
            cantidad_por_unidad: cantidad.parse().unwrap(),
        }
    }

    #[test]
    fn recipe_accepts_distinct_components() {
        assert!(check_recipe(1, &[componente(2, "0.85"), componente(3, "0.02")]).is_ok());
        assert!(check_recipe(1, &[]).is_ok());
    }

    #[test]
    fn recipe_rejects_self_reference() {
        assert!(matches!(
            check_recipe(1, &[componente(1, "1")]),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn recipe_rejects_duplicates_and_zero_quantities() {
        assert!(check_recipe(1, &[componente(2, "1"), componente(2, "3")]).is_err());
        assert!(check_recipe(1, &[componente(2, "0")]).is_err());
    }
}
