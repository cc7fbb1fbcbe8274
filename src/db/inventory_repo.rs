// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::inventory::{
        ComponenteReceta, CreateProductoPayload, MotivoMovimiento, MovimientoInventario,
        Producto, UpdateProductoPayload,
    },
};

/// Datos de un movimiento listo para registrarse en el kardex.
#[derive(Debug, Clone)]
pub struct NuevoMovimiento<'a> {
    pub producto_id: i32,
    pub motivo: MotivoMovimiento,
    pub cantidad: Decimal,
    pub costo_unitario: Decimal,
    pub stock_resultante: Decimal,
    pub cup_resultante: Decimal,
    pub referencia: Option<&'a str>,
    pub proveedor_id: Option<i32>,
    pub usuario_id: Option<i32>,
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Lectura
    // ---

    pub async fn list_products(&self, incluir_inactivos: bool) -> Result<Vec<Producto>, AppError> {
        let items = sqlx::query_as::<_, Producto>(
            "SELECT * FROM productos WHERE ($1 OR activo = TRUE) ORDER BY codigo ASC",
        )
        .bind(incluir_inactivos)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn list_low_stock(&self) -> Result<Vec<Producto>, AppError> {
        let items = sqlx::query_as::<_, Producto>(
            r#"
            SELECT * FROM productos
            WHERE activo = TRUE AND stock_actual <= stock_minimo
            ORDER BY (stock_actual - stock_minimo) ASC, codigo ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn find_product<'e, E>(&self, executor: E, id: i32) -> Result<Option<Producto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, Producto>("SELECT * FROM productos WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    /// Lee el producto bloqueando la fila hasta el fin de la transacción.
    pub async fn lock_product<'e, E>(&self, executor: E, id: i32) -> Result<Producto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Producto>("SELECT * FROM productos WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Producto {}", id)))
    }

    // ---
    // Escritura
    // ---

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        input: &CreateProductoPayload,
    ) -> Result<Producto, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Producto>(
            r#"
            INSERT INTO productos (
                codigo, nombre, descripcion, tipo, unidad_medida,
                stock_minimo, precio_venta, peso_unitario_kg
            )
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&input.codigo)
        .bind(&input.nombre)
        .bind(&input.descripcion)
        .bind(input.tipo)
        .bind(&input.unidad_medida)
        .bind(input.stock_minimo)
        .bind(input.precio_venta)
        .bind(input.peso_unitario_kg)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un producto con ese código."))
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: i32,
        input: &UpdateProductoPayload,
    ) -> Result<Option<Producto>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, Producto>(
            r#"
            UPDATE productos SET
                nombre = $2, descripcion = $3, unidad_medida = $4, stock_minimo = $5,
                precio_venta = $6, peso_unitario_kg = $7, updated_at = NOW()
            WHERE id = $1 AND activo = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.nombre)
        .bind(&input.descripcion)
        .bind(&input.unidad_medida)
        .bind(input.stock_minimo)
        .bind(input.precio_venta)
        .bind(input.peso_unitario_kg)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    pub async fn deactivate_product<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE productos SET activo = FALSE, updated_at = NOW() WHERE id = $1 AND activo = TRUE",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Escribe stock y CUP ya calculados.
    pub async fn update_stock<'e, E>(
        &self,
        executor: E,
        id: i32,
        stock: Decimal,
        cup: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE productos
            SET stock_actual = $2, costo_unitario_promedio = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(stock)
        .bind(cup)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Kardex
    // ---

    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        mov: &NuevoMovimiento<'_>,
    ) -> Result<MovimientoInventario, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, MovimientoInventario>(
            r#"
            INSERT INTO movimientos_inventario (
                producto_id, tipo, motivo, cantidad, costo_unitario,
                stock_resultante, cup_resultante, referencia, proveedor_id, usuario_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(mov.producto_id)
        .bind(mov.motivo.tipo())
        .bind(mov.motivo)
        .bind(mov.cantidad)
        .bind(mov.costo_unitario)
        .bind(mov.stock_resultante)
        .bind(mov.cup_resultante)
        .bind(mov.referencia)
        .bind(mov.proveedor_id)
        .bind(mov.usuario_id)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn list_movements(&self, producto_id: i32) -> Result<Vec<MovimientoInventario>, AppError> {
        let rows = sqlx::query_as::<_, MovimientoInventario>(
            r#"
            SELECT * FROM movimientos_inventario
            WHERE producto_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(producto_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Recetas (BOM)
    // ---

    pub async fn get_recipe<'e, E>(
        &self,
        executor: E,
        producto_id: i32,
    ) -> Result<Vec<ComponenteReceta>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ComponenteReceta>(
            r#"
            SELECT r.producto_id, r.insumo_id, p.codigo AS insumo_codigo,
                   p.nombre AS insumo_nombre, p.unidad_medida, r.cantidad_por_unidad
            FROM recetas r
            JOIN productos p ON p.id = r.insumo_id
            WHERE r.producto_id = $1
            ORDER BY r.insumo_id
            "#,
        )
        .bind(producto_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn clear_recipe<'e, E>(&self, executor: E, producto_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM recetas WHERE producto_id = $1")
            .bind(producto_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn add_recipe_component<'e, E>(
        &self,
        executor: E,
        producto_id: i32,
        insumo_id: i32,
        cantidad_por_unidad: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO recetas (producto_id, insumo_id, cantidad_por_unidad) VALUES ($1, $2, $3)",
        )
        .bind(producto_id)
        .bind(insumo_id)
        .bind(cantidad_por_unidad)
        .execute(executor)
        .await
        .map_err(|e| map_constraint_error(e, "El componente ya figura en la receta."))?;
        Ok(())
    }
}
