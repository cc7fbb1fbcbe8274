// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::settings::{ConfiguracionEmpresa, UpdateConfiguracionPayload},
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_settings<'e, E>(&self, executor: E) -> Result<ConfiguracionEmpresa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // La migración inicial siembra la fila id = 1
        let settings = sqlx::query_as::<_, ConfiguracionEmpresa>(
            "SELECT * FROM configuracion_empresa WHERE id = 1",
        )
        .fetch_one(executor)
        .await?;
        Ok(settings)
    }

    pub async fn update_settings(
        &self,
        input: &UpdateConfiguracionPayload,
    ) -> Result<ConfiguracionEmpresa, AppError> {
        // Los campos omitidos conservan su valor
        let settings = sqlx::query_as::<_, ConfiguracionEmpresa>(
            r#"
            UPDATE configuracion_empresa SET
                ruc = COALESCE($1, ruc),
                razon_social = COALESCE($2, razon_social),
                nombre_comercial = COALESCE($3, nombre_comercial),
                direccion = COALESCE($4, direccion),
                telefono = COALESCE($5, telefono),
                email = COALESCE($6, email),
                serie_factura = COALESCE(UPPER($7), serie_factura),
                serie_guia = COALESCE(UPPER($8), serie_guia),
                tasa_igv = COALESCE($9, tasa_igv),
                cuenta_bancaria = COALESCE($10, cuenta_bancaria),
                updated_at = NOW()
            WHERE id = 1
            RETURNING *
            "#,
        )
        .bind(&input.ruc)
        .bind(&input.razon_social)
        .bind(&input.nombre_comercial)
        .bind(&input.direccion)
        .bind(&input.telefono)
        .bind(&input.email)
        .bind(&input.serie_factura)
        .bind(&input.serie_guia)
        .bind(input.tasa_igv)
        .bind(&input.cuenta_bancaria)
        .fetch_one(&self.pool)
        .await?;

        Ok(settings)
    }
}
