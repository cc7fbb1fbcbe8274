// src/services/settings_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::{error::AppError, validation::is_valid_ruc},
    db::SettingsRepository,
    models::settings::{ConfiguracionEmpresa, UpdateConfiguracionPayload},
};

pub fn check_settings(input: &UpdateConfiguracionPayload) -> Result<(), AppError> {
    if let Some(ruc) = input.ruc.as_deref() {
        if !is_valid_ruc(ruc) {
            return Err(AppError::bad_request("El RUC de la empresa no es válido."));
        }
    }
    if let Some(tasa) = input.tasa_igv {
        if tasa < Decimal::ZERO || tasa >= Decimal::ONE {
            return Err(AppError::bad_request(
                "La tasa de IGV debe estar entre 0 y 1 (por ejemplo 0.18).",
            ));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct SettingsService {
    repo: SettingsRepository,
    pool: PgPool,
}

impl SettingsService {
    pub fn new(repo: SettingsRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn get(&self) -> Result<ConfiguracionEmpresa, AppError> {
        self.repo.get_settings(&self.pool).await
    }

    pub async fn update(&self, input: &UpdateConfiguracionPayload) -> Result<ConfiguracionEmpresa, AppError> {
        check_settings(input)?;
        let settings = self.repo.update_settings(input).await?;
        tracing::info!("Configuración de la empresa actualizada");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> UpdateConfiguracionPayload {
        UpdateConfiguracionPayload {
            ruc: None,
            razon_social: None,
            nombre_comercial: None,
            direccion: None,
            telefono: None,
            email: None,
            serie_factura: None,
            serie_guia: None,
            tasa_igv: None,
            cuenta_bancaria: None,
        }
    }

    #[test]
    fn igv_rate_must_be_a_fraction() {
        let mut input = payload();
        input.tasa_igv = Some("0.18".parse().unwrap());
        assert!(check_settings(&input).is_ok());

        input.tasa_igv = Some(Decimal::from(18));
        assert!(check_settings(&input).is_err());
    }

    #[test]
    fn company_ruc_is_checked() {
        let mut input = payload();
        input.ruc = Some("20100070970".into());
        assert!(check_settings(&input).is_ok());

        input.ruc = Some("20100070971".into());
        assert!(check_settings(&input).is_err());
    }
}
