// src/services/identity_service.rs
// Consulta de RUC (SUNAT) y DNI (RENIEC) contra el proveedor externo.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::{
    common::{
        error::AppError,
        validation::{is_valid_dni, is_valid_ruc},
    },
    models::{
        directory::TipoDocumento,
        identity::{ConsultaIdentidad, DniResponse, RucResponse},
    },
};

#[derive(Clone)]
pub struct IdentityService {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl IdentityService {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("No se pudo crear el cliente HTTP: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub async fn lookup_ruc(&self, numero: &str) -> Result<ConsultaIdentidad, AppError> {
        if !is_valid_ruc(numero) {
            return Err(AppError::bad_request("El RUC no es válido."));
        }

        let data: RucResponse = self.fetch("sunat/ruc", numero, "RUC").await?;

        Ok(ConsultaIdentidad {
            tipo_documento: TipoDocumento::Ruc,
            numero_documento: data.numero_documento.unwrap_or_else(|| numero.to_string()),
            nombre: data.razon_social.trim().to_string(),
            direccion: data.direccion.filter(|d| !d.trim().is_empty() && d.trim() != "-"),
            estado: data.estado,
            condicion: data.condicion,
        })
    }

    pub async fn lookup_dni(&self, numero: &str) -> Result<ConsultaIdentidad, AppError> {
        if !is_valid_dni(numero) {
            return Err(AppError::bad_request("El DNI debe tener 8 dígitos."));
        }

        let data: DniResponse = self.fetch("reniec/dni", numero, "DNI").await?;

        Ok(ConsultaIdentidad {
            tipo_documento: TipoDocumento::Dni,
            nombre: data.nombre_completo(),
            numero_documento: data.numero_documento.unwrap_or_else(|| numero.to_string()),
            direccion: None,
            estado: None,
            condicion: None,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, numero: &str, label: &str) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, path);

        let mut request = self
            .client
            .get(&url)
            .query(&[("numero", numero)])
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::warn!(documento = numero, "Consulta {} sin respuesta a tiempo", label);
                AppError::ExternalService("tiempo de espera agotado".into())
            } else {
                tracing::warn!(documento = numero, error = %e, "Consulta {} fallida", label);
                AppError::ExternalService(e.to_string())
            }
        })?;

        match response.status() {
            s if s.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| AppError::ExternalService(format!("respuesta inválida: {}", e))),
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(AppError::not_found(format!("{} {}", label, numero)))
            }
            s => Err(AppError::ExternalService(format!("el proveedor respondió {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn service(url: &str) -> IdentityService {
        IdentityService::new(url, Some("token-prueba".into()), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn ruc_lookup_normalizes_provider_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/sunat/ruc")
            .match_query(Matcher::UrlEncoded("numero".into(), "20100070970".into()))
            .match_header("authorization", "Bearer token-prueba")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"razonSocial":"SUPERMERCADOS PERUANOS SOCIEDAD ANONIMA ","numeroDocumento":"20100070970",
                    "estado":"ACTIVO","condicion":"HABIDO","direccion":"CAL. MORELLI NRO. 181"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let result = service(&server.url()).lookup_ruc("20100070970").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.tipo_documento, TipoDocumento::Ruc);
        assert_eq!(result.nombre, "SUPERMERCADOS PERUANOS SOCIEDAD ANONIMA");
        assert_eq!(result.estado.as_deref(), Some("ACTIVO"));
        assert_eq!(result.direccion.as_deref(), Some("CAL. MORELLI NRO. 181"));
    }

    #[tokio::test]
    async fn dni_lookup_joins_names() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/reniec/dni")
            .match_query(Matcher::UrlEncoded("numero".into(), "45678912".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"nombres":"ROSA MARIA","apellidoPaterno":"QUISPE","apellidoMaterno":"MAMANI"}"#)
            .create_async()
            .await;

        let result = service(&server.url()).lookup_dni("45678912").await.unwrap();

        assert_eq!(result.nombre, "ROSA MARIA QUISPE MAMANI");
        assert_eq!(result.numero_documento, "45678912");
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/reniec/dni")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let err = service(&server.url()).lookup_dni("12345678").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn provider_failure_is_a_bad_gateway() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/sunat/ruc")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = service(&server.url()).lookup_ruc("20100070970").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalService(_)));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn invalid_numbers_never_reach_the_provider() {
        let mut server = Server::new_async().await;
        let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

        let svc = service(&server.url());
        assert!(matches!(svc.lookup_ruc("20100070971").await, Err(AppError::BadRequest(_))));
        assert!(matches!(svc.lookup_dni("123").await, Err(AppError::BadRequest(_))));

        mock.assert_async().await;
    }
}
