// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{common::error::AppError, config::AppState, services::document_service::DocumentoPdf};

// Cabeceras para que el navegador descargue el PDF
fn pdf_response(documento: DocumentoPdf) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", documento.nombre_archivo);
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        documento.contenido,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/documentos/cotizacion/{orden_id}",
    tag = "Documentos",
    params(("orden_id" = i32, Path, description = "ID de la orden de venta")),
    responses((status = 200, description = "PDF de la cotización", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn quotation_pdf(
    State(app_state): State<AppState>,
    Path(orden_id): Path<i32>,
) -> Result<Response, AppError> {
    let documento = app_state.document_service.quotation(orden_id).await?;
    Ok(pdf_response(documento))
}

#[utoipa::path(
    get,
    path = "/api/documentos/factura/{orden_id}",
    tag = "Documentos",
    params(("orden_id" = i32, Path, description = "ID de la orden de venta")),
    responses(
        (status = 200, description = "PDF de la factura con código QR", content_type = "application/pdf"),
        (status = 400, description = "La orden no está aprobada")
    ),
    security(("api_jwt" = []))
)]
pub async fn invoice_pdf(
    State(app_state): State<AppState>,
    Path(orden_id): Path<i32>,
) -> Result<Response, AppError> {
    let documento = app_state.document_service.invoice(orden_id).await?;
    Ok(pdf_response(documento))
}

#[utoipa::path(
    get,
    path = "/api/documentos/guia/{guia_id}",
    tag = "Documentos",
    params(("guia_id" = i32, Path, description = "ID de la guía de remisión")),
    responses((status = 200, description = "PDF de la guía de remisión", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn delivery_guide_pdf(
    State(app_state): State<AppState>,
    Path(guia_id): Path<i32>,
) -> Result<Response, AppError> {
    let documento = app_state.document_service.delivery_guide(guia_id).await?;
    Ok(pdf_response(documento))
}

#[utoipa::path(
    get,
    path = "/api/documentos/estado-cuenta/{cliente_id}",
    tag = "Documentos",
    params(("cliente_id" = i32, Path, description = "ID del cliente")),
    responses((status = 200, description = "PDF del estado de cuenta", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn account_statement_pdf(
    State(app_state): State<AppState>,
    Path(cliente_id): Path<i32>,
) -> Result<Response, AppError> {
    let documento = app_state.document_service.account_statement(cliente_id).await?;
    Ok(pdf_response(documento))
}
