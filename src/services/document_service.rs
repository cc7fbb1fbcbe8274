// src/services/document_service.rs

use chrono::{NaiveDate, Utc};
use genpdf::{elements, style, Alignment, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sqlx::PgPool;

use crate::{
    common::{
        db_utils::{document_number, internal_code},
        error::AppError,
    },
    db::{DirectoryRepository, SettingsRepository},
    models::{
        directory::TipoDocumento,
        sales::{round_money, DetalleOrdenVenta, EstadoVerificacion},
        settings::ConfiguracionEmpresa,
    },
    services::{
        dispatch_service::DispatchService, finance_service::FinanceService,
        sales_service::SalesService,
    },
};

/// Tipos de comprobante del catálogo 01 de SUNAT.
pub const TIPO_FACTURA: &str = "01";
pub const TIPO_GUIA_REMISION: &str = "09";

/// PDF listo para descargar.
#[derive(Debug)]
pub struct DocumentoPdf {
    pub nombre_archivo: String,
    pub contenido: Vec<u8>,
}

// ---
// Helpers de formato
// ---

/// `S/ 1,234.50`
pub fn format_money(value: Decimal) -> String {
    let rounded = round_money(value);
    let text = format!("{:.2}", rounded.abs());
    let (entero, decimales) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut agrupado = String::with_capacity(entero.len() + entero.len() / 3);
    for (i, c) in entero.chars().enumerate() {
        if i > 0 && (entero.len() - i) % 3 == 0 {
            agrupado.push(',');
        }
        agrupado.push(c);
    }

    let signo = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("S/ {}{}.{}", signo, agrupado, decimales)
}

const UNIDADES: [&str; 30] = [
    "CERO", "UNO", "DOS", "TRES", "CUATRO", "CINCO", "SEIS", "SIETE", "OCHO", "NUEVE", "DIEZ",
    "ONCE", "DOCE", "TRECE", "CATORCE", "QUINCE", "DIECISEIS", "DIECISIETE", "DIECIOCHO",
    "DIECINUEVE", "VEINTE", "VEINTIUNO", "VEINTIDOS", "VEINTITRES", "VEINTICUATRO",
    "VEINTICINCO", "VEINTISEIS", "VEINTISIETE", "VEINTIOCHO", "VEINTINUEVE",
];

const DECENAS: [&str; 10] = [
    "", "", "", "TREINTA", "CUARENTA", "CINCUENTA", "SESENTA", "SETENTA", "OCHENTA", "NOVENTA",
];

const CENTENAS: [&str; 10] = [
    "", "CIENTO", "DOSCIENTOS", "TRESCIENTOS", "CUATROCIENTOS", "QUINIENTOS", "SEISCIENTOS",
    "SETECIENTOS", "OCHOCIENTOS", "NOVECIENTOS",
];

fn below_hundred(n: u64) -> String {
    if n < 30 {
        return UNIDADES[n as usize].to_string();
    }
    let decena = DECENAS[(n / 10) as usize];
    match n % 10 {
        0 => decena.to_string(),
        u => format!("{} Y {}", decena, UNIDADES[u as usize]),
    }
}

fn below_thousand(n: u64) -> String {
    match (n / 100, n % 100) {
        (0, resto) => below_hundred(resto),
        (1, 0) => "CIEN".to_string(),
        (c, 0) => CENTENAS[c as usize].to_string(),
        (c, resto) => format!("{} {}", CENTENAS[c as usize], below_hundred(resto)),
    }
}

// "UNO" delante de MIL / MILLONES se apocopa: VEINTIUN MIL, TREINTA Y UN MIL
fn apocope(words: String) -> String {
    match words.strip_suffix("UNO") {
        Some(base) => format!("{}UN", base),
        None => words,
    }
}

fn integer_words(n: u64) -> String {
    if n == 0 {
        return UNIDADES[0].to_string();
    }

    let millones = n / 1_000_000;
    let miles = (n % 1_000_000) / 1_000;
    let unidades = n % 1_000;

    let mut partes = Vec::new();
    match millones {
        0 => {}
        1 => partes.push("UN MILLON".to_string()),
        m => partes.push(format!("{} MILLONES", apocope(integer_words(m)))),
    }
    match miles {
        0 => {}
        1 => partes.push("MIL".to_string()),
        m => partes.push(format!("{} MIL", apocope(below_thousand(m)))),
    }
    if unidades > 0 {
        partes.push(below_thousand(unidades));
    }
    partes.join(" ")
}

/// Importe en letras: `SON: MIL DOSCIENTOS TREINTA Y CUATRO CON 50/100 SOLES`.
pub fn amount_to_words(value: Decimal) -> String {
    let rounded = round_money(value).abs();
    let entero = rounded.trunc();
    let centimos = ((rounded - entero) * Decimal::ONE_HUNDRED).to_u64().unwrap_or(0);

    format!(
        "SON: {} CON {:02}/100 SOLES",
        integer_words(entero.to_u64().unwrap_or(0)),
        centimos
    )
}

/// Contenido del código QR impreso en comprobantes electrónicos.
#[allow(clippy::too_many_arguments)]
pub fn sunat_qr_payload(
    ruc_emisor: &str,
    tipo_comprobante: &str,
    serie: &str,
    numero: i32,
    igv: Decimal,
    total: Decimal,
    fecha: NaiveDate,
    tipo_doc_cliente: &str,
    num_doc_cliente: &str,
) -> String {
    format!(
        "{}|{}|{}|{:08}|{:.2}|{:.2}|{}|{}|{}|",
        ruc_emisor,
        tipo_comprobante,
        serie,
        numero,
        round_money(igv),
        round_money(total),
        fecha.format("%Y-%m-%d"),
        tipo_doc_cliente,
        num_doc_cliente
    )
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::PdfError(e.to_string())
}

// ---
// Servicio
// ---

#[derive(Clone)]
pub struct DocumentService {
    sales: SalesService,
    dispatch: DispatchService,
    finance: FinanceService,
    directory_repo: DirectoryRepository,
    settings_repo: SettingsRepository,
    pool: PgPool,
    fonts_dir: String,
}

impl DocumentService {
    pub fn new(
        sales: SalesService,
        dispatch: DispatchService,
        finance: FinanceService,
        directory_repo: DirectoryRepository,
        settings_repo: SettingsRepository,
        pool: PgPool,
        fonts_dir: String,
    ) -> Self {
        Self { sales, dispatch, finance, directory_repo, settings_repo, pool, fonts_dir }
    }

    fn new_document(&self, titulo: &str) -> Result<genpdf::Document, AppError> {
        // Carga la familia Roboto desde FONTS_DIR
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None).map_err(|e| {
            AppError::PdfError(format!("Fuente Roboto no encontrada en {}: {}", self.fonts_dir, e))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(titulo);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }

    fn push_header(doc: &mut genpdf::Document, settings: &ConfiguracionEmpresa, titulo: &str, numero: &str) {
        doc.push(
            elements::Paragraph::new(settings.razon_social_o_default())
                .styled(style::Style::new().bold().with_font_size(16)),
        );
        if let Some(ruc) = &settings.ruc {
            doc.push(elements::Paragraph::new(format!("RUC: {}", ruc)).styled(style::Style::new().with_font_size(10)));
        }
        if let Some(direccion) = &settings.direccion {
            doc.push(elements::Paragraph::new(direccion.as_str()).styled(style::Style::new().with_font_size(9)));
        }
        let contacto: Vec<&str> = [settings.telefono.as_deref(), settings.email.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !contacto.is_empty() {
            doc.push(elements::Paragraph::new(contacto.join(" · ")).styled(style::Style::new().with_font_size(9)));
        }

        doc.push(elements::Break::new(1.5));

        let mut title = elements::Paragraph::new(titulo);
        title.set_alignment(Alignment::Center);
        doc.push(title.styled(style::Style::new().bold().with_font_size(14)));
        let mut number = elements::Paragraph::new(numero);
        number.set_alignment(Alignment::Center);
        doc.push(number.styled(style::Style::new().bold().with_font_size(12)));

        doc.push(elements::Break::new(1));
    }

    fn push_table(
        doc: &mut genpdf::Document,
        widths: Vec<usize>,
        headers: &[&str],
        rows: Vec<Vec<String>>,
    ) -> Result<(), AppError> {
        let mut table = elements::TableLayout::new(widths);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold().with_font_size(9);
        let mut header = table.row();
        for h in headers {
            header.push_element(elements::Paragraph::new(*h).styled(bold));
        }
        header.push().map_err(pdf_error)?;

        for row in rows {
            let mut r = table.row();
            for cell in row {
                r.push_element(elements::Paragraph::new(cell).styled(style::Style::new().with_font_size(9)));
            }
            r.push().map_err(pdf_error)?;
        }

        doc.push(table);
        Ok(())
    }

    fn push_totals(doc: &mut genpdf::Document, subtotal: Decimal, igv: Decimal, tasa: Decimal, total: Decimal) {
        doc.push(elements::Break::new(1));
        let porcentaje = (tasa * Decimal::ONE_HUNDRED).normalize();
        for (etiqueta, valor, negrita) in [
            ("OP. GRAVADA".to_string(), subtotal, false),
            (format!("IGV ({}%)", porcentaje), igv, false),
            ("TOTAL".to_string(), total, true),
        ] {
            let mut p = elements::Paragraph::new(format!("{}: {}", etiqueta, format_money(valor)));
            p.set_alignment(Alignment::Right);
            let estilo = if negrita {
                style::Style::new().bold().with_font_size(11)
            } else {
                style::Style::new().with_font_size(10)
            };
            doc.push(p.styled(estilo));
        }
        doc.push(elements::Break::new(0.5));
        doc.push(elements::Paragraph::new(amount_to_words(total)).styled(style::Style::new().bold().with_font_size(9)));
    }

    fn push_qr(doc: &mut genpdf::Document, payload: &str) -> Result<(), AppError> {
        let code = QrCode::new(payload.as_bytes()).map_err(pdf_error)?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

        let qr = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.4, 0.4));

        doc.push(elements::Break::new(1.5));
        doc.push(qr);
        Ok(())
    }

    fn render(doc: genpdf::Document, nombre_archivo: String) -> Result<DocumentoPdf, AppError> {
        let mut contenido = Vec::new();
        doc.render(&mut contenido).map_err(pdf_error)?;
        Ok(DocumentoPdf { nombre_archivo, contenido })
    }

    fn item_rows(items: &[DetalleOrdenVenta]) -> Vec<Vec<String>> {
        items
            .iter()
            .map(|i| {
                vec![
                    i.producto_codigo.clone(),
                    i.producto_nombre.clone(),
                    i.unidad_medida.clone(),
                    i.cantidad.normalize().to_string(),
                    format_money(i.precio_unitario),
                    format_money(i.subtotal),
                ]
            })
            .collect()
    }

    pub async fn quotation(&self, orden_id: i32) -> Result<DocumentoPdf, AppError> {
        let detalle = self.sales.get_detail(orden_id).await?;
        let settings = self.settings_repo.get_settings(&self.pool).await?;

        let mut doc = self.new_document(&format!("Cotización {}", detalle.codigo))?;
        Self::push_header(&mut doc, &settings, "COTIZACIÓN", &detalle.codigo);

        doc.push(elements::Paragraph::new(format!("Cliente: {}", detalle.cliente_razon_social)));
        doc.push(elements::Paragraph::new(format!("Documento: {}", detalle.cliente_documento)));
        doc.push(elements::Paragraph::new(format!("Fecha: {}", detalle.orden.fecha.format("%d/%m/%Y"))));
        if let Some(direccion) = &detalle.orden.direccion_entrega {
            doc.push(elements::Paragraph::new(format!("Entrega: {}", direccion)));
        }
        doc.push(elements::Break::new(1));

        Self::push_table(
            &mut doc,
            vec![2, 5, 1, 1, 2, 2],
            &["Código", "Descripción", "Und", "Cant.", "P. Unit.", "Importe"],
            Self::item_rows(&detalle.items),
        )?;
        Self::push_totals(&mut doc, detalle.orden.subtotal, detalle.orden.igv, settings.tasa_igv, detalle.orden.total);

        if let Some(cuenta) = &settings.cuenta_bancaria {
            doc.push(elements::Break::new(1));
            doc.push(elements::Paragraph::new(format!("Cuenta para depósitos: {}", cuenta)).styled(style::Style::new().italic().with_font_size(9)));
        }

        Self::render(doc, format!("cotizacion-{}.pdf", detalle.codigo))
    }

    /// Factura de una orden aprobada, con QR.
    pub async fn invoice(&self, orden_id: i32) -> Result<DocumentoPdf, AppError> {
        let detalle = self.sales.get_detail(orden_id).await?;
        if detalle.orden.estado_verificacion != EstadoVerificacion::Aprobada {
            return Err(AppError::bad_request(
                "Solo se emite factura de órdenes aprobadas.",
            ));
        }
        let settings = self.settings_repo.get_settings(&self.pool).await?;
        let cliente = self
            .directory_repo
            .find_client(&self.pool, detalle.orden.cliente_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cliente {}", detalle.orden.cliente_id)))?;

        let numero = document_number(&settings.serie_factura, detalle.orden.id);

        let mut doc = self.new_document(&format!("Factura {}", numero))?;
        Self::push_header(&mut doc, &settings, "FACTURA ELECTRÓNICA", &numero);

        doc.push(elements::Paragraph::new(format!("Señor(es): {}", cliente.razon_social)));
        doc.push(elements::Paragraph::new(format!(
            "{}: {}",
            match cliente.tipo_documento {
                TipoDocumento::Ruc => "RUC",
                TipoDocumento::Dni => "DNI",
            },
            cliente.numero_documento
        )));
        if let Some(direccion) = &cliente.direccion {
            doc.push(elements::Paragraph::new(format!("Dirección: {}", direccion)));
        }
        doc.push(elements::Paragraph::new(format!("Fecha de emisión: {}", detalle.orden.fecha.format("%d/%m/%Y"))));
        if let Some(venc) = detalle.orden.fecha_vencimiento {
            doc.push(elements::Paragraph::new(format!("Vencimiento: {}", venc.format("%d/%m/%Y"))));
        }
        doc.push(elements::Break::new(1));

        Self::push_table(
            &mut doc,
            vec![2, 5, 1, 1, 2, 2],
            &["Código", "Descripción", "Und", "Cant.", "P. Unit.", "Importe"],
            Self::item_rows(&detalle.items),
        )?;
        Self::push_totals(&mut doc, detalle.orden.subtotal, detalle.orden.igv, settings.tasa_igv, detalle.orden.total);

        let payload = sunat_qr_payload(
            settings.ruc.as_deref().unwrap_or_default(),
            TIPO_FACTURA,
            &settings.serie_factura,
            detalle.orden.id,
            detalle.orden.igv,
            detalle.orden.total,
            detalle.orden.fecha,
            cliente.tipo_documento.sunat_code(),
            &cliente.numero_documento,
        );
        Self::push_qr(&mut doc, &payload)?;

        tracing::info!(orden_id, numero = %numero, "Factura generada");
        Self::render(doc, format!("factura-{}.pdf", numero))
    }

    pub async fn delivery_guide(&self, guia_id: i32) -> Result<DocumentoPdf, AppError> {
        let detalle = self.dispatch.get_detail(guia_id).await?;
        let orden = self.sales.get(detalle.guia.orden_venta_id).await?;
        let settings = self.settings_repo.get_settings(&self.pool).await?;
        let cliente = self
            .directory_repo
            .find_client(&self.pool, orden.cliente_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cliente {}", orden.cliente_id)))?;
        let guia = &detalle.guia;

        let mut doc = self.new_document(&format!("Guía {}", detalle.numero))?;
        Self::push_header(&mut doc, &settings, "GUÍA DE REMISIÓN REMITENTE", &detalle.numero);

        doc.push(elements::Paragraph::new(format!("Destinatario: {}", detalle.cliente_razon_social)));
        doc.push(elements::Paragraph::new(format!("Documento: {}", detalle.cliente_documento)));
        doc.push(elements::Paragraph::new(format!("Fecha de traslado: {}", guia.fecha_traslado.format("%d/%m/%Y"))));
        doc.push(elements::Paragraph::new(format!("Motivo: {}", guia.motivo_traslado)));
        doc.push(elements::Paragraph::new(format!("Punto de partida: {}", guia.punto_partida)));
        doc.push(elements::Paragraph::new(format!("Punto de llegada: {}", guia.punto_llegada)));
        if let Some(peso) = guia.peso_bruto_kg {
            doc.push(elements::Paragraph::new(format!("Peso bruto total: {} kg", peso.normalize())));
        }
        doc.push(elements::Break::new(0.5));

        match (&guia.transportista_ruc, &guia.transportista_razon_social) {
            (Some(ruc), Some(razon)) => {
                doc.push(elements::Paragraph::new(format!("Transportista: {} (RUC {})", razon, ruc)));
            }
            _ => {
                if let Some(placa) = &detalle.vehiculo_placa {
                    doc.push(elements::Paragraph::new(format!("Vehículo: {}", placa)));
                }
                if let Some(nombre) = &detalle.conductor_nombre {
                    doc.push(elements::Paragraph::new(format!(
                        "Conductor: {} · Licencia {}",
                        nombre,
                        detalle.conductor_licencia.as_deref().unwrap_or("-")
                    )));
                }
            }
        }
        doc.push(elements::Break::new(1));

        let rows = detalle
            .items
            .iter()
            .enumerate()
            .map(|(n, i)| {
                vec![
                    (n + 1).to_string(),
                    i.producto_codigo.clone(),
                    i.producto_nombre.clone(),
                    i.unidad_medida.clone(),
                    i.cantidad.normalize().to_string(),
                ]
            })
            .collect();
        Self::push_table(&mut doc, vec![1, 2, 6, 1, 2], &["#", "Código", "Descripción", "Und", "Cantidad"], rows)?;

        let payload = sunat_qr_payload(
            settings.ruc.as_deref().unwrap_or_default(),
            TIPO_GUIA_REMISION,
            &guia.serie,
            guia.id,
            orden.igv,
            orden.total,
            guia.fecha_emision,
            cliente.tipo_documento.sunat_code(),
            &cliente.numero_documento,
        );
        Self::push_qr(&mut doc, &payload)?;

        Self::render(doc, format!("guia-{}.pdf", detalle.numero))
    }

    /// Estado de cuenta del cliente con sus documentos pendientes.
    pub async fn account_statement(&self, cliente_id: i32) -> Result<DocumentoPdf, AppError> {
        let resumen = self.finance.client_debt(cliente_id).await?;
        let settings = self.settings_repo.get_settings(&self.pool).await?;
        let hoy = Utc::now().date_naive();

        let mut doc = self.new_document(&format!("Estado de cuenta {}", resumen.cliente_razon_social))?;
        Self::push_header(&mut doc, &settings, "ESTADO DE CUENTA", &hoy.format("%d/%m/%Y").to_string());

        doc.push(elements::Paragraph::new(format!("Cliente: {}", resumen.cliente_razon_social)));
        doc.push(elements::Paragraph::new(format!("Documento: {}", resumen.cliente_documento)));
        doc.push(elements::Break::new(1));

        let rows = resumen
            .documentos
            .iter()
            .map(|d| {
                vec![
                    internal_code("OV", d.orden_id),
                    d.fecha.format("%d/%m/%Y").to_string(),
                    d.fecha_vencimiento
                        .map(|f| f.format("%d/%m/%Y").to_string())
                        .unwrap_or_else(|| "-".into()),
                    format_money(d.total),
                    format_money(d.monto_pagado),
                    format_money(d.saldo),
                    d.dias_vencido.to_string(),
                ]
            })
            .collect();
        Self::push_table(
            &mut doc,
            vec![2, 2, 2, 2, 2, 2, 1],
            &["Orden", "Fecha", "Vence", "Total", "Pagado", "Saldo", "Días venc."],
            rows,
        )?;

        doc.push(elements::Break::new(1));
        for (etiqueta, valor) in [
            ("Línea de crédito", resumen.limite_credito),
            ("Deuda total", resumen.deuda_total),
            ("Deuda vencida", resumen.deuda_vencida),
            ("Crédito disponible", resumen.credito_disponible),
        ] {
            let mut p = elements::Paragraph::new(format!("{}: {}", etiqueta, format_money(valor)));
            p.set_alignment(Alignment::Right);
            doc.push(p.styled(style::Style::new().with_font_size(10)));
        }

        Self::render(doc, format!("estado-cuenta-{}.pdf", resumen.cliente_documento))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn money_is_grouped_by_thousands() {
        assert_eq!(format_money(d("1234.5")), "S/ 1,234.50");
        assert_eq!(format_money(d("999")), "S/ 999.00");
        assert_eq!(format_money(d("1234567.891")), "S/ 1,234,567.89");
        assert_eq!(format_money(d("0.005")), "S/ 0.01");
        assert_eq!(format_money(d("-1500")), "S/ -1,500.00");
    }

    #[test]
    fn amount_in_words_for_invoices() {
        assert_eq!(
            amount_to_words(d("1234.50")),
            "SON: MIL DOSCIENTOS TREINTA Y CUATRO CON 50/100 SOLES"
        );
        assert_eq!(amount_to_words(d("0.05")), "SON: CERO CON 05/100 SOLES");
        assert_eq!(amount_to_words(d("100")), "SON: CIEN CON 00/100 SOLES");
        assert_eq!(amount_to_words(d("101")), "SON: CIENTO UNO CON 00/100 SOLES");
    }

    #[test]
    fn words_use_apocope_before_thousands_and_millions() {
        assert_eq!(integer_words(21_000), "VEINTIUN MIL");
        assert_eq!(integer_words(31_001), "TREINTA Y UN MIL UNO");
        assert_eq!(integer_words(1_000_000), "UN MILLON");
        assert_eq!(integer_words(2_500_001), "DOS MILLONES QUINIENTOS MIL UNO");
        assert_eq!(integer_words(201_000_000), "DOSCIENTOS UN MILLONES");
        assert_eq!(integer_words(16), "DIECISEIS");
        assert_eq!(integer_words(90), "NOVENTA");
    }

    #[test]
    fn qr_payload_follows_sunat_layout() {
        let payload = sunat_qr_payload(
            "20601234567",
            TIPO_FACTURA,
            "F001",
            12,
            d("180"),
            d("1180"),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            "6",
            "20100070970",
        );
        assert_eq!(
            payload,
            "20601234567|01|F001|00000012|180.00|1180.00|2025-03-01|6|20100070970|"
        );
    }
}
