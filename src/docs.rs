// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "ERP Envases", description = "API del ERP de fabricación y venta de envases"),
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::list_users,
        handlers::auth::create_user,

        // --- Directorio ---
        handlers::directory::list_employees,
        handlers::directory::get_employee,
        handlers::directory::create_employee,
        handlers::directory::update_employee,
        handlers::directory::delete_employee,
        handlers::directory::list_clients,
        handlers::directory::get_client,
        handlers::directory::create_client,
        handlers::directory::update_client,
        handlers::directory::delete_client,
        handlers::directory::list_suppliers,
        handlers::directory::get_supplier,
        handlers::directory::create_supplier,
        handlers::directory::update_supplier,
        handlers::directory::delete_supplier,
        handlers::directory::list_vehicles,
        handlers::directory::get_vehicle,
        handlers::directory::create_vehicle,
        handlers::directory::update_vehicle,
        handlers::directory::delete_vehicle,

        // --- Consultas RUC/DNI ---
        handlers::identity::lookup_ruc,
        handlers::identity::lookup_dni,

        // --- INVENTARIO ---
        handlers::inventory::list_products,
        handlers::inventory::list_low_stock,
        handlers::inventory::get_product,
        handlers::inventory::create_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,
        handlers::inventory::get_kardex,
        handlers::inventory::get_recipe,
        handlers::inventory::set_recipe,
        handlers::inventory::register_entry,

        // --- Ajustes ---
        handlers::adjustments::list_adjustments,
        handlers::adjustments::physical_count,
        handlers::adjustments::create_adjustment,
        handlers::adjustments::approve_adjustment,
        handlers::adjustments::reject_adjustment,

        // --- Producción ---
        handlers::production::list_orders,
        handlers::production::get_order,
        handlers::production::create_order,
        handlers::production::start_order,
        handlers::production::pause_order,
        handlers::production::resume_order,
        handlers::production::finish_order,
        handlers::production::cancel_order,

        // --- VENTAS ---
        handlers::sales::list_orders,
        handlers::sales::get_order,
        handlers::sales::create_order,
        handlers::sales::update_order,
        handlers::sales::approve_order,
        handlers::sales::reject_order,
        handlers::sales::cancel_order,

        // --- Guías ---
        handlers::dispatch::list_guides,
        handlers::dispatch::get_guide,
        handlers::dispatch::create_guide,
        handlers::dispatch::dispatch_guide,
        handlers::dispatch::deliver_guide,
        handlers::dispatch::cancel_guide,

        // --- FINANZAS ---
        handlers::finance::list_payments,
        handlers::finance::register_payment,
        handlers::finance::delete_payment,
        handlers::finance::list_receivables,
        handlers::finance::client_debt,
        handlers::finance::list_credit_requests,
        handlers::finance::request_credit,
        handlers::finance::approve_credit,
        handlers::finance::reject_credit,

        // --- Configuración ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Documentos ---
        handlers::documents::quotation_pdf,
        handlers::documents::invoice_pdf,
        handlers::documents::delivery_guide_pdf,
        handlers::documents::account_statement_pdf,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Rol,
            models::auth::Usuario,
            models::auth::LoginPayload,
            models::auth::CreateUserPayload,
            models::auth::AuthResponse,

            // --- Directorio ---
            models::directory::TipoDocumento,
            models::directory::Empleado,
            models::directory::Cliente,
            models::directory::Proveedor,
            models::directory::EstadoVehiculo,
            models::directory::Vehiculo,
            models::directory::EmpleadoPayload,
            models::directory::ClientePayload,
            models::directory::ProveedorPayload,
            models::directory::VehiculoPayload,
            models::identity::ConsultaIdentidad,

            // --- Inventario ---
            models::inventory::TipoProducto,
            models::inventory::Producto,
            models::inventory::ComponenteReceta,
            models::inventory::TipoMovimiento,
            models::inventory::MotivoMovimiento,
            models::inventory::MovimientoInventario,
            models::inventory::Kardex,
            models::inventory::CreateProductoPayload,
            models::inventory::UpdateProductoPayload,
            models::inventory::ComponentePayload,
            models::inventory::RecetaPayload,
            models::inventory::EntradaPayload,

            // --- Ajustes ---
            models::inventory::TipoAjuste,
            models::inventory::OrigenAjuste,
            models::inventory::EstadoAjuste,
            models::inventory::AjusteInventario,
            models::inventory::ConteoFisicoPayload,
            models::inventory::AjusteManualPayload,

            // --- Producción ---
            models::production::EstadoProduccion,
            models::production::OrdenProduccion,
            models::production::ConsumoProduccion,
            models::production::OrdenProduccionDetalle,
            models::production::CreateProduccionPayload,
            models::production::FinalizarProduccionPayload,

            // --- Ventas ---
            models::sales::EstadoVerificacion,
            models::sales::EstadoOrdenVenta,
            models::sales::EstadoPago,
            models::sales::CondicionPago,
            models::sales::OrdenVenta,
            models::sales::DetalleOrdenVenta,
            models::sales::OrdenVentaDetalle,
            models::sales::LineaVentaPayload,
            models::sales::OrdenVentaPayload,

            // --- Guías ---
            models::dispatch::EstadoGuia,
            models::dispatch::ModalidadTransporte,
            models::dispatch::GuiaRemision,
            models::dispatch::DetalleGuia,
            models::dispatch::GuiaRemisionDetalle,
            models::dispatch::CreateGuiaPayload,

            // --- FINANZAS ---
            models::finance::MetodoPago,
            models::finance::EstadoSolicitudCredito,
            models::finance::Pago,
            models::finance::DocumentoPorCobrar,
            models::finance::ResumenDeuda,
            models::finance::SolicitudCredito,
            models::finance::PagoPayload,
            models::finance::SolicitudCreditoPayload,
            models::finance::AprobarCreditoPayload,

            // --- Configuración ---
            models::settings::ConfiguracionEmpresa,
            models::settings::UpdateConfiguracionPayload,

            // --- Revisión ---
            models::review::MotivoPayload,
            models::review::ObservacionPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticación"),
        (name = "Users", description = "Usuarios del sistema"),
        (name = "Empleados", description = "Personal de la empresa"),
        (name = "Clientes", description = "Cartera de clientes"),
        (name = "Proveedores", description = "Proveedores de insumos"),
        (name = "Flota", description = "Vehículos propios"),
        (name = "Consultas", description = "Consulta de RUC y DNI"),
        (name = "Inventario", description = "Productos, recetas y kardex"),
        (name = "Ajustes", description = "Conteos físicos y ajustes de inventario"),
        (name = "Producción", description = "Órdenes de producción"),
        (name = "Ventas", description = "Órdenes de venta y verificación"),
        (name = "Guías", description = "Guías de remisión y despacho"),
        (name = "Finanzas", description = "Pagos y cuentas por cobrar"),
        (name = "Créditos", description = "Solicitudes de crédito"),
        (name = "Configuración", description = "Datos de la empresa"),
        (name = "Documentos", description = "Cotizaciones, facturas y guías en PDF")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_registers_bearer_scheme_and_main_routes() {
        let doc = ApiDoc::openapi();

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(doc.paths.paths.contains_key("/api/ventas/{id}/aprobar"));
        assert!(doc.paths.paths.contains_key("/api/guias/{id}/despachar"));
    }
}
