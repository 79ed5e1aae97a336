// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_profile,
        handlers::auth::update_profile,

        // --- Clients ---
        handlers::clients::create_client,
        handlers::clients::list_clients,
        handlers::clients::get_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,

        // --- Invoices ---
        handlers::invoices::create_invoice,
        handlers::invoices::list_invoices,
        handlers::invoices::invoice_stats,
        handlers::invoices::get_invoice,
        handlers::invoices::update_invoice,
        handlers::invoices::delete_invoice,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateProfilePayload,
            models::auth::AuthResponse,

            // --- Clients ---
            models::client::Client,
            models::client::CreateClientPayload,
            models::client::UpdateClientPayload,

            // --- Invoices ---
            models::invoice::InvoiceStatus,
            models::invoice::DiscountType,
            models::invoice::LineItem,
            models::invoice::LineItemPayload,
            models::invoice::Invoice,
            models::invoice::CreateInvoicePayload,
            models::invoice::UpdateInvoicePayload,
            models::invoice::InvoiceStats,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, Registro e Perfil"),
        (name = "Clients", description = "Clientes do usuário (destinatários das faturas)"),
        (name = "Invoices", description = "Faturas, filtros e estatísticas")
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
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
