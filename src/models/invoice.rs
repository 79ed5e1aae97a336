// src/models/invoice.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

// --- Enums (Mapeando o Postgres) ---

// Mapeia o CREATE TYPE invoice_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "discount_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage, // Percentual sobre o subtotal
    Fixed,      // Valor fixo em moeda
}

// --- Itens da Fatura ---

// Uma linha da fatura, guardada como JSONB dentro do registro.
// O campo `amount` é sempre derivado (quantity * rate * (1 + tax/100));
// nunca vem do cliente.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[schema(example = "Consultoria (10h)")]
    pub description: String,

    #[schema(value_type = f64, example = 10.0)]
    pub quantity: Decimal,

    #[schema(value_type = f64, example = 150.0)]
    pub rate: Decimal,

    // Percentual de imposto do item (0 a 100)
    #[schema(value_type = f64, example = 5.0)]
    pub tax: Decimal,

    #[schema(value_type = f64, example = 1575.0)]
    pub amount: Decimal,
}

// Linha enviada pelo cliente ao criar/editar uma fatura.
// Note a ausência de `amount`: o servidor recalcula tudo.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPayload {
    #[validate(length(min = 1, message = "A descrição do item é obrigatória."))]
    #[schema(example = "Consultoria (10h)")]
    pub description: String,

    #[schema(value_type = f64, example = 10.0)]
    pub quantity: Decimal,

    #[schema(value_type = f64, example = 150.0)]
    pub rate: Decimal,

    #[serde(default)]
    #[schema(value_type = f64, example = 5.0)]
    pub tax: Decimal,
}

// --- A Fatura ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,

    // Dono da fatura. Todas as consultas filtram por ele.
    pub user_id: Uuid,

    #[schema(example = "INV-20240115-001")]
    pub invoice_number: String,

    pub client_id: Uuid,

    // Snapshot desnormalizado do cliente no momento da emissão.
    // Se o cadastro do cliente mudar depois, a fatura não muda junto.
    #[schema(example = "Maria da Silva")]
    pub client_name: String,
    #[schema(example = "maria@email.com")]
    pub client_email: String,
    pub client_address: Option<String>,

    #[schema(value_type = Vec<LineItem>)]
    pub items: Json<Vec<LineItem>>,

    // Valores agregados, sempre calculados no servidor
    #[schema(value_type = f64, example = 1500.0)]
    pub subtotal: Decimal,
    #[schema(value_type = f64, example = 75.0)]
    pub tax_amount: Decimal,
    #[schema(value_type = f64, example = 10.0)]
    pub discount: Decimal,
    pub discount_type: DiscountType,
    #[schema(value_type = f64, example = 1425.0)]
    pub total: Decimal,

    #[schema(example = "USD")]
    pub currency: String,

    pub status: InvoiceStatus,

    #[schema(value_type = String, format = Date, example = "2024-01-15")]
    pub issue_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2024-02-15")]
    pub due_date: NaiveDate,

    pub notes: Option<String>,
    pub terms: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoicePayload {
    #[validate(length(min = 1, message = "O número da fatura é obrigatório."))]
    #[schema(example = "INV-20240115-001")]
    pub invoice_number: String,

    pub client_id: Uuid,

    #[validate(nested)]
    pub items: Vec<LineItemPayload>,

    #[serde(default)]
    #[schema(value_type = f64, example = 10.0)]
    pub discount: Decimal,

    #[serde(default = "default_discount_type")]
    pub discount_type: DiscountType,

    #[serde(default = "default_currency")]
    #[schema(example = "USD")]
    pub currency: String,

    #[serde(default = "default_status")]
    pub status: InvoiceStatus,

    #[schema(value_type = String, format = Date, example = "2024-01-15")]
    pub issue_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2024-02-15")]
    pub due_date: NaiveDate,

    pub notes: Option<String>,
    pub terms: Option<String>,
}

// Atualização parcial: campo ausente fica como está, e `null`
// explícito conta como ausente (não dá para limpar um campo com null).
// Os totais são recalculados a partir do resultado da mesclagem.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoicePayload {
    #[validate(length(min = 1, message = "O número da fatura não pode ser vazio."))]
    pub invoice_number: Option<String>,

    pub client_id: Option<Uuid>,

    #[validate(nested)]
    pub items: Option<Vec<LineItemPayload>>,

    #[schema(value_type = Option<f64>)]
    pub discount: Option<Decimal>,
    pub discount_type: Option<DiscountType>,

    pub currency: Option<String>,
    pub status: Option<InvoiceStatus>,

    #[schema(value_type = Option<String>, format = Date)]
    pub issue_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,

    pub notes: Option<String>,
    pub terms: Option<String>,
}

// Parâmetros de filtro do GET /api/invoices
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    // "all" (ou ausente) = sem filtro de status
    pub status: Option<String>,
    // Busca por número da fatura OU nome do cliente (case-insensitive)
    pub search: Option<String>,
}

// --- Estatísticas ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStats {
    #[schema(example = 12)]
    pub total_invoices: i64,
    #[schema(example = 5)]
    pub paid_invoices: i64,
    // Pendentes = sent ou draft
    #[schema(example = 6)]
    pub pending_invoices: i64,
    #[schema(example = 1)]
    pub overdue_invoices: i64,

    // Soma dos totais com status = paid
    #[schema(value_type = f64, example = 4500.0)]
    pub total_revenue: Decimal,
    // Soma dos totais com status em (sent, draft)
    #[schema(value_type = f64, example = 2300.0)]
    pub pending_amount: Decimal,
}

fn default_discount_type() -> DiscountType {
    DiscountType::Fixed
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_status() -> InvoiceStatus {
    InvoiceStatus::Draft
}
