// src/services/invoice_service.rs

use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ClientRepository, InvoiceRepository},
    models::{
        client::Client,
        invoice::{CreateInvoicePayload, Invoice, InvoiceStats, UpdateInvoicePayload},
    },
    services::totals::{build_items, calculate_invoice_totals},
};

#[derive(Clone)]
pub struct InvoiceService {
    invoice_repo: InvoiceRepository,
    client_repo: ClientRepository,
}

impl InvoiceService {
    pub fn new(invoice_repo: InvoiceRepository, client_repo: ClientRepository) -> Self {
        Self { invoice_repo, client_repo }
    }

    // Criação: os itens vêm crus do cliente e TUDO que é derivado
    // (amount por item, subtotal, imposto, total) é recalculado aqui.
    // Agregados enviados no payload nem existem no tipo, então não há
    // como o caller adulterar os totais.
    pub async fn create(
        &self,
        user_id: Uuid,
        payload: CreateInvoicePayload,
    ) -> Result<Invoice, AppError> {
        let items = build_items(&payload.items)?;
        let totals = calculate_invoice_totals(&items, payload.discount, payload.discount_type)?;

        // Snapshot do cliente no momento da emissão. A busca já é
        // escopada pelo dono: cliente de outro usuário vira 404.
        let client = self
            .client_repo
            .find_by_id(user_id, payload.client_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = Utc::now();
        let invoice = Invoice {
            id: Uuid::new_v4(),
            user_id,
            invoice_number: payload.invoice_number,
            client_id: client.id,
            client_name: client.name.clone(),
            client_email: client.email.clone(),
            client_address: format_client_address(&client),
            items: Json(items),
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            discount: payload.discount,
            discount_type: payload.discount_type,
            total: totals.total,
            currency: payload.currency,
            status: payload.status,
            issue_date: payload.issue_date,
            due_date: payload.due_date,
            notes: payload.notes,
            terms: payload.terms,
            created_at: now,
            updated_at: now,
        };

        self.invoice_repo.create(&invoice).await
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        status: Option<String>,
        search: Option<String>,
    ) -> Result<Vec<Invoice>, AppError> {
        let status = normalize_status_filter(status);
        self.invoice_repo
            .list(user_id, status.as_deref(), search.as_deref())
            .await
    }

    pub async fn get_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Invoice, AppError> {
        self.invoice_repo
            .find_by_id(user_id, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    // Atualização parcial. Se o clientId vier no patch, o snapshot do
    // cliente é refeito; os totais são sempre recalculados a partir do
    // resultado da mesclagem, nunca aceitos de fora.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: UpdateInvoicePayload,
    ) -> Result<Invoice, AppError> {
        let mut invoice = self.get_by_id(user_id, id).await?;

        if let Some(client_id) = payload.client_id {
            let client = self
                .client_repo
                .find_by_id(user_id, client_id)
                .await?
                .ok_or(AppError::NotFound)?;

            invoice.client_id = client.id;
            invoice.client_name = client.name.clone();
            invoice.client_email = client.email.clone();
            invoice.client_address = format_client_address(&client);
        }

        apply_invoice_patch(&mut invoice, payload)?;

        self.invoice_repo.update(&invoice).await
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let deleted = self.invoice_repo.delete(user_id, id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<InvoiceStats, AppError> {
        self.invoice_repo.stats(user_id).await
    }
}

// "all", string vazia ou ausente = sem filtro de status.
// (?status= sem valor chega como Some("") e não pode virar filtro.)
fn normalize_status_filter(status: Option<String>) -> Option<String> {
    status.filter(|s| s != "all" && !s.is_empty())
}

// Endereço desnormalizado gravado na fatura: as partes preenchidas do
// cadastro do cliente, separadas por vírgula.
fn format_client_address(client: &Client) -> Option<String> {
    let parts: Vec<&str> = [
        client.address.as_deref(),
        client.city.as_deref(),
        client.state.as_deref(),
        client.zip_code.as_deref(),
        client.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|p| !p.is_empty())
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

// Mescla os campos presentes do patch sobre a fatura e recalcula os
// agregados. O snapshot do cliente já foi tratado pelo caller.
fn apply_invoice_patch(
    invoice: &mut Invoice,
    payload: UpdateInvoicePayload,
) -> Result<(), AppError> {
    if let Some(invoice_number) = payload.invoice_number {
        invoice.invoice_number = invoice_number;
    }
    if let Some(items) = payload.items {
        invoice.items = Json(build_items(&items)?);
    }
    if let Some(discount) = payload.discount {
        invoice.discount = discount;
    }
    if let Some(discount_type) = payload.discount_type {
        invoice.discount_type = discount_type;
    }
    if let Some(currency) = payload.currency {
        invoice.currency = currency;
    }
    if let Some(status) = payload.status {
        invoice.status = status;
    }
    if let Some(issue_date) = payload.issue_date {
        invoice.issue_date = issue_date;
    }
    if let Some(due_date) = payload.due_date {
        invoice.due_date = due_date;
    }
    if let Some(notes) = payload.notes {
        invoice.notes = Some(notes);
    }
    if let Some(terms) = payload.terms {
        invoice.terms = Some(terms);
    }

    let totals =
        calculate_invoice_totals(&invoice.items.0, invoice.discount, invoice.discount_type)?;
    invoice.subtotal = totals.subtotal;
    invoice.tax_amount = totals.tax_amount;
    invoice.total = totals.total;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::{DiscountType, InvoiceStatus, LineItem, LineItemPayload};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn base_invoice() -> Invoice {
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            invoice_number: "INV-001".to_string(),
            client_id: Uuid::new_v4(),
            client_name: "Maria".to_string(),
            client_email: "maria@email.com".to_string(),
            client_address: None,
            items: Json(vec![LineItem {
                description: "Serviço".to_string(),
                quantity: dec("1"),
                rate: dec("1000"),
                tax: dec("0"),
                amount: dec("1000"),
            }]),
            subtotal: dec("1000.00"),
            tax_amount: dec("0.00"),
            discount: dec("0"),
            discount_type: DiscountType::Fixed,
            total: dec("1000.00"),
            currency: "USD".to_string(),
            status: InvoiceStatus::Draft,
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            notes: None,
            terms: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn empty_patch() -> UpdateInvoicePayload {
        UpdateInvoicePayload {
            invoice_number: None,
            client_id: None,
            items: None,
            discount: None,
            discount_type: None,
            currency: None,
            status: None,
            issue_date: None,
            due_date: None,
            notes: None,
            terms: None,
        }
    }

    #[test]
    fn patch_vazio_nao_muda_nada() {
        let mut invoice = base_invoice();
        let before = invoice.clone();

        apply_invoice_patch(&mut invoice, empty_patch()).unwrap();

        assert_eq!(invoice.invoice_number, before.invoice_number);
        assert_eq!(invoice.items.0, before.items.0);
        assert_eq!(invoice.subtotal, before.subtotal);
        assert_eq!(invoice.total, before.total);
        assert_eq!(invoice.status, before.status);
    }

    #[test]
    fn patch_de_desconto_recalcula_totais() {
        let mut invoice = base_invoice();
        let patch = UpdateInvoicePayload {
            discount: Some(dec("10")),
            discount_type: Some(DiscountType::Percentage),
            ..empty_patch()
        };

        apply_invoice_patch(&mut invoice, patch).unwrap();

        assert_eq!(invoice.subtotal, dec("1000.00"));
        assert_eq!(invoice.total, dec("900.00"));
    }

    #[test]
    fn patch_de_itens_substitui_e_recalcula() {
        let mut invoice = base_invoice();
        let patch = UpdateInvoicePayload {
            items: Some(vec![LineItemPayload {
                description: "Novo item".to_string(),
                quantity: dec("2"),
                rate: dec("100"),
                tax: dec("10"),
            }]),
            ..empty_patch()
        };

        apply_invoice_patch(&mut invoice, patch).unwrap();

        assert_eq!(invoice.items.0.len(), 1);
        assert_eq!(invoice.items.0[0].amount, dec("220"));
        assert_eq!(invoice.subtotal, dec("200.00"));
        assert_eq!(invoice.tax_amount, dec("20.00"));
        assert_eq!(invoice.total, dec("220.00"));
    }

    #[test]
    fn patch_de_status_nao_toca_nos_valores() {
        let mut invoice = base_invoice();
        let patch = UpdateInvoicePayload {
            status: Some(InvoiceStatus::Paid),
            ..empty_patch()
        };

        apply_invoice_patch(&mut invoice, patch).unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.total, dec("1000.00"));
    }

    #[test]
    fn filtro_de_status_normalizado() {
        assert_eq!(
            normalize_status_filter(Some("paid".to_string())),
            Some("paid".to_string())
        );
        assert_eq!(normalize_status_filter(Some("all".to_string())), None);
        assert_eq!(normalize_status_filter(Some("".to_string())), None);
        assert_eq!(normalize_status_filter(None), None);
    }

    #[test]
    fn endereco_do_snapshot_junta_as_partes() {
        let client = Client {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Maria".to_string(),
            company: None,
            email: "maria@email.com".to_string(),
            phone: None,
            address: Some("Rua das Flores, 123".to_string()),
            city: Some("São Paulo".to_string()),
            state: Some("SP".to_string()),
            zip_code: None,
            country: Some("Brasil".to_string()),
            created_at: Utc::now(),
        };

        assert_eq!(
            format_client_address(&client),
            Some("Rua das Flores, 123, São Paulo, SP, Brasil".to_string())
        );

        let sem_endereco = Client {
            address: None,
            city: None,
            state: None,
            country: None,
            ..client
        };
        assert_eq!(format_client_address(&sem_endereco), None);
    }
}
