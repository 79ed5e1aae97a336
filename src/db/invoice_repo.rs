// src/db/invoice_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::invoice::{Invoice, InvoiceStats},
};

// Repositório de faturas. Mesma regra dos clientes: tudo filtra por
// `user_id`, exceto a unicidade do número da fatura, que é global.
#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, invoice: &Invoice) -> Result<Invoice, AppError> {
        sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                id, user_id, invoice_number, client_id,
                client_name, client_email, client_address,
                items, subtotal, tax_amount, discount, discount_type, total,
                currency, status, issue_date, due_date, notes, terms,
                created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            RETURNING *
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.user_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.client_id)
        .bind(&invoice.client_name)
        .bind(&invoice.client_email)
        .bind(&invoice.client_address)
        .bind(&invoice.items)
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.discount)
        .bind(invoice.discount_type)
        .bind(invoice.total)
        .bind(&invoice.currency)
        .bind(invoice.status)
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(&invoice.notes)
        .bind(&invoice.terms)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // A constraint UNIQUE de invoice_number cobre o sistema inteiro;
            // numa corrida entre dois creates, um dos dois cai aqui.
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateInvoiceNumber(invoice.invoice_number.clone());
                }
            }
            AppError::DatabaseError(e)
        })
    }

    // Listagem com filtros opcionais, mais recentes primeiro.
    // `status` compara por igualdade exata; `search` casa com o número
    // da fatura OU o nome do cliente, sem diferenciar maiúsculas.
    pub async fn list(
        &self,
        user_id: Uuid,
        status: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<Invoice>, AppError> {
        let search_term = search.map(|s| format!("%{}%", escape_like(s)));

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE user_id = $1
              AND ($2::text IS NULL OR status::text = $2)
              AND ($3::text IS NULL OR invoice_number ILIKE $3 OR client_name ILIKE $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(search_term)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    pub async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    // Regrava a fatura inteira já mesclada e recalculada pelo service.
    pub async fn update(&self, invoice: &Invoice) -> Result<Invoice, AppError> {
        sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices SET
                invoice_number = $3,
                client_id = $4,
                client_name = $5,
                client_email = $6,
                client_address = $7,
                items = $8,
                subtotal = $9,
                tax_amount = $10,
                discount = $11,
                discount_type = $12,
                total = $13,
                currency = $14,
                status = $15,
                issue_date = $16,
                due_date = $17,
                notes = $18,
                terms = $19,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.user_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.client_id)
        .bind(&invoice.client_name)
        .bind(&invoice.client_email)
        .bind(&invoice.client_address)
        .bind(&invoice.items)
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.discount)
        .bind(invoice.discount_type)
        .bind(invoice.total)
        .bind(&invoice.currency)
        .bind(invoice.status)
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(&invoice.notes)
        .bind(&invoice.terms)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Trocar o número da fatura também pode violar a unicidade
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateInvoiceNumber(invoice.invoice_number.clone());
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // Agregação sempre calculada na hora, numa única passada.
    // Pendente = sent ou draft (fatura ainda não recebida).
    pub async fn stats(&self, user_id: Uuid) -> Result<InvoiceStats, AppError> {
        let stats = sqlx::query_as::<_, InvoiceStats>(
            r#"
            SELECT
                COUNT(*)                                        AS total_invoices,
                COUNT(*) FILTER (WHERE status = 'paid')         AS paid_invoices,
                COUNT(*) FILTER (WHERE status IN ('sent', 'draft')) AS pending_invoices,
                COUNT(*) FILTER (WHERE status = 'overdue')      AS overdue_invoices,
                COALESCE(SUM(total) FILTER (WHERE status = 'paid'), 0)              AS total_revenue,
                COALESCE(SUM(total) FILTER (WHERE status IN ('sent', 'draft')), 0)  AS pending_amount
            FROM invoices
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

// Escapa os curingas do ILIKE para o termo buscado valer literalmente
// (buscar "100%" não pode casar com "1009").
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ClientRepository, UserRepository};
    use crate::models::client::Client;
    use crate::models::invoice::{DiscountType, InvoiceStatus};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use sqlx::types::Json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // Cria um usuário com um cliente cadastrado e devolve os dois IDs
    async fn seed_owner(pool: &PgPool, email: &str) -> (Uuid, Uuid) {
        let user = UserRepository::new(pool.clone())
            .create_user("Dono", email, "hash-de-teste")
            .await
            .unwrap();

        let client = ClientRepository::new(pool.clone())
            .create(&Client {
                id: Uuid::new_v4(),
                user_id: user.id,
                name: "Maria da Silva".to_string(),
                company: None,
                email: "maria@email.com".to_string(),
                phone: None,
                address: None,
                city: None,
                state: None,
                zip_code: None,
                country: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        (user.id, client.id)
    }

    fn make_invoice(
        user_id: Uuid,
        client_id: Uuid,
        number: &str,
        client_name: &str,
        status: InvoiceStatus,
        total: &str,
    ) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            user_id,
            invoice_number: number.to_string(),
            client_id,
            client_name: client_name.to_string(),
            client_email: "maria@email.com".to_string(),
            client_address: None,
            items: Json(vec![]),
            subtotal: dec(total),
            tax_amount: dec("0"),
            discount: dec("0"),
            discount_type: DiscountType::Fixed,
            total: dec(total),
            currency: "USD".to_string(),
            status,
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            notes: None,
            terms: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn escape_de_curingas_do_ilike() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c\\d"), "c\\\\d");
        assert_eq!(escape_like("INV-001"), "INV-001");
    }

    #[sqlx::test]
    async fn filtro_de_status_respeita_o_dono(pool: PgPool) {
        let repo = InvoiceRepository::new(pool.clone());
        let (owner_a, client_a) = seed_owner(&pool, "a@email.com").await;
        let (owner_b, client_b) = seed_owner(&pool, "b@email.com").await;

        repo.create(&make_invoice(owner_a, client_a, "INV-A1", "Maria", InvoiceStatus::Paid, "100"))
            .await
            .unwrap();
        repo.create(&make_invoice(owner_a, client_a, "INV-A2", "Maria", InvoiceStatus::Draft, "200"))
            .await
            .unwrap();
        // Fatura paga de OUTRO dono: não pode aparecer na lista do A
        repo.create(&make_invoice(owner_b, client_b, "INV-B1", "Maria", InvoiceStatus::Paid, "300"))
            .await
            .unwrap();

        let paid = repo.list(owner_a, Some("paid"), None).await.unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].invoice_number, "INV-A1");

        let all = repo.list(owner_a, None, None).await.unwrap();
        assert_eq!(all.len(), 2);

        // Status desconhecido filtra tudo, sem erro
        let none = repo.list(owner_a, Some("foo"), None).await.unwrap();
        assert!(none.is_empty());
    }

    #[sqlx::test]
    async fn busca_por_numero_ou_nome_sem_diferenciar_caixa(pool: PgPool) {
        let repo = InvoiceRepository::new(pool.clone());
        let (owner, client_id) = seed_owner(&pool, "a@email.com").await;

        repo.create(&make_invoice(owner, client_id, "INV-001", "Maria da Silva", InvoiceStatus::Draft, "100"))
            .await
            .unwrap();
        repo.create(&make_invoice(owner, client_id, "FAT-900", "Projeto inv-001 Ltda", InvoiceStatus::Draft, "100"))
            .await
            .unwrap();
        repo.create(&make_invoice(owner, client_id, "FAT-901", "Outro Cliente", InvoiceStatus::Draft, "100"))
            .await
            .unwrap();

        // Casa com o número OU com o nome do cliente, sem diferenciar caixa
        let hits = repo.list(owner, None, Some("inv-001")).await.unwrap();
        assert_eq!(hits.len(), 2);

        let by_name = repo.list(owner, None, Some("MARIA")).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].invoice_number, "INV-001");
    }

    #[sqlx::test]
    async fn busca_trata_curingas_como_literais(pool: PgPool) {
        let repo = InvoiceRepository::new(pool.clone());
        let (owner, client_id) = seed_owner(&pool, "a@email.com").await;

        repo.create(&make_invoice(owner, client_id, "DESC-100%", "Maria", InvoiceStatus::Draft, "100"))
            .await
            .unwrap();
        repo.create(&make_invoice(owner, client_id, "DESC-1009", "Maria", InvoiceStatus::Draft, "100"))
            .await
            .unwrap();

        let hits = repo.list(owner, None, Some("100%")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].invoice_number, "DESC-100%");
    }

    #[sqlx::test]
    async fn numero_de_fatura_e_unico_entre_donos(pool: PgPool) {
        let repo = InvoiceRepository::new(pool.clone());
        let (owner_a, client_a) = seed_owner(&pool, "a@email.com").await;
        let (owner_b, client_b) = seed_owner(&pool, "b@email.com").await;

        repo.create(&make_invoice(owner_a, client_a, "INV-DUP", "Maria", InvoiceStatus::Draft, "100"))
            .await
            .unwrap();

        // Mesmo número em dono DIFERENTE: a unicidade é global
        let result = repo
            .create(&make_invoice(owner_b, client_b, "INV-DUP", "Maria", InvoiceStatus::Draft, "100"))
            .await;

        assert!(matches!(
            result,
            Err(AppError::DuplicateInvoiceNumber(n)) if n == "INV-DUP"
        ));
    }

    #[sqlx::test]
    async fn fatura_de_outro_dono_e_invisivel(pool: PgPool) {
        let repo = InvoiceRepository::new(pool.clone());
        let (owner_a, client_a) = seed_owner(&pool, "a@email.com").await;
        let (owner_b, _) = seed_owner(&pool, "b@email.com").await;

        let invoice = repo
            .create(&make_invoice(owner_a, client_a, "INV-001", "Maria", InvoiceStatus::Draft, "100"))
            .await
            .unwrap();

        // Para o outro dono, o registro se comporta como inexistente
        assert!(repo.find_by_id(owner_b, invoice.id).await.unwrap().is_none());
        assert_eq!(repo.delete(owner_b, invoice.id).await.unwrap(), 0);

        // Um ID que nunca existiu tem exatamente a mesma cara
        assert!(repo.find_by_id(owner_a, Uuid::new_v4()).await.unwrap().is_none());

        // E o dono verdadeiro continua enxergando
        assert!(repo.find_by_id(owner_a, invoice.id).await.unwrap().is_some());
    }

    #[sqlx::test]
    async fn estatisticas_por_dono(pool: PgPool) {
        let repo = InvoiceRepository::new(pool.clone());
        let (owner_a, client_a) = seed_owner(&pool, "a@email.com").await;
        let (owner_b, _) = seed_owner(&pool, "b@email.com").await;

        repo.create(&make_invoice(owner_a, client_a, "INV-001", "Maria", InvoiceStatus::Paid, "900"))
            .await
            .unwrap();
        repo.create(&make_invoice(owner_a, client_a, "INV-002", "Maria", InvoiceStatus::Draft, "500"))
            .await
            .unwrap();

        let stats = repo.stats(owner_a).await.unwrap();
        assert_eq!(stats.total_invoices, 2);
        assert_eq!(stats.paid_invoices, 1);
        assert_eq!(stats.pending_invoices, 1);
        assert_eq!(stats.overdue_invoices, 0);
        assert_eq!(stats.total_revenue, dec("900"));
        assert_eq!(stats.pending_amount, dec("500"));

        // Dono sem faturas: tudo zerado (as somas não podem vir nulas)
        let empty = repo.stats(owner_b).await.unwrap();
        assert_eq!(empty.total_invoices, 0);
        assert_eq!(empty.total_revenue, Decimal::ZERO);
        assert_eq!(empty.pending_amount, Decimal::ZERO);
    }
}
