// src/db/client_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::client::Client};

// Repositório de clientes. Toda consulta filtra por `user_id`:
// um cliente de outro dono é indistinguível de um inexistente.
#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, client: &Client) -> Result<Client, AppError> {
        let created = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                id, user_id, name, company, email, phone,
                address, city, state, zip_code, country, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(client.id)
        .bind(client.user_id)
        .bind(&client.name)
        .bind(&client.company)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(&client.city)
        .bind(&client.state)
        .bind(&client.zip_code)
        .bind(&client.country)
        .bind(client.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    // Lista os clientes do dono, mais recentes primeiro
    pub async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    pub async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    // Regrava o registro completo; a mesclagem parcial fica no service.
    // `user_id` nunca muda.
    pub async fn update(&self, client: &Client) -> Result<Client, AppError> {
        let updated = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients SET
                name = $3,
                company = $4,
                email = $5,
                phone = $6,
                address = $7,
                city = $8,
                state = $9,
                zip_code = $10,
                country = $11
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(client.id)
        .bind(client.user_id)
        .bind(&client.name)
        .bind(&client.company)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(&client.city)
        .bind(&client.state)
        .bind(&client.zip_code)
        .bind(&client.country)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    // Remoção permanente. Retorna quantas linhas sumiram (0 = não achou).
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
