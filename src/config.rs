// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    db::{ClientRepository, InvoiceRepository, UserRepository},
    services::{auth::AuthService, client_service::ClientService, invoice_service::InvoiceService},
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub client_service: ClientService,
    pub invoice_service: InvoiceService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let client_repo = ClientRepository::new(db_pool.clone());
        let invoice_repo = InvoiceRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret);
        let client_service = ClientService::new(client_repo.clone());
        let invoice_service = InvoiceService::new(invoice_repo, client_repo);

        Ok(Self {
            db_pool,
            auth_service,
            client_service,
            invoice_service,
        })
    }
}
