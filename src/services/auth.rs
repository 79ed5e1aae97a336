// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, UpdateProfilePayload, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(String, User), AppError> {
        // O hashing do bcrypt é pesado: roda fora do executor async
        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        // Se o e-mail já existir, a constraint do banco devolve
        // EmailAlreadyExists pelo repositório.
        let new_user = self
            .user_repo
            .create_user(name, email, &hashed_password)
            .await?;

        let token = self.create_token(new_user.id)?;
        Ok((token, new_user))
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        // Mesmo erro para "não existe" e "senha errada": não vazamos qual foi.
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(user.id)?;
        Ok((token, user))
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    // Mescla os campos presentes do payload sobre o usuário atual e regrava.
    // E-mail e senha ficam de fora deste caminho.
    pub async fn update_profile(
        &self,
        mut user: User,
        payload: UpdateProfilePayload,
    ) -> Result<User, AppError> {
        if let Some(name) = payload.name {
            user.name = name;
        }
        if let Some(company_name) = payload.company_name {
            user.company_name = Some(company_name);
        }
        if let Some(company_address) = payload.company_address {
            user.company_address = Some(company_address);
        }
        if let Some(company_phone) = payload.company_phone {
            user.company_phone = Some(company_phone);
        }
        if let Some(company_email) = payload.company_email {
            user.company_email = Some(company_email);
        }
        if let Some(tax_id) = payload.tax_id {
            user.tax_id = Some(tax_id);
        }
        if let Some(logo) = payload.logo {
            user.logo = Some(logo);
        }

        self.user_repo.update_profile(&user).await
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
