// src/services/client_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ClientRepository,
    models::client::{Client, CreateClientPayload, UpdateClientPayload},
};

#[derive(Clone)]
pub struct ClientService {
    client_repo: ClientRepository,
}

impl ClientService {
    pub fn new(client_repo: ClientRepository) -> Self {
        Self { client_repo }
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateClientPayload) -> Result<Client, AppError> {
        let client = Client {
            id: Uuid::new_v4(),
            user_id,
            name: payload.name,
            company: payload.company,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            city: payload.city,
            state: payload.state,
            zip_code: payload.zip_code,
            country: payload.country,
            created_at: Utc::now(),
        };

        self.client_repo.create(&client).await
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Client>, AppError> {
        self.client_repo.list_by_owner(user_id).await
    }

    pub async fn get_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Client, AppError> {
        self.client_repo
            .find_by_id(user_id, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    // Sobrescrita parcial: campo presente substitui, ausente fica.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: UpdateClientPayload,
    ) -> Result<Client, AppError> {
        let mut client = self.get_by_id(user_id, id).await?;

        if let Some(name) = payload.name {
            client.name = name;
        }
        if let Some(company) = payload.company {
            client.company = Some(company);
        }
        if let Some(email) = payload.email {
            client.email = email;
        }
        if let Some(phone) = payload.phone {
            client.phone = Some(phone);
        }
        if let Some(address) = payload.address {
            client.address = Some(address);
        }
        if let Some(city) = payload.city {
            client.city = Some(city);
        }
        if let Some(state) = payload.state {
            client.state = Some(state);
        }
        if let Some(zip_code) = payload.zip_code {
            client.zip_code = Some(zip_code);
        }
        if let Some(country) = payload.country {
            client.country = Some(country);
        }

        self.client_repo.update(&client).await
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let deleted = self.client_repo.delete(user_id, id).await?;
        if deleted == 0 {
            // Inexistente ou de outro dono: resposta idêntica.
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
