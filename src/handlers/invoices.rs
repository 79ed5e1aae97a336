// src/handlers/invoices.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::invoice::{
        CreateInvoicePayload, Invoice, InvoiceStats, ListInvoicesQuery, UpdateInvoicePayload,
    },
};

// POST /api/invoices
#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = CreateInvoicePayload,
    responses(
        (status = 201, description = "Fatura criada com os totais calculados no servidor", body = Invoice),
        (status = 400, description = "Dados inválidos ou número de fatura duplicado"),
        (status = 404, description = "Cliente não encontrado"),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invoice = app_state.invoice_service.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

// GET /api/invoices?status=&search=
#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    params(
        ("status" = Option<String>, Query, description = "Filtro por status exato; 'all' ou ausente = todos"),
        ("search" = Option<String>, Query, description = "Busca por número da fatura ou nome do cliente")
    ),
    responses(
        (status = 200, description = "Faturas do usuário, mais recentes primeiro", body = Vec<Invoice>),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let invoices = app_state
        .invoice_service
        .list(user.id, query.status, query.search)
        .await?;

    Ok(Json(invoices))
}

// GET /api/invoices/stats
#[utoipa::path(
    get,
    path = "/api/invoices/stats",
    tag = "Invoices",
    responses(
        (status = 200, description = "Contagens e somas por status, calculadas na hora", body = InvoiceStats),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn invoice_stats(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<InvoiceStats>, AppError> {
    let stats = app_state.invoice_service.stats(user.id).await?;
    Ok(Json(stats))
}

// GET /api/invoices/{id}
#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura encontrada", body = Invoice),
        (status = 404, description = "Não encontrada (ou de outro usuário)")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    let invoice = app_state.invoice_service.get_by_id(user.id, id).await?;
    Ok(Json(invoice))
}

// PUT /api/invoices/{id}
#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    request_body = UpdateInvoicePayload,
    responses(
        (status = 200, description = "Fatura atualizada e recalculada", body = Invoice),
        (status = 400, description = "Dados inválidos ou número de fatura duplicado"),
        (status = 404, description = "Não encontrada (ou de outro usuário)")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoicePayload>,
) -> Result<Json<Invoice>, AppError> {
    payload.validate()?;

    let invoice = app_state
        .invoice_service
        .update(user.id, id, payload)
        .await?;

    Ok(Json(invoice))
}

// DELETE /api/invoices/{id}
#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura removida permanentemente"),
        (status = 404, description = "Não encontrada (ou de outro usuário)")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_invoice(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.invoice_service.delete(user.id, id).await?;
    Ok(Json(json!({ "message": "Fatura removida com sucesso." })))
}
