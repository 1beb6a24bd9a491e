/// Expense (despesa) endpoints
///
/// Category and payment-method references are optional, but when
/// present they must resolve to rows owned by the acting user. A
/// reference to another user's row is rejected as invalid, not leaked
/// as a 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tripledger_shared::models::{
    category::Category,
    destination::Destination,
    expense::{CreateExpense, Expense, ExpenseWithNames, UpdateExpense},
    payment_method::PaymentMethod,
    report::ExpenseFilter,
    user::User,
};

/// Expense creation request
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub descricao: Option<String>,
    pub valor: Option<Decimal>,
    pub data: Option<NaiveDate>,
    pub observacoes: Option<String>,
    pub categoria_id: Option<i64>,
    pub meio_pagamento_id: Option<i64>,
}

/// Checks that an optional categoria reference resolves for this user
async fn check_category(pool: &PgPool, id: Option<i64>, usuario_id: i64) -> ApiResult<()> {
    if let Some(categoria_id) = id {
        Category::find_owned(pool, categoria_id, usuario_id)
            .await?
            .ok_or_else(|| ApiError::InvalidReference("Invalid categoria_id".to_string()))?;
    }
    Ok(())
}

/// Checks that an optional meio_pagamento reference resolves for this user
async fn check_payment_method(pool: &PgPool, id: Option<i64>, usuario_id: i64) -> ApiResult<()> {
    if let Some(meio_pagamento_id) = id {
        PaymentMethod::find_owned(pool, meio_pagamento_id, usuario_id)
            .await?
            .ok_or_else(|| ApiError::InvalidReference("Invalid meio_pagamento_id".to_string()))?;
    }
    Ok(())
}

/// POST /api/destinos/:id_destino/despesas
pub async fn create_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_destino): Path<i64>,
    Json(payload): Json<CreateExpenseRequest>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    let destino = Destination::find_owned(&state.db, id_destino, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Destination not found".to_string()))?;

    let descricao = payload
        .descricao
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::Validation("descricao is required".to_string()))?;
    let valor = payload
        .valor
        .ok_or_else(|| ApiError::Validation("valor is required".to_string()))?;
    let data = payload
        .data
        .ok_or_else(|| ApiError::Validation("data is required".to_string()))?;

    if valor <= Decimal::ZERO {
        return Err(ApiError::Validation("valor must be positive".to_string()));
    }

    check_category(&state.db, payload.categoria_id, user.id).await?;
    check_payment_method(&state.db, payload.meio_pagamento_id, user.id).await?;

    let expense = Expense::create(
        &state.db,
        CreateExpense {
            descricao,
            valor,
            data,
            observacoes: payload.observacoes,
            destino_id: destino.id,
            categoria_id: payload.categoria_id,
            meio_pagamento_id: payload.meio_pagamento_id,
        },
    )
    .await?;

    tracing::info!(
        expense_id = expense.id,
        destination_id = destino.id,
        "Expense created"
    );

    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /api/destinos/:id_destino/despesas
///
/// Optional query filters: data_inicio, data_fim, categoria_id,
/// meio_pagamento_id.
pub async fn list_expenses(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_destino): Path<i64>,
    Query(filter): Query<ExpenseFilter>,
) -> ApiResult<Json<Vec<ExpenseWithNames>>> {
    let destino = Destination::find_owned(&state.db, id_destino, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Destination not found".to_string()))?;

    let expenses = Expense::list_by_destination(&state.db, destino.id, &filter).await?;

    Ok(Json(expenses))
}

/// GET /api/despesas/:id_despesa
pub async fn get_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_despesa): Path<i64>,
) -> ApiResult<Json<Expense>> {
    let expense = Expense::find_owned(&state.db, id_despesa, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Expense not found".to_string()))?;

    Ok(Json(expense))
}

/// PUT /api/despesas/:id_despesa
pub async fn update_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_despesa): Path<i64>,
    Json(payload): Json<UpdateExpense>,
) -> ApiResult<Json<Expense>> {
    if let Some(descricao) = &payload.descricao {
        if descricao.trim().is_empty() {
            return Err(ApiError::Validation(
                "descricao must not be empty".to_string(),
            ));
        }
    }
    if let Some(valor) = payload.valor {
        if valor <= Decimal::ZERO {
            return Err(ApiError::Validation("valor must be positive".to_string()));
        }
    }

    // New references, if set, must belong to the acting user. A null
    // clears the reference and needs no check.
    if let Some(Some(categoria_id)) = payload.categoria_id {
        check_category(&state.db, Some(categoria_id), user.id).await?;
    }
    if let Some(Some(meio_pagamento_id)) = payload.meio_pagamento_id {
        check_payment_method(&state.db, Some(meio_pagamento_id), user.id).await?;
    }

    let expense = Expense::update(&state.db, id_despesa, user.id, payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Expense not found".to_string()))?;

    Ok(Json(expense))
}

/// DELETE /api/despesas/:id_despesa
pub async fn delete_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_despesa): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted = Expense::delete(&state.db, id_despesa, user.id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Expense not found".to_string()));
    }

    tracing::info!(expense_id = id_despesa, user_id = user.id, "Expense deleted");

    Ok(StatusCode::NO_CONTENT)
}
