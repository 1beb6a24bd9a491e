/// Payment method (meio de pagamento) endpoints
///
/// Same ownership and uniqueness rules as categories: names are unique
/// per user and deletion is blocked while despesas reference the row.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tripledger_shared::models::{payment_method::PaymentMethod, user::User};

/// Payment method create/rename request
#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    pub nome: Option<String>,
}

fn required_name(nome: Option<String>) -> ApiResult<String> {
    nome.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("nome is required".to_string()))
}

/// POST /api/meios_pagamento
pub async fn create_payment_method(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<PaymentMethodRequest>,
) -> ApiResult<(StatusCode, Json<PaymentMethod>)> {
    let nome = required_name(payload.nome)?;

    if PaymentMethod::name_exists(&state.db, user.id, &nome).await? {
        return Err(ApiError::AlreadyExists(format!(
            "Payment method '{}' already exists",
            nome
        )));
    }

    let method = PaymentMethod::create(&state.db, user.id, &nome).await?;

    tracing::info!(
        payment_method_id = method.id,
        user_id = user.id,
        "Payment method created"
    );

    Ok((StatusCode::CREATED, Json(method)))
}

/// GET /api/meios_pagamento
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<Vec<PaymentMethod>>> {
    let methods = PaymentMethod::list_by_user(&state.db, user.id).await?;
    Ok(Json(methods))
}

/// PUT /api/meios_pagamento/:id_meio_pagamento
pub async fn update_payment_method(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_meio_pagamento): Path<i64>,
    Json(payload): Json<PaymentMethodRequest>,
) -> ApiResult<Json<PaymentMethod>> {
    let nome = required_name(payload.nome)?;

    let current = PaymentMethod::find_owned(&state.db, id_meio_pagamento, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment method not found".to_string()))?;

    if nome != current.nome && PaymentMethod::name_exists(&state.db, user.id, &nome).await? {
        return Err(ApiError::AlreadyExists(format!(
            "Payment method '{}' already exists",
            nome
        )));
    }

    let method = PaymentMethod::rename(&state.db, id_meio_pagamento, user.id, &nome)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment method not found".to_string()))?;

    Ok(Json(method))
}

/// DELETE /api/meios_pagamento/:id_meio_pagamento
pub async fn delete_payment_method(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_meio_pagamento): Path<i64>,
) -> ApiResult<StatusCode> {
    let method = PaymentMethod::find_owned(&state.db, id_meio_pagamento, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment method not found".to_string()))?;

    let in_use = PaymentMethod::expense_count(&state.db, method.id).await?;
    if in_use > 0 {
        return Err(ApiError::ResourceInUse(format!(
            "Payment method is referenced by {} expense(s)",
            in_use
        )));
    }

    PaymentMethod::delete(&state.db, method.id, user.id).await?;

    tracing::info!(
        payment_method_id = id_meio_pagamento,
        user_id = user.id,
        "Payment method deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
