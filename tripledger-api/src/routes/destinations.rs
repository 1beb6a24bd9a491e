/// Destination (destino) endpoints
///
/// Creation and listing are nested under the owning trip; single-row
/// operations address the destination directly and re-derive ownership
/// through the viagens table.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tripledger_shared::models::{
    destination::{CreateDestination, Destination, UpdateDestination},
    expense::Expense,
    trip::Trip,
    user::User,
};

/// Destination creation request
#[derive(Debug, Deserialize)]
pub struct CreateDestinationRequest {
    pub nome_cidade: Option<String>,
    pub data_chegada: Option<NaiveDate>,
    pub data_partida: Option<NaiveDate>,
    pub orcamento_destino: Option<Decimal>,
}

/// Destination detail with its expenses embedded
#[derive(Debug, Serialize)]
pub struct DestinationDetail {
    #[serde(flatten)]
    pub destino: Destination,
    pub despesas: Vec<Expense>,
}

/// POST /api/viagens/:id_viagem/destinos
pub async fn create_destination(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_viagem): Path<i64>,
    Json(payload): Json<CreateDestinationRequest>,
) -> ApiResult<(StatusCode, Json<Destination>)> {
    let trip = Trip::find_owned(&state.db, id_viagem, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;

    let nome_cidade = payload
        .nome_cidade
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("nome_cidade is required".to_string()))?;

    if let (Some(chegada), Some(partida)) = (payload.data_chegada, payload.data_partida) {
        if partida < chegada {
            return Err(ApiError::Validation(
                "data_partida must not be before data_chegada".to_string(),
            ));
        }
    }

    let destination = Destination::create(
        &state.db,
        CreateDestination {
            nome_cidade,
            data_chegada: payload.data_chegada,
            data_partida: payload.data_partida,
            orcamento_destino: payload.orcamento_destino,
            viagem_id: trip.id,
        },
    )
    .await?;

    tracing::info!(
        destination_id = destination.id,
        trip_id = trip.id,
        "Destination created"
    );

    Ok((StatusCode::CREATED, Json(destination)))
}

/// GET /api/viagens/:id_viagem/destinos
pub async fn list_destinations(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_viagem): Path<i64>,
) -> ApiResult<Json<Vec<Destination>>> {
    let trip = Trip::find_owned(&state.db, id_viagem, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;

    let destinations = Destination::list_by_trip(&state.db, trip.id).await?;

    Ok(Json(destinations))
}

/// GET /api/destinos/:id_destino
pub async fn get_destination(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_destino): Path<i64>,
) -> ApiResult<Json<DestinationDetail>> {
    let destino = Destination::find_owned(&state.db, id_destino, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Destination not found".to_string()))?;

    let despesas = Expense::list_rows_by_destination(&state.db, destino.id).await?;

    Ok(Json(DestinationDetail { destino, despesas }))
}

/// PUT /api/destinos/:id_destino
pub async fn update_destination(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_destino): Path<i64>,
    Json(payload): Json<UpdateDestination>,
) -> ApiResult<Json<Destination>> {
    if let Some(nome) = &payload.nome_cidade {
        if nome.trim().is_empty() {
            return Err(ApiError::Validation(
                "nome_cidade must not be empty".to_string(),
            ));
        }
    }

    // Date order is checked against the merged result, so a partial
    // update cannot move data_partida before the stored data_chegada
    let current = Destination::find_owned(&state.db, id_destino, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Destination not found".to_string()))?;

    let chegada = payload.data_chegada.unwrap_or(current.data_chegada);
    let partida = payload.data_partida.unwrap_or(current.data_partida);
    if let (Some(chegada), Some(partida)) = (chegada, partida) {
        if partida < chegada {
            return Err(ApiError::Validation(
                "data_partida must not be before data_chegada".to_string(),
            ));
        }
    }

    let destination = Destination::update(&state.db, id_destino, user.id, payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Destination not found".to_string()))?;

    Ok(Json(destination))
}

/// DELETE /api/destinos/:id_destino
///
/// Cascades to the destination's despesas.
pub async fn delete_destination(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_destino): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted = Destination::delete(&state.db, id_destino, user.id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Destination not found".to_string()));
    }

    tracing::info!(destination_id = id_destino, user_id = user.id, "Destination deleted");

    Ok(StatusCode::NO_CONTENT)
}
