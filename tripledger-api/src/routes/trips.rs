/// Trip (viagem) endpoints
///
/// All handlers scope their queries to the acting user. A trip id that
/// belongs to another user is indistinguishable from a missing one.

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
    destination::Destination,
    trip::{CreateTrip, Trip, UpdateTrip},
    user::User,
};

/// Trip creation request
///
/// Required fields arrive as Option so a missing field produces a 400
/// instead of a body-rejection status.
#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub nome_viagem: Option<String>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub orcamento_total: Option<Decimal>,
}

/// Trip detail with its destinations embedded
#[derive(Debug, Serialize)]
pub struct TripDetail {
    #[serde(flatten)]
    pub viagem: Trip,
    pub destinos: Vec<Destination>,
}

/// POST /api/viagens
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateTripRequest>,
) -> ApiResult<(StatusCode, Json<Trip>)> {
    let nome_viagem = payload
        .nome_viagem
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("nome_viagem is required".to_string()))?;

    if let (Some(inicio), Some(fim)) = (payload.data_inicio, payload.data_fim) {
        if fim < inicio {
            return Err(ApiError::Validation(
                "data_fim must not be before data_inicio".to_string(),
            ));
        }
    }

    let trip = Trip::create(
        &state.db,
        CreateTrip {
            nome_viagem,
            data_inicio: payload.data_inicio,
            data_fim: payload.data_fim,
            orcamento_total: payload.orcamento_total,
            usuario_id: user.id,
        },
    )
    .await?;

    tracing::info!(trip_id = trip.id, user_id = user.id, "Trip created");

    Ok((StatusCode::CREATED, Json(trip)))
}

/// GET /api/viagens
pub async fn list_trips(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<Vec<Trip>>> {
    let trips = Trip::list_by_user(&state.db, user.id).await?;
    Ok(Json(trips))
}

/// GET /api/viagens/:id_viagem
pub async fn get_trip(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_viagem): Path<i64>,
) -> ApiResult<Json<TripDetail>> {
    let viagem = Trip::find_owned(&state.db, id_viagem, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;

    let destinos = Destination::list_by_trip(&state.db, viagem.id).await?;

    Ok(Json(TripDetail { viagem, destinos }))
}

/// PUT /api/viagens/:id_viagem
pub async fn update_trip(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_viagem): Path<i64>,
    Json(payload): Json<UpdateTrip>,
) -> ApiResult<Json<Trip>> {
    if let Some(nome) = &payload.nome_viagem {
        if nome.trim().is_empty() {
            return Err(ApiError::Validation(
                "nome_viagem must not be empty".to_string(),
            ));
        }
    }

    // Date order is checked against the merged result, so a partial
    // update cannot move data_fim before the stored data_inicio
    let current = Trip::find_owned(&state.db, id_viagem, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;

    let inicio = payload.data_inicio.unwrap_or(current.data_inicio);
    let fim = payload.data_fim.unwrap_or(current.data_fim);
    if let (Some(inicio), Some(fim)) = (inicio, fim) {
        if fim < inicio {
            return Err(ApiError::Validation(
                "data_fim must not be before data_inicio".to_string(),
            ));
        }
    }

    let trip = Trip::update(&state.db, id_viagem, user.id, payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))?;

    Ok(Json(trip))
}

/// DELETE /api/viagens/:id_viagem
///
/// Cascades to the trip's destinos and their despesas.
pub async fn delete_trip(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_viagem): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted = Trip::delete(&state.db, id_viagem, user.id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Trip not found".to_string()));
    }

    tracing::info!(trip_id = id_viagem, user_id = user.id, "Trip deleted");

    Ok(StatusCode::NO_CONTENT)
}
