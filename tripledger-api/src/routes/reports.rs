/// Reporting endpoints
///
/// The general report and the three chart breakdowns share one filter
/// set, deserialized from the query string: data_inicio, data_fim,
/// id_destino, categoria_id, meio_pagamento_id. Date bounds are
/// inclusive; all sums run in the database over NUMERIC columns.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tripledger_shared::models::{
    report::{self, ExpenseFilter},
    trip::Trip,
    user::User,
};

/// General report for a trip
#[derive(Debug, Serialize)]
pub struct GeneralReport {
    pub viagem_id: i64,
    pub nome_viagem: String,

    pub orcamento_total_viagem: Option<Decimal>,

    /// Sum of matching despesas
    pub total_gasto_geral: Decimal,

    /// Budget minus total, null when the trip has no budget
    pub saldo_geral: Option<Decimal>,

    pub despesas_por_categoria: Vec<report::CategoryTotal>,
    pub despesas_por_destino: Vec<report::DestinationTotal>,

    /// Echo of the filters the totals were computed under
    pub filtros_aplicados: ExpenseFilter,
}

/// One slice of a category or destination chart
#[derive(Debug, Serialize)]
pub struct ChartSlice {
    pub name: String,
    pub value: Decimal,
}

/// One point of the per-day chart
#[derive(Debug, Serialize)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

async fn owned_trip(state: &AppState, id_viagem: i64, usuario_id: i64) -> ApiResult<Trip> {
    Trip::find_owned(&state.db, id_viagem, usuario_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))
}

/// GET /api/viagens/:id_viagem/relatorio/geral
pub async fn general_report(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_viagem): Path<i64>,
    Query(filter): Query<ExpenseFilter>,
) -> ApiResult<Json<GeneralReport>> {
    let trip = owned_trip(&state, id_viagem, user.id).await?;

    let total_gasto_geral = report::total_spent(&state.db, trip.id, &filter).await?;
    let despesas_por_categoria = report::totals_by_category(&state.db, trip.id, &filter).await?;
    let despesas_por_destino = report::totals_by_destination(&state.db, trip.id, &filter).await?;

    let saldo_geral = trip.orcamento_total.map(|orcamento| orcamento - total_gasto_geral);

    Ok(Json(GeneralReport {
        viagem_id: trip.id,
        nome_viagem: trip.nome_viagem,
        orcamento_total_viagem: trip.orcamento_total,
        total_gasto_geral,
        saldo_geral,
        despesas_por_categoria,
        despesas_por_destino,
        filtros_aplicados: filter,
    }))
}

/// GET /api/viagens/:id_viagem/grafico/despesas_por_categoria
///
/// Slices ordered by descending total. Despesas without a category are
/// not represented.
pub async fn chart_by_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_viagem): Path<i64>,
    Query(filter): Query<ExpenseFilter>,
) -> ApiResult<Json<Vec<ChartSlice>>> {
    let trip = owned_trip(&state, id_viagem, user.id).await?;

    let totals = report::totals_by_category(&state.db, trip.id, &filter).await?;

    Ok(Json(
        totals
            .into_iter()
            .map(|t| ChartSlice {
                name: t.categoria,
                value: t.total,
            })
            .collect(),
    ))
}

/// GET /api/viagens/:id_viagem/grafico/despesas_por_destino
///
/// Slices ordered by descending total.
pub async fn chart_by_destination(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_viagem): Path<i64>,
    Query(filter): Query<ExpenseFilter>,
) -> ApiResult<Json<Vec<ChartSlice>>> {
    let trip = owned_trip(&state, id_viagem, user.id).await?;

    let totals = report::totals_by_destination(&state.db, trip.id, &filter).await?;

    Ok(Json(
        totals
            .into_iter()
            .map(|t| ChartSlice {
                name: t.destino,
                value: t.total,
            })
            .collect(),
    ))
}

/// GET /api/viagens/:id_viagem/grafico/despesas_por_dia
///
/// Points ordered by ascending date.
pub async fn chart_by_day(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_viagem): Path<i64>,
    Query(filter): Query<ExpenseFilter>,
) -> ApiResult<Json<Vec<DayPoint>>> {
    let trip = owned_trip(&state, id_viagem, user.id).await?;

    let totals = report::totals_by_day(&state.db, trip.id, &filter).await?;

    Ok(Json(
        totals
            .into_iter()
            .map(|t| DayPoint {
                date: t.data,
                value: t.total,
            })
            .collect(),
    ))
}
