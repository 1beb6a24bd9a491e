/// Filtered aggregation queries over despesas
///
/// All aggregates join despesas through destinos so they can be scoped
/// to a single trip, and share one optional filter set applied with
/// AND semantics. Date bounds are inclusive. Sums are computed by the
/// database over NUMERIC columns; no float accumulation happens
/// anywhere on the way to the response.
///
/// Filters use null-guarded predicates (`$n IS NULL OR column = $n`)
/// so one statement serves every filter combination.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Optional filters narrowing a despesa query
///
/// Each filter, when present, narrows the result set; together they
/// compose with logical AND. Deserialized straight from query-string
/// parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseFilter {
    /// Inclusive lower date bound
    pub data_inicio: Option<NaiveDate>,

    /// Inclusive upper date bound
    pub data_fim: Option<NaiveDate>,

    /// Restrict to one destination
    pub id_destino: Option<i64>,

    /// Restrict to one category
    pub categoria_id: Option<i64>,

    /// Restrict to one payment method
    pub meio_pagamento_id: Option<i64>,
}

/// Sum of valor for one category
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryTotal {
    pub categoria: String,
    pub total: Decimal,
}

/// Sum of valor for one destination
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DestinationTotal {
    pub destino: String,
    pub total: Decimal,
}

/// Sum of valor for one calendar date
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DayTotal {
    pub data: NaiveDate,
    pub total: Decimal,
}

const FILTER_PREDICATES: &str = r#"
      AND ($2::date IS NULL OR d.data >= $2)
      AND ($3::date IS NULL OR d.data <= $3)
      AND ($4::bigint IS NULL OR d.destino_id = $4)
      AND ($5::bigint IS NULL OR d.categoria_id = $5)
      AND ($6::bigint IS NULL OR d.meio_pagamento_id = $6)
"#;

fn bind_filter<'q, O>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    filter: &ExpenseFilter,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    query
        .bind(filter.data_inicio)
        .bind(filter.data_fim)
        .bind(filter.id_destino)
        .bind(filter.categoria_id)
        .bind(filter.meio_pagamento_id)
}

/// Sums the valor of a trip's despesas matching the filter
///
/// Returns zero when nothing matches.
pub async fn total_spent(
    pool: &PgPool,
    viagem_id: i64,
    filter: &ExpenseFilter,
) -> Result<Decimal, sqlx::Error> {
    let query = format!(
        r#"
        SELECT COALESCE(SUM(d.valor), 0) AS total
        FROM despesas d
        JOIN destinos dest ON dest.id = d.destino_id
        WHERE dest.viagem_id = $1
        {FILTER_PREDICATES}
        "#,
    );

    let (total,): (Decimal,) =
        bind_filter(sqlx::query_as(&query).bind(viagem_id), filter)
            .fetch_one(pool)
            .await?;

    Ok(total)
}

/// Sums a trip's despesas grouped by category name, largest first
///
/// Despesas without a category are excluded, matching the inner join
/// on categorias_despesa.
pub async fn totals_by_category(
    pool: &PgPool,
    viagem_id: i64,
    filter: &ExpenseFilter,
) -> Result<Vec<CategoryTotal>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT c.nome AS categoria, SUM(d.valor) AS total
        FROM despesas d
        JOIN destinos dest ON dest.id = d.destino_id
        JOIN categorias_despesa c ON c.id = d.categoria_id
        WHERE dest.viagem_id = $1
        {FILTER_PREDICATES}
        GROUP BY c.nome
        ORDER BY total DESC
        "#,
    );

    bind_filter(sqlx::query_as::<_, CategoryTotal>(&query).bind(viagem_id), filter)
        .fetch_all(pool)
        .await
}

/// Sums a trip's despesas grouped by destination city, largest first
pub async fn totals_by_destination(
    pool: &PgPool,
    viagem_id: i64,
    filter: &ExpenseFilter,
) -> Result<Vec<DestinationTotal>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT dest.nome_cidade AS destino, SUM(d.valor) AS total
        FROM despesas d
        JOIN destinos dest ON dest.id = d.destino_id
        WHERE dest.viagem_id = $1
        {FILTER_PREDICATES}
        GROUP BY dest.nome_cidade
        ORDER BY total DESC
        "#,
    );

    bind_filter(
        sqlx::query_as::<_, DestinationTotal>(&query).bind(viagem_id),
        filter,
    )
    .fetch_all(pool)
    .await
}

/// Sums a trip's despesas grouped by calendar date, oldest first
pub async fn totals_by_day(
    pool: &PgPool,
    viagem_id: i64,
    filter: &ExpenseFilter,
) -> Result<Vec<DayTotal>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT d.data AS data, SUM(d.valor) AS total
        FROM despesas d
        JOIN destinos dest ON dest.id = d.destino_id
        WHERE dest.viagem_id = $1
        {FILTER_PREDICATES}
        GROUP BY d.data
        ORDER BY d.data ASC
        "#,
    );

    bind_filter(sqlx::query_as::<_, DayTotal>(&query).bind(viagem_id), filter)
        .fetch_all(pool)
        .await
}
