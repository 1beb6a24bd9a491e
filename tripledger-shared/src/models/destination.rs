/// Destination model (destinos) and database operations
///
/// Destinations belong to a trip, so ownership is derived through the
/// viagens table: every query joins (or subselects) up to the owning
/// user rather than trusting the destination id alone.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::double_option;

const DESTINATION_COLUMNS: &str =
    "id, nome_cidade, data_chegada, data_partida, orcamento_destino, viagem_id";

/// A destination (city) within a trip
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Destination {
    pub id: i64,

    pub nome_cidade: String,

    pub data_chegada: Option<NaiveDate>,

    pub data_partida: Option<NaiveDate>,

    /// Destination budget, fixed-point with two fractional digits
    pub orcamento_destino: Option<Decimal>,

    pub viagem_id: i64,
}

/// Input for creating a new destination
#[derive(Debug, Clone)]
pub struct CreateDestination {
    pub nome_cidade: String,
    pub data_chegada: Option<NaiveDate>,
    pub data_partida: Option<NaiveDate>,
    pub orcamento_destino: Option<Decimal>,
    pub viagem_id: i64,
}

/// Partial update for a destination
///
/// Same presence semantics as [`super::trip::UpdateTrip`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDestination {
    pub nome_cidade: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub data_chegada: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub data_partida: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub orcamento_destino: Option<Option<Decimal>>,
}

impl Destination {
    /// Creates a new destination under a trip
    ///
    /// The caller must have already resolved the trip through
    /// [`super::trip::Trip::find_owned`].
    pub async fn create(pool: &PgPool, data: CreateDestination) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Destination>(&format!(
            r#"
            INSERT INTO destinos (nome_cidade, data_chegada, data_partida, orcamento_destino, viagem_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DESTINATION_COLUMNS}
            "#,
        ))
        .bind(data.nome_cidade)
        .bind(data.data_chegada)
        .bind(data.data_partida)
        .bind(data.orcamento_destino)
        .bind(data.viagem_id)
        .fetch_one(pool)
        .await
    }

    /// Lists the destinations of a trip
    pub async fn list_by_trip(pool: &PgPool, viagem_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Destination>(&format!(
            "SELECT {DESTINATION_COLUMNS} FROM destinos WHERE viagem_id = $1 ORDER BY id",
        ))
        .bind(viagem_id)
        .fetch_all(pool)
        .await
    }

    /// Finds a destination by id, scoped through its trip to the owner
    pub async fn find_owned(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Destination>(
            r#"
            SELECT d.id, d.nome_cidade, d.data_chegada, d.data_partida,
                   d.orcamento_destino, d.viagem_id
            FROM destinos d
            JOIN viagens v ON v.id = d.viagem_id
            WHERE d.id = $1 AND v.usuario_id = $2
            "#,
        )
        .bind(id)
        .bind(usuario_id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update to an owned destination
    pub async fn update(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
        data: UpdateDestination,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_count = 2;

        if data.nome_cidade.is_some() {
            bind_count += 1;
            sets.push(format!("nome_cidade = ${}", bind_count));
        }
        if data.data_chegada.is_some() {
            bind_count += 1;
            sets.push(format!("data_chegada = ${}", bind_count));
        }
        if data.data_partida.is_some() {
            bind_count += 1;
            sets.push(format!("data_partida = ${}", bind_count));
        }
        if data.orcamento_destino.is_some() {
            bind_count += 1;
            sets.push(format!("orcamento_destino = ${}", bind_count));
        }

        if sets.is_empty() {
            return Self::find_owned(pool, id, usuario_id).await;
        }

        let query = format!(
            r#"
            UPDATE destinos SET {}
            WHERE id = $1
              AND viagem_id IN (SELECT id FROM viagens WHERE usuario_id = $2)
            RETURNING {DESTINATION_COLUMNS}
            "#,
            sets.join(", "),
        );

        let mut q = sqlx::query_as::<_, Destination>(&query)
            .bind(id)
            .bind(usuario_id);

        if let Some(nome) = data.nome_cidade {
            q = q.bind(nome);
        }
        if let Some(chegada) = data.data_chegada {
            q = q.bind(chegada);
        }
        if let Some(partida) = data.data_partida {
            q = q.bind(partida);
        }
        if let Some(orcamento) = data.orcamento_destino {
            q = q.bind(orcamento);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes an owned destination, cascading to its despesas
    pub async fn delete(pool: &PgPool, id: i64, usuario_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM destinos
            WHERE id = $1
              AND viagem_id IN (SELECT id FROM viagens WHERE usuario_id = $2)
            "#,
        )
        .bind(id)
        .bind(usuario_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
