/// Trip model (viagens) and database operations
///
/// A trip is the top-level budget container. Every operation here is
/// scoped by `usuario_id`; a trip id from another user behaves exactly
/// like a missing row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE viagens (
///     id BIGSERIAL PRIMARY KEY,
///     nome_viagem VARCHAR(255) NOT NULL,
///     data_inicio DATE,
///     data_fim DATE,
///     orcamento_total NUMERIC(10, 2),
///     usuario_id BIGINT NOT NULL REFERENCES usuarios(id) ON DELETE CASCADE
/// );
/// ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::double_option;

const TRIP_COLUMNS: &str = "id, nome_viagem, data_inicio, data_fim, orcamento_total, usuario_id";

/// A trip owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Trip {
    pub id: i64,

    pub nome_viagem: String,

    pub data_inicio: Option<NaiveDate>,

    pub data_fim: Option<NaiveDate>,

    /// Total budget, fixed-point with two fractional digits
    pub orcamento_total: Option<Decimal>,

    #[serde(skip_serializing)]
    pub usuario_id: i64,
}

/// Input for creating a new trip
#[derive(Debug, Clone)]
pub struct CreateTrip {
    pub nome_viagem: String,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub orcamento_total: Option<Decimal>,
    pub usuario_id: i64,
}

/// Partial update for a trip
///
/// Fields absent from the JSON payload stay untouched; an explicit
/// `null` clears the optional column. The outer `Option` tracks
/// presence, the inner one the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTrip {
    pub nome_viagem: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub data_inicio: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub data_fim: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub orcamento_total: Option<Option<Decimal>>,
}

impl Trip {
    /// Creates a new trip for a user
    pub async fn create(pool: &PgPool, data: CreateTrip) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Trip>(&format!(
            r#"
            INSERT INTO viagens (nome_viagem, data_inicio, data_fim, orcamento_total, usuario_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TRIP_COLUMNS}
            "#,
        ))
        .bind(data.nome_viagem)
        .bind(data.data_inicio)
        .bind(data.data_fim)
        .bind(data.orcamento_total)
        .bind(data.usuario_id)
        .fetch_one(pool)
        .await
    }

    /// Lists all trips belonging to a user
    pub async fn list_by_user(pool: &PgPool, usuario_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(&format!(
            "SELECT {TRIP_COLUMNS} FROM viagens WHERE usuario_id = $1 ORDER BY id",
        ))
        .bind(usuario_id)
        .fetch_all(pool)
        .await
    }

    /// Finds a trip by id, scoped to its owner
    pub async fn find_owned(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(&format!(
            "SELECT {TRIP_COLUMNS} FROM viagens WHERE id = $1 AND usuario_id = $2",
        ))
        .bind(id)
        .bind(usuario_id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update to an owned trip
    ///
    /// Only fields present in `data` are written. Returns `None` when
    /// the trip does not exist or is not owned by `usuario_id`.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
        data: UpdateTrip,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_count = 2;

        if data.nome_viagem.is_some() {
            bind_count += 1;
            sets.push(format!("nome_viagem = ${}", bind_count));
        }
        if data.data_inicio.is_some() {
            bind_count += 1;
            sets.push(format!("data_inicio = ${}", bind_count));
        }
        if data.data_fim.is_some() {
            bind_count += 1;
            sets.push(format!("data_fim = ${}", bind_count));
        }
        if data.orcamento_total.is_some() {
            bind_count += 1;
            sets.push(format!("orcamento_total = ${}", bind_count));
        }

        if sets.is_empty() {
            // Nothing to change; behave like a read
            return Self::find_owned(pool, id, usuario_id).await;
        }

        let query = format!(
            "UPDATE viagens SET {} WHERE id = $1 AND usuario_id = $2 RETURNING {TRIP_COLUMNS}",
            sets.join(", "),
        );

        let mut q = sqlx::query_as::<_, Trip>(&query).bind(id).bind(usuario_id);

        if let Some(nome) = data.nome_viagem {
            q = q.bind(nome);
        }
        if let Some(inicio) = data.data_inicio {
            q = q.bind(inicio);
        }
        if let Some(fim) = data.data_fim {
            q = q.bind(fim);
        }
        if let Some(orcamento) = data.orcamento_total {
            q = q.bind(orcamento);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes an owned trip
    ///
    /// The schema cascades the delete to the trip's destinos and their
    /// despesas. Returns false when nothing matched.
    pub async fn delete(pool: &PgPool, id: i64, usuario_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM viagens WHERE id = $1 AND usuario_id = $2")
            .bind(id)
            .bind(usuario_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_update_trip_absent_vs_null() {
        // Absent field: left untouched
        let update: UpdateTrip = serde_json::from_str(r#"{"nome_viagem": "X"}"#).unwrap();
        assert_eq!(update.nome_viagem.as_deref(), Some("X"));
        assert!(update.data_inicio.is_none());
        assert!(update.orcamento_total.is_none());

        // Explicit null: clears the column
        let update: UpdateTrip =
            serde_json::from_str(r#"{"data_inicio": null, "orcamento_total": null}"#).unwrap();
        assert_eq!(update.data_inicio, Some(None));
        assert_eq!(update.orcamento_total, Some(None));
        assert!(update.nome_viagem.is_none());
    }

    #[test]
    fn test_update_trip_values() {
        let update: UpdateTrip = serde_json::from_str(
            r#"{"data_inicio": "2024-05-01", "orcamento_total": 1500.00}"#,
        )
        .unwrap();

        assert_eq!(
            update.data_inicio,
            Some(Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()))
        );
        assert_eq!(update.orcamento_total, Some(Some(dec!(1500.00))));
    }

    #[test]
    fn test_trip_serialization_hides_owner() {
        let trip = Trip {
            id: 1,
            nome_viagem: "Europe".to_string(),
            data_inicio: None,
            data_fim: None,
            orcamento_total: Some(dec!(1000.00)),
            usuario_id: 42,
        };

        let json = serde_json::to_value(&trip).unwrap();
        assert!(json.get("usuario_id").is_none());
        assert_eq!(json["nome_viagem"], "Europe");
        // Money renders as a JSON number
        assert!(json["orcamento_total"].is_number());
    }
}
