/// Expense model (despesas) and database operations
///
/// Despesas sit at the bottom of the ownership chain
/// (despesa -> destino -> viagem -> usuario), so the single-row
/// lookups join two tables up to the acting user. The optional
/// categoria/meio_pagamento references are validated by the handlers
/// against the same user before any write.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{double_option, report::ExpenseFilter};

const EXPENSE_COLUMNS: &str =
    "id, descricao, valor, data, observacoes, destino_id, categoria_id, meio_pagamento_id";

/// A dated expense under a destination
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Expense {
    pub id: i64,

    pub descricao: String,

    /// Amount, fixed-point with two fractional digits
    pub valor: Decimal,

    pub data: NaiveDate,

    pub observacoes: Option<String>,

    pub destino_id: i64,

    pub categoria_id: Option<i64>,

    pub meio_pagamento_id: Option<i64>,
}

/// An expense row joined with its category and payment method names,
/// as returned by the destination-scoped listing
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExpenseWithNames {
    pub id: i64,
    pub descricao: String,
    pub valor: Decimal,
    pub data: NaiveDate,
    pub observacoes: Option<String>,
    pub categoria_id: Option<i64>,
    pub categoria_nome: Option<String>,
    pub meio_pagamento_id: Option<i64>,
    pub meio_pagamento_nome: Option<String>,
}

/// Input for creating a new expense
#[derive(Debug, Clone)]
pub struct CreateExpense {
    pub descricao: String,
    pub valor: Decimal,
    pub data: NaiveDate,
    pub observacoes: Option<String>,
    pub destino_id: i64,
    pub categoria_id: Option<i64>,
    pub meio_pagamento_id: Option<i64>,
}

/// Partial update for an expense
///
/// Same presence semantics as [`super::trip::UpdateTrip`]: absent
/// fields stay untouched, an explicit null clears the optional
/// category/payment-method reference or the notes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExpense {
    pub descricao: Option<String>,

    pub valor: Option<Decimal>,

    pub data: Option<NaiveDate>,

    #[serde(default, deserialize_with = "double_option")]
    pub observacoes: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub categoria_id: Option<Option<i64>>,

    #[serde(default, deserialize_with = "double_option")]
    pub meio_pagamento_id: Option<Option<i64>>,
}

impl Expense {
    /// Creates a new expense under a destination
    ///
    /// The caller must have resolved the destination through
    /// [`super::destination::Destination::find_owned`] and validated
    /// any categoria/meio_pagamento references against the same user.
    pub async fn create(pool: &PgPool, data: CreateExpense) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Expense>(&format!(
            r#"
            INSERT INTO despesas
                (descricao, valor, data, observacoes, destino_id, categoria_id, meio_pagamento_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EXPENSE_COLUMNS}
            "#,
        ))
        .bind(data.descricao)
        .bind(data.valor)
        .bind(data.data)
        .bind(data.observacoes)
        .bind(data.destino_id)
        .bind(data.categoria_id)
        .bind(data.meio_pagamento_id)
        .fetch_one(pool)
        .await
    }

    /// Lists a destination's expenses, newest first, with category and
    /// payment method names joined in
    ///
    /// The destination filter of `filter` is ignored here; the listing
    /// is already scoped to one destination by `destino_id`.
    pub async fn list_by_destination(
        pool: &PgPool,
        destino_id: i64,
        filter: &ExpenseFilter,
    ) -> Result<Vec<ExpenseWithNames>, sqlx::Error> {
        sqlx::query_as::<_, ExpenseWithNames>(
            r#"
            SELECT d.id, d.descricao, d.valor, d.data, d.observacoes,
                   d.categoria_id, c.nome AS categoria_nome,
                   d.meio_pagamento_id, m.nome AS meio_pagamento_nome
            FROM despesas d
            LEFT JOIN categorias_despesa c ON c.id = d.categoria_id
            LEFT JOIN meios_pagamento m ON m.id = d.meio_pagamento_id
            WHERE d.destino_id = $1
              AND ($2::date IS NULL OR d.data >= $2)
              AND ($3::date IS NULL OR d.data <= $3)
              AND ($4::bigint IS NULL OR d.categoria_id = $4)
              AND ($5::bigint IS NULL OR d.meio_pagamento_id = $5)
            ORDER BY d.data DESC, d.id DESC
            "#,
        )
        .bind(destino_id)
        .bind(filter.data_inicio)
        .bind(filter.data_fim)
        .bind(filter.categoria_id)
        .bind(filter.meio_pagamento_id)
        .fetch_all(pool)
        .await
    }

    /// Finds an expense by id, scoped through destino and viagem to
    /// the owner
    pub async fn find_owned(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Expense>(
            r#"
            SELECT e.id, e.descricao, e.valor, e.data, e.observacoes,
                   e.destino_id, e.categoria_id, e.meio_pagamento_id
            FROM despesas e
            JOIN destinos d ON d.id = e.destino_id
            JOIN viagens v ON v.id = d.viagem_id
            WHERE e.id = $1 AND v.usuario_id = $2
            "#,
        )
        .bind(id)
        .bind(usuario_id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update to an owned expense
    pub async fn update(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
        data: UpdateExpense,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_count = 2;

        if data.descricao.is_some() {
            bind_count += 1;
            sets.push(format!("descricao = ${}", bind_count));
        }
        if data.valor.is_some() {
            bind_count += 1;
            sets.push(format!("valor = ${}", bind_count));
        }
        if data.data.is_some() {
            bind_count += 1;
            sets.push(format!("data = ${}", bind_count));
        }
        if data.observacoes.is_some() {
            bind_count += 1;
            sets.push(format!("observacoes = ${}", bind_count));
        }
        if data.categoria_id.is_some() {
            bind_count += 1;
            sets.push(format!("categoria_id = ${}", bind_count));
        }
        if data.meio_pagamento_id.is_some() {
            bind_count += 1;
            sets.push(format!("meio_pagamento_id = ${}", bind_count));
        }

        if sets.is_empty() {
            return Self::find_owned(pool, id, usuario_id).await;
        }

        let query = format!(
            r#"
            UPDATE despesas SET {}
            WHERE id = $1
              AND destino_id IN (
                  SELECT d.id FROM destinos d
                  JOIN viagens v ON v.id = d.viagem_id
                  WHERE v.usuario_id = $2
              )
            RETURNING {EXPENSE_COLUMNS}
            "#,
            sets.join(", "),
        );

        let mut q = sqlx::query_as::<_, Expense>(&query).bind(id).bind(usuario_id);

        if let Some(descricao) = data.descricao {
            q = q.bind(descricao);
        }
        if let Some(valor) = data.valor {
            q = q.bind(valor);
        }
        if let Some(date) = data.data {
            q = q.bind(date);
        }
        if let Some(observacoes) = data.observacoes {
            q = q.bind(observacoes);
        }
        if let Some(categoria_id) = data.categoria_id {
            q = q.bind(categoria_id);
        }
        if let Some(meio_pagamento_id) = data.meio_pagamento_id {
            q = q.bind(meio_pagamento_id);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes an owned expense
    pub async fn delete(pool: &PgPool, id: i64, usuario_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM despesas
            WHERE id = $1
              AND destino_id IN (
                  SELECT d.id FROM destinos d
                  JOIN viagens v ON v.id = d.viagem_id
                  WHERE v.usuario_id = $2
              )
            "#,
        )
        .bind(id)
        .bind(usuario_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a destination's expenses without joins, for embedding in
    /// the destination detail response
    pub async fn list_rows_by_destination(
        pool: &PgPool,
        destino_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM despesas WHERE destino_id = $1 ORDER BY data DESC, id DESC",
        ))
        .bind(destino_id)
        .fetch_all(pool)
        .await
    }
}
