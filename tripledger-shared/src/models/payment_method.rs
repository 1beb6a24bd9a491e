/// Payment method model (meios_pagamento)
///
/// Mirrors [`super::category::Category`]: owned directly by a user,
/// referenced optionally by despesas, deletion blocked while in use,
/// per-user unique names.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A user-defined payment method
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentMethod {
    pub id: i64,

    pub nome: String,

    #[serde(skip_serializing)]
    pub usuario_id: i64,
}

impl PaymentMethod {
    /// Creates a new payment method for a user
    pub async fn create(pool: &PgPool, usuario_id: i64, nome: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PaymentMethod>(
            r#"
            INSERT INTO meios_pagamento (nome, usuario_id)
            VALUES ($1, $2)
            RETURNING id, nome, usuario_id
            "#,
        )
        .bind(nome)
        .bind(usuario_id)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's payment methods ordered by name
    pub async fn list_by_user(pool: &PgPool, usuario_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PaymentMethod>(
            "SELECT id, nome, usuario_id FROM meios_pagamento WHERE usuario_id = $1 ORDER BY nome",
        )
        .bind(usuario_id)
        .fetch_all(pool)
        .await
    }

    /// Finds a payment method by id, scoped to its owner
    pub async fn find_owned(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PaymentMethod>(
            "SELECT id, nome, usuario_id FROM meios_pagamento WHERE id = $1 AND usuario_id = $2",
        )
        .bind(id)
        .bind(usuario_id)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether the user already has a payment method with this name
    pub async fn name_exists(
        pool: &PgPool,
        usuario_id: i64,
        nome: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM meios_pagamento WHERE usuario_id = $1 AND nome = $2)",
        )
        .bind(usuario_id)
        .bind(nome)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Renames an owned payment method
    pub async fn rename(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
        nome: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PaymentMethod>(
            r#"
            UPDATE meios_pagamento SET nome = $3
            WHERE id = $1 AND usuario_id = $2
            RETURNING id, nome, usuario_id
            "#,
        )
        .bind(id)
        .bind(usuario_id)
        .bind(nome)
        .fetch_optional(pool)
        .await
    }

    /// Counts despesas referencing this payment method
    pub async fn expense_count(pool: &PgPool, id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM despesas WHERE meio_pagamento_id = $1")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Deletes an owned payment method (blocked by RESTRICT while in use)
    pub async fn delete(pool: &PgPool, id: i64, usuario_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM meios_pagamento WHERE id = $1 AND usuario_id = $2")
            .bind(id)
            .bind(usuario_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
