/// Expense category model (categorias_despesa)
///
/// Categories belong directly to a user and are referenced optionally
/// by despesas. A category cannot be deleted while any despesa still
/// references it; the handlers check [`Category::expense_count`] and
/// the schema backs this with ON DELETE RESTRICT.
///
/// Names are unique per user, enforced both at request time (for a
/// clean 409) and by a schema UNIQUE constraint.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A user-defined expense category
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,

    pub nome: String,

    #[serde(skip_serializing)]
    pub usuario_id: i64,
}

impl Category {
    /// Creates a new category for a user
    pub async fn create(pool: &PgPool, usuario_id: i64, nome: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categorias_despesa (nome, usuario_id)
            VALUES ($1, $2)
            RETURNING id, nome, usuario_id
            "#,
        )
        .bind(nome)
        .bind(usuario_id)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's categories ordered by name
    pub async fn list_by_user(pool: &PgPool, usuario_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, nome, usuario_id FROM categorias_despesa WHERE usuario_id = $1 ORDER BY nome",
        )
        .bind(usuario_id)
        .fetch_all(pool)
        .await
    }

    /// Finds a category by id, scoped to its owner
    pub async fn find_owned(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, nome, usuario_id FROM categorias_despesa WHERE id = $1 AND usuario_id = $2",
        )
        .bind(id)
        .bind(usuario_id)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether the user already has a category with this name
    pub async fn name_exists(
        pool: &PgPool,
        usuario_id: i64,
        nome: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM categorias_despesa WHERE usuario_id = $1 AND nome = $2)",
        )
        .bind(usuario_id)
        .bind(nome)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Renames an owned category
    pub async fn rename(
        pool: &PgPool,
        id: i64,
        usuario_id: i64,
        nome: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categorias_despesa SET nome = $3
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

    /// Counts despesas referencing this category
    pub async fn expense_count(pool: &PgPool, id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM despesas WHERE categoria_id = $1")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Deletes an owned category
    ///
    /// The caller checks [`Category::expense_count`] first; the
    /// RESTRICT constraint is the backstop.
    pub async fn delete(pool: &PgPool, id: i64, usuario_id: i64) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM categorias_despesa WHERE id = $1 AND usuario_id = $2")
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

    #[test]
    fn test_category_serialization_hides_owner() {
        let category = Category {
            id: 3,
            nome: "Food".to_string(),
            usuario_id: 1,
        };

        let json = serde_json::to_value(&category).unwrap();
        assert!(json.get("usuario_id").is_none());
        assert_eq!(json["nome"], "Food");
    }
}
