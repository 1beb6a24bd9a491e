/// Expense category (categoria) endpoints
///
/// Names are unique per user; creating or renaming into a name the
/// user already has conflicts. Deletion is blocked while any despesa
/// still references the category.

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
use tripledger_shared::models::{category::Category, user::User};

/// Category create/rename request
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub nome: Option<String>,
}

fn required_name(nome: Option<String>) -> ApiResult<String> {
    nome.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("nome is required".to_string()))
}

/// POST /api/categorias
pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let nome = required_name(payload.nome)?;

    if Category::name_exists(&state.db, user.id, &nome).await? {
        return Err(ApiError::AlreadyExists(format!(
            "Category '{}' already exists",
            nome
        )));
    }

    let category = Category::create(&state.db, user.id, &nome).await?;

    tracing::info!(category_id = category.id, user_id = user.id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/categorias
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<Vec<Category>>> {
    let categories = Category::list_by_user(&state.db, user.id).await?;
    Ok(Json(categories))
}

/// PUT /api/categorias/:id_categoria
pub async fn update_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_categoria): Path<i64>,
    Json(payload): Json<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    let nome = required_name(payload.nome)?;

    let current = Category::find_owned(&state.db, id_categoria, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    if nome != current.nome && Category::name_exists(&state.db, user.id, &nome).await? {
        return Err(ApiError::AlreadyExists(format!(
            "Category '{}' already exists",
            nome
        )));
    }

    let category = Category::rename(&state.db, id_categoria, user.id, &nome)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// DELETE /api/categorias/:id_categoria
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id_categoria): Path<i64>,
) -> ApiResult<StatusCode> {
    let category = Category::find_owned(&state.db, id_categoria, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    let in_use = Category::expense_count(&state.db, category.id).await?;
    if in_use > 0 {
        return Err(ApiError::ResourceInUse(format!(
            "Category is referenced by {} expense(s)",
            in_use
        )));
    }

    Category::delete(&state.db, category.id, user.id).await?;

    tracing::info!(category_id = id_categoria, user_id = user.id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}
