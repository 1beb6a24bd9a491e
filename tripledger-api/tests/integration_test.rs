/// Integration tests for the tripledger API
///
/// These exercise the full stack end-to-end against a real PostgreSQL
/// database: authentication, the ownership chain, partial updates,
/// cascade deletes, in-use guards, and report aggregation. They skip
/// themselves when `TEST_DATABASE_URL` is not set.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::TestContext;
use serde_json::json;
use tripledger_shared::auth::jwt::{create_token, Claims};

fn approx(value: &serde_json::Value, expected: f64) -> bool {
    value.as_f64().map(|v| (v - expected).abs() < 1e-9).unwrap_or(false)
}

#[tokio::test]
async fn test_health_is_public() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (status, body) = ctx.request_with_token("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_login_success_and_failure() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    // Valid credentials
    let (status, body) = ctx
        .request_with_token(
            "POST",
            "/auth/login",
            None,
            Some(json!({
                "username": ctx.user.username,
                "password": common::TEST_PASSWORD
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 3600);

    // The issued token works against a protected route
    let issued = body["access_token"].as_str().unwrap().to_string();
    let (status, _) = ctx
        .request_with_token("GET", "/api/viagens", Some(&issued), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Wrong password and unknown user fail identically
    let (status, wrong_pw) = ctx
        .request_with_token(
            "POST",
            "/auth/login",
            None,
            Some(json!({
                "username": ctx.user.username,
                "password": "not-the-password"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = ctx
        .request_with_token(
            "POST",
            "/auth/login",
            None,
            Some(json!({
                "username": common::unique("ghost"),
                "password": common::TEST_PASSWORD
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw["message"], unknown["message"]);

    // Missing fields are a validation error, not 401
    let (status, _) = ctx
        .request_with_token("POST", "/auth/login", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_token_required_and_expiry() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    // No token
    let (status, body) = ctx
        .request_with_token("GET", "/api/viagens", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    // Garbage token
    let (status, _) = ctx
        .request_with_token("GET", "/api/viagens", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Expired token
    let claims = Claims::with_expiration(
        ctx.user.id,
        ctx.user.username.clone(),
        Duration::seconds(-3601),
    );
    let expired = create_token(&claims, common::TEST_JWT_SECRET).unwrap();

    let (status, _) = ctx
        .request_with_token("GET", "/api/viagens", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Expiry is an exact cutoff: one second past is already rejected
    let claims = Claims::with_expiration(
        ctx.user.id,
        ctx.user.username.clone(),
        Duration::seconds(-1),
    );
    let just_expired = create_token(&claims, common::TEST_JWT_SECRET).unwrap();

    let (status, body) = ctx
        .request_with_token("GET", "/api/viagens", Some(&just_expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_trip_crud_and_partial_update() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    // Missing required name
    let (status, body) = ctx.request("POST", "/api/viagens", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // Create
    let (status, trip) = ctx
        .request(
            "POST",
            "/api/viagens",
            Some(json!({
                "nome_viagem": "Europe",
                "data_inicio": "2024-05-01",
                "data_fim": "2024-05-15",
                "orcamento_total": 2000.00
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(trip["nome_viagem"], "Europe");
    assert!(trip.get("usuario_id").is_none());
    let trip_id = trip["id"].as_i64().unwrap();

    // Listing contains it
    let (status, list) = ctx.request("GET", "/api/viagens", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().iter().any(|t| t["id"] == trip_id));

    // Partial update leaves the other fields alone
    let (status, updated) = ctx
        .request(
            "PUT",
            &format!("/api/viagens/{}", trip_id),
            Some(json!({"nome_viagem": "Europe 2024"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["nome_viagem"], "Europe 2024");
    assert_eq!(updated["data_inicio"], "2024-05-01");
    assert_eq!(updated["data_fim"], "2024-05-15");
    assert!(approx(&updated["orcamento_total"], 2000.00));

    // Explicit null clears an optional field
    let (status, cleared) = ctx
        .request(
            "PUT",
            &format!("/api/viagens/{}", trip_id),
            Some(json!({"orcamento_total": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["orcamento_total"].is_null());
    assert_eq!(cleared["nome_viagem"], "Europe 2024");

    // Delete, then it is gone
    let (status, _) = ctx
        .request("DELETE", &format!("/api/viagens/{}", trip_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .request("GET", &format!("/api/viagens/{}", trip_id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_inverted_date_range_rejected_on_create_and_update() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    // Inverted range at creation
    let (status, body) = ctx
        .request(
            "POST",
            "/api/viagens",
            Some(json!({
                "nome_viagem": "Backwards",
                "data_inicio": "2024-05-15",
                "data_fim": "2024-05-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // A partial update cannot move data_fim before the stored data_inicio
    let (_, trip) = ctx
        .request(
            "POST",
            "/api/viagens",
            Some(json!({
                "nome_viagem": "Forward",
                "data_inicio": "2024-05-01",
                "data_fim": "2024-05-15"
            })),
        )
        .await;
    let trip_id = trip["id"].as_i64().unwrap();

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/viagens/{}", trip_id),
            Some(json!({"data_fim": "2024-04-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // The stored row is untouched
    let (_, detail) = ctx
        .request("GET", &format!("/api/viagens/{}", trip_id), None)
        .await;
    assert_eq!(detail["data_fim"], "2024-05-15");

    // Same rule for destination arrival/departure
    let (_, destino) = ctx
        .request(
            "POST",
            &format!("/api/viagens/{}/destinos", trip_id),
            Some(json!({
                "nome_cidade": "Madrid",
                "data_chegada": "2024-05-02",
                "data_partida": "2024-05-05"
            })),
        )
        .await;
    let destino_id = destino["id"].as_i64().unwrap();

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/destinos/{}", destino_id),
            Some(json!({"data_partida": "2024-05-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_ownership_isolation() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let (_other, other_token) = ctx.other_user().await;

    let (_, trip) = ctx
        .request("POST", "/api/viagens", Some(json!({"nome_viagem": "Private"})))
        .await;
    let trip_id = trip["id"].as_i64().unwrap();

    // The other user sees neither the listing entry nor the trip
    let (status, list) = ctx
        .request_with_token("GET", "/api/viagens", Some(&other_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!list.as_array().unwrap().iter().any(|t| t["id"] == trip_id));

    let (status, _) = ctx
        .request_with_token(
            "GET",
            &format!("/api/viagens/{}", trip_id),
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nor can they modify or delete it
    let (status, _) = ctx
        .request_with_token(
            "PUT",
            &format!("/api/viagens/{}", trip_id),
            Some(&other_token),
            Some(json!({"nome_viagem": "Hijacked"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request_with_token(
            "DELETE",
            &format!("/api/viagens/{}", trip_id),
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_expense_chain_and_general_report() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (_, trip) = ctx
        .request(
            "POST",
            "/api/viagens",
            Some(json!({"nome_viagem": "Europe", "orcamento_total": 100.00})),
        )
        .await;
    let trip_id = trip["id"].as_i64().unwrap();

    let (status, destino) = ctx
        .request(
            "POST",
            &format!("/api/viagens/{}/destinos", trip_id),
            Some(json!({"nome_cidade": "Paris"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let destino_id = destino["id"].as_i64().unwrap();

    let (status, despesa) = ctx
        .request(
            "POST",
            &format!("/api/destinos/{}/despesas", destino_id),
            Some(json!({
                "descricao": "Lunch",
                "valor": 20.50,
                "data": "2024-05-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(approx(&despesa["valor"], 20.50));

    // General report sums the expense and derives the balance
    let (status, report) = ctx
        .request(
            "GET",
            &format!("/api/viagens/{}/relatorio/geral", trip_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["viagem_id"], trip_id);
    assert!(approx(&report["orcamento_total_viagem"], 100.00));
    assert!(approx(&report["total_gasto_geral"], 20.50));
    assert!(approx(&report["saldo_geral"], 79.50));
    assert_eq!(report["despesas_por_destino"][0]["destino"], "Paris");
    assert!(approx(&report["despesas_por_destino"][0]["total"], 20.50));

    // The trip detail embeds its destinations, the destination detail
    // its expenses
    let (_, detail) = ctx
        .request("GET", &format!("/api/viagens/{}", trip_id), None)
        .await;
    assert_eq!(detail["destinos"][0]["nome_cidade"], "Paris");

    let (_, destino_detail) = ctx
        .request("GET", &format!("/api/destinos/{}", destino_id), None)
        .await;
    assert_eq!(destino_detail["despesas"][0]["descricao"], "Lunch");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_report_date_filter_is_inclusive() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (_, trip) = ctx
        .request("POST", "/api/viagens", Some(json!({"nome_viagem": "Filtered"})))
        .await;
    let trip_id = trip["id"].as_i64().unwrap();

    let (_, destino) = ctx
        .request(
            "POST",
            &format!("/api/viagens/{}/destinos", trip_id),
            Some(json!({"nome_cidade": "Rome"})),
        )
        .await;
    let destino_id = destino["id"].as_i64().unwrap();

    for (desc, valor, data) in [
        ("before", 1.00, "2024-04-30"),
        ("first", 10.00, "2024-05-01"),
        ("last", 5.00, "2024-05-31"),
        ("after", 2.00, "2024-06-01"),
    ] {
        let (status, _) = ctx
            .request(
                "POST",
                &format!("/api/destinos/{}/despesas", destino_id),
                Some(json!({"descricao": desc, "valor": valor, "data": data})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Both bounds are inclusive
    let (status, report) = ctx
        .request(
            "GET",
            &format!(
                "/api/viagens/{}/relatorio/geral?data_inicio=2024-05-01&data_fim=2024-05-31",
                trip_id
            ),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(approx(&report["total_gasto_geral"], 15.00));
    // No budget on this trip, so the balance is null rather than absent
    assert!(report.get("saldo_geral").is_some());
    assert!(report["saldo_geral"].is_null());
    assert_eq!(report["filtros_aplicados"]["data_inicio"], "2024-05-01");
    assert_eq!(report["filtros_aplicados"]["data_fim"], "2024-05-31");

    // Unfiltered, everything counts
    let (_, report) = ctx
        .request(
            "GET",
            &format!("/api/viagens/{}/relatorio/geral", trip_id),
            None,
        )
        .await;
    assert!(approx(&report["total_gasto_geral"], 18.00));

    // Day chart is ordered ascending by date
    let (status, chart) = ctx
        .request(
            "GET",
            &format!("/api/viagens/{}/grafico/despesas_por_dia", trip_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let days: Vec<&str> = chart
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["date"].as_str().unwrap())
        .collect();
    assert_eq!(days, vec!["2024-04-30", "2024-05-01", "2024-05-31", "2024-06-01"]);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_category_uniqueness_and_in_use_guard() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let nome = common::unique("Food");
    let (status, categoria) = ctx
        .request("POST", "/api/categorias", Some(json!({"nome": nome})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let categoria_id = categoria["id"].as_i64().unwrap();

    // Duplicate name for the same user conflicts
    let (status, body) = ctx
        .request("POST", "/api/categorias", Some(json!({"nome": nome})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_exists");

    // A different user may reuse the name
    let (_other, other_token) = ctx.other_user().await;
    let (status, _) = ctx
        .request_with_token(
            "POST",
            "/api/categorias",
            Some(&other_token),
            Some(json!({"nome": nome})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Attach the category to an expense
    let (_, trip) = ctx
        .request("POST", "/api/viagens", Some(json!({"nome_viagem": "T"})))
        .await;
    let (_, destino) = ctx
        .request(
            "POST",
            &format!("/api/viagens/{}/destinos", trip["id"].as_i64().unwrap()),
            Some(json!({"nome_cidade": "Lisbon"})),
        )
        .await;
    let (_, despesa) = ctx
        .request(
            "POST",
            &format!("/api/destinos/{}/despesas", destino["id"].as_i64().unwrap()),
            Some(json!({
                "descricao": "Dinner",
                "valor": 30.00,
                "data": "2024-05-02",
                "categoria_id": categoria_id
            })),
        )
        .await;
    let despesa_id = despesa["id"].as_i64().unwrap();

    // Delete is blocked while referenced
    let (status, body) = ctx
        .request("DELETE", &format!("/api/categorias/{}", categoria_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "resource_in_use");

    // Clearing the reference unblocks it
    let (status, cleared) = ctx
        .request(
            "PUT",
            &format!("/api/despesas/{}", despesa_id),
            Some(json!({"categoria_id": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["categoria_id"].is_null());

    let (status, _) = ctx
        .request("DELETE", &format!("/api/categorias/{}", categoria_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_cross_owner_reference_is_invalid() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let (_other, other_token) = ctx.other_user().await;

    // The other user's category
    let (_, their_categoria) = ctx
        .request_with_token(
            "POST",
            "/api/categorias",
            Some(&other_token),
            Some(json!({"nome": common::unique("Theirs")})),
        )
        .await;
    let their_id = their_categoria["id"].as_i64().unwrap();

    let (_, trip) = ctx
        .request("POST", "/api/viagens", Some(json!({"nome_viagem": "T"})))
        .await;
    let (_, destino) = ctx
        .request(
            "POST",
            &format!("/api/viagens/{}/destinos", trip["id"].as_i64().unwrap()),
            Some(json!({"nome_cidade": "Porto"})),
        )
        .await;

    // Referencing it is rejected as invalid, not found
    let (status, body) = ctx
        .request(
            "POST",
            &format!("/api/destinos/{}/despesas", destino["id"].as_i64().unwrap()),
            Some(json!({
                "descricao": "Sneaky",
                "valor": 1.00,
                "data": "2024-05-01",
                "categoria_id": their_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_reference");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_trip_delete_cascades() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (_, trip) = ctx
        .request("POST", "/api/viagens", Some(json!({"nome_viagem": "Doomed"})))
        .await;
    let trip_id = trip["id"].as_i64().unwrap();

    let (_, destino) = ctx
        .request(
            "POST",
            &format!("/api/viagens/{}/destinos", trip_id),
            Some(json!({"nome_cidade": "Berlin"})),
        )
        .await;
    let destino_id = destino["id"].as_i64().unwrap();

    let (_, despesa) = ctx
        .request(
            "POST",
            &format!("/api/destinos/{}/despesas", destino_id),
            Some(json!({"descricao": "Taxi", "valor": 12.00, "data": "2024-05-03"})),
        )
        .await;
    let despesa_id = despesa["id"].as_i64().unwrap();

    let (status, _) = ctx
        .request("DELETE", &format!("/api/viagens/{}", trip_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Children are gone with the trip
    let (status, _) = ctx
        .request("GET", &format!("/api/destinos/{}", destino_id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request("GET", &format!("/api/despesas/{}", despesa_id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_setup_admin_conflicts_when_present() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let (status, body) = ctx
        .request_with_token("POST", "/auth/setup_admin", None, None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let admin_username = body["username"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .request_with_token("POST", "/auth/setup_admin", None, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    sqlx::query("DELETE FROM usuarios WHERE username = $1")
        .bind(&admin_username)
        .execute(&ctx.db)
        .await
        .unwrap();

    ctx.cleanup().await;
}
