//! HTTP-level integration tests for the dashboard and its view cache.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, future_project};
use portfolio_core::classification::CriticalityLevel;
use portfolio_core::roles::Role;
use portfolio_db::PortfolioStore;
use serde_json::json;

#[tokio::test]
async fn empty_portfolio_has_zeroed_metrics() {
    let app = build_test_app();
    let (_, admin) = app.user(Role::Admin).await;

    let response = app.get("/api/v1/dashboard", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let metrics = body_json(response).await["data"].clone();
    assert_eq!(metrics["total"], 0);
    assert_eq!(metrics["critical_count"], 0);
    assert_eq!(metrics["success_rate"], 0.0);
    assert_eq!(metrics["by_status"]["Planning"], 0);
    assert_eq!(metrics["financials"]["initial_budget"], 0.0);
    assert!(metrics["top_critical"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn dashboard_is_scoped_and_filtered_per_role() {
    let app = build_test_app();
    let (_, admin) = app.user(Role::Admin).await;
    let (_, dir) = app.user(Role::Dir).await;
    let (_, gp) = app.user(Role::Gp).await;

    let mut funded = future_project("Funded");
    funded["initial_budget"] = json!(250.0);
    app.create_project(&admin, funded).await;
    app.create_project(&gp, future_project("Own project")).await;

    let metrics = body_json(app.get("/api/v1/dashboard", Some(&gp)).await).await["data"].clone();
    assert_eq!(metrics["total"], 1);
    assert!(metrics["financials"].is_null());

    let metrics = body_json(app.get("/api/v1/dashboard", Some(&dir)).await).await["data"].clone();
    assert_eq!(metrics["total"], 2);
    assert_eq!(metrics["by_status"]["Planning"], 2);
    assert_eq!(metrics["financials"]["initial_budget"], 250.0);
}

#[tokio::test]
async fn critical_projects_are_counted_and_ranked() {
    let app = build_test_app();
    let (_, admin) = app.user(Role::Admin).await;

    let mut overspent = future_project("Overspent");
    overspent["initial_budget"] = json!(100.0);
    overspent["realized_cost"] = json!(200.0);
    let project = app.create_project(&admin, overspent).await;
    app.create_project(&admin, future_project("Quiet")).await;

    app.post(
        &format!("/api/v1/projects/{}/risks", project["id"].as_str().unwrap()),
        Some(&admin),
        json!({
            "title": "Supplier insolvency",
            "category": "Financial",
            "probability": 5,
            "impact": 5,
        }),
    )
    .await;

    let metrics = body_json(app.get("/api/v1/dashboard", Some(&admin)).await).await["data"].clone();
    assert_eq!(metrics["total"], 2);
    assert_eq!(metrics["critical_count"], 1);
    assert_eq!(metrics["mean_criticality"], 35.0);
    let top = metrics["top_critical"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["name"], "Overspent");
    assert_eq!(top[0]["criticality_score"], 70);
    assert_eq!(top[0]["criticality_level"], "Red");
    assert_eq!(metrics["financials"]["realized_cost"], 200.0);
}

#[tokio::test]
async fn mutations_invalidate_cached_dashboards() {
    let app = build_test_app();
    let (_, admin) = app.user(Role::Admin).await;
    let (_, dir) = app.user(Role::Dir).await;
    assert!(app.state.view_cache.is_empty());

    let first = body_json(app.get("/api/v1/dashboard", Some(&admin)).await).await;
    assert_eq!(first["data"]["total"], 0);
    assert_eq!(app.state.view_cache.len(), 1);

    // Served from cache: still one entry per user.
    let again = body_json(app.get("/api/v1/dashboard", Some(&admin)).await).await;
    assert_eq!(again, first);
    app.get("/api/v1/dashboard", Some(&dir)).await;
    assert_eq!(app.state.view_cache.len(), 2);

    app.create_project(&admin, future_project("Fresh")).await;
    assert!(app.state.view_cache.is_empty());

    let after = body_json(app.get("/api/v1/dashboard", Some(&dir)).await).await;
    assert_eq!(after["data"]["total"], 1);
}

#[tokio::test]
async fn risk_changes_refresh_cached_dashboards_when_the_score_is_unchanged() {
    let app = build_test_app();
    let (_, admin) = app.user(Role::Admin).await;
    let project = app.create_project(&admin, future_project("Drifted")).await;
    let id: uuid::Uuid = project["id"].as_str().unwrap().parse().unwrap();

    // A stored score that already matches what one 5x5 risk yields, so the
    // risk write below leaves the cached score untouched.
    assert!(app.store.set_criticality(id, 40, CriticalityLevel::Yellow).await.unwrap());

    let before = body_json(app.get("/api/v1/dashboard", Some(&admin)).await).await;
    assert_eq!(before["data"]["mean_criticality"], 0.0);
    assert_eq!(app.state.view_cache.len(), 1);

    let response = app
        .post(
            &format!("/api/v1/projects/{id}/risks"),
            Some(&admin),
            json!({
                "title": "Regulatory change",
                "category": "External",
                "probability": 5,
                "impact": 5,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(app.state.view_cache.is_empty());

    let after = body_json(app.get("/api/v1/dashboard", Some(&admin)).await).await;
    assert_eq!(after["data"]["mean_criticality"], 40.0);
    assert_eq!(after["data"]["top_critical"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn dashboard_requires_authentication() {
    let app = build_test_app();

    let response = app.get("/api/v1/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHENTICATED");
}
