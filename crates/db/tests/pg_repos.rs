//! Repository tests against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` set and `cargo test -- --ignored`.
//! - Role scope is part of the SQL predicate
//! - Cascade delete keeps audit history
//! - Unique email and token-hash constraints
//! - Token access counting

use chrono::{Duration, NaiveDate, Utc};
use portfolio_core::audit::{AuditAction, AuditOrigin};
use portfolio_core::classification::CriticalityLevel;
use portfolio_core::field_filter::ProjectFinancials;
use portfolio_core::project::ProjectStatus;
use portfolio_core::risk::RiskCategory;
use portfolio_core::roles::Role;
use portfolio_core::scope::ProjectScope;
use portfolio_core::types::DbId;
use portfolio_db::models::audit::{AuditPage, NewAuditEntry};
use portfolio_db::models::presentation::NewPresentationToken;
use portfolio_db::models::project::{NewProject, ProjectFilters};
use portfolio_db::models::risk::{CreateRisk, NewRisk};
use portfolio_db::models::user::CreateUser;
use portfolio_db::repositories::{
    AuditEntryRepo, PresentationTokenRepo, ProjectRepo, RiskRepo, UserRepo,
};
use portfolio_db::StoreError;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn user(pool: &PgPool, email: &str, role: Role) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            full_name: email.to_string(),
            role,
            department: Some("PMO".into()),
        },
    )
    .await
    .unwrap()
    .id
}

fn new_project(name: &str, manager_id: DbId, team: Vec<DbId>) -> NewProject {
    NewProject {
        name: name.to_string(),
        description: Some("Test project".into()),
        status: ProjectStatus::InProgress,
        criticality_score: 0,
        criticality_level: CriticalityLevel::Green,
        start_date: date(2026, 1, 1),
        planned_end_date: Some(date(2026, 6, 30)),
        progress_percentage: 10,
        manager_id,
        team_member_ids: team,
        financials: ProjectFinancials {
            initial_budget: Some(50_000.0),
            realized_cost: Some(12_500.0),
            ..Default::default()
        },
        milestones: Vec::new(),
        documents: Vec::new(),
        created_by: manager_id,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn project_round_trips_financials_and_json_columns(pool: PgPool) {
    let gp = user(&pool, "gp@corp.example", Role::Gp).await;
    let created = ProjectRepo::create(&pool, &new_project("ERP", gp, vec![])).await.unwrap();

    let fetched = ProjectRepo::find_by_id(&pool, created.id, ProjectScope::Unrestricted)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.financials.unwrap().initial_budget, Some(50_000.0));
    assert_eq!(fetched.status, ProjectStatus::InProgress);
    assert!(fetched.milestones.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn team_scope_is_applied_in_sql(pool: PgPool) {
    let gp = user(&pool, "gp@corp.example", Role::Gp).await;
    let me = user(&pool, "me@corp.example", Role::Me).await;
    ProjectRepo::create(&pool, &new_project("Staffed", gp, vec![me])).await.unwrap();
    ProjectRepo::create(&pool, &new_project("Unstaffed", gp, vec![])).await.unwrap();

    let rows = ProjectRepo::list(&pool, ProjectScope::TeamMember(me), &ProjectFilters::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Staffed");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn search_filter_matches_literal_wildcards(pool: PgPool) {
    let gp = user(&pool, "gp@corp.example", Role::Gp).await;
    ProjectRepo::create(&pool, &new_project("Cut costs 50%", gp, vec![])).await.unwrap();
    ProjectRepo::create(&pool, &new_project("Cut costs 500", gp, vec![])).await.unwrap();

    let rows = ProjectRepo::list(
        &pool,
        ProjectScope::Unrestricted,
        &ProjectFilters {
            search: Some("50%".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Cut costs 50%");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn delete_cascades_risks_but_keeps_audit(pool: PgPool) {
    let admin = user(&pool, "admin@corp.example", Role::Admin).await;
    let project = ProjectRepo::create(&pool, &new_project("Doomed", admin, vec![])).await.unwrap();
    let risk_input = CreateRisk {
        title: "Supplier insolvency".into(),
        description: None,
        category: RiskCategory::Financial,
        probability: 2,
        impact: 5,
        mitigation_plan: None,
        responsible_id: None,
    };
    let risk = RiskRepo::create(&pool, &NewRisk::open(project.id, &risk_input, date(2026, 2, 1)).unwrap())
        .await
        .unwrap();
    assert_eq!(risk.risk_level, 10);

    AuditEntryRepo::batch_insert(
        &pool,
        &[NewAuditEntry {
            project_id: project.id,
            actor_id: admin,
            action: AuditAction::Delete,
            old_values: Some(project.snapshot()),
            new_values: None,
            origin: AuditOrigin {
                ip_address: Some("10.0.0.1".into()),
                user_agent: None,
            },
        }],
    )
    .await
    .unwrap();

    assert!(ProjectRepo::hard_delete(&pool, project.id).await.unwrap());
    assert!(RiskRepo::find_by_id(&pool, risk.id).await.unwrap().is_none());
    let history = AuditEntryRepo::list_by_project(&pool, project.id, AuditPage::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].ip_address.as_deref(), Some("10.0.0.1"));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_maps_to_conflict(pool: PgPool) {
    user(&pool, "dup@corp.example", Role::Me).await;
    let err = UserRepo::create(
        &pool,
        &CreateUser {
            email: "DUP@corp.example".into(),
            full_name: "Dup".into(),
            role: Role::Me,
            department: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(StoreError::from(err), StoreError::Conflict(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn token_access_count_is_atomic_and_monotonic(pool: PgPool) {
    let gp = user(&pool, "gp@corp.example", Role::Gp).await;
    let project = ProjectRepo::create(&pool, &new_project("Shown", gp, vec![])).await.unwrap();
    let token = PresentationTokenRepo::create(
        &pool,
        &NewPresentationToken {
            project_id: project.id,
            issued_by: gp,
            token_hash: "c".repeat(64),
            view_role: Role::Gp,
            expires_at: Utc::now() + Duration::hours(24),
        },
    )
    .await
    .unwrap();

    let later = Utc::now();
    PresentationTokenRepo::record_access(&pool, token.id, later).await.unwrap();
    let after = PresentationTokenRepo::record_access(&pool, token.id, later - Duration::hours(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.access_count, 2);
    assert!(after.last_accessed_at.unwrap() >= later - Duration::milliseconds(1));

    assert!(PresentationTokenRepo::deactivate(&pool, token.id).await.unwrap());
    assert!(PresentationTokenRepo::record_access(&pool, token.id, Utc::now())
        .await
        .unwrap()
        .is_none());
}
