//! In-process implementation of [`PortfolioStore`].
//!
//! Used by the test suites and by `STORE_BACKEND=memory` local runs. It
//! applies [`ProjectScope`] while collecting rows, mirroring the SQL
//! predicate in the Postgres repositories, and can be told to fail calls so
//! upstream-failure paths are testable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use portfolio_core::classification::CriticalityLevel;
use portfolio_core::scope::ProjectScope;
use portfolio_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::audit::{AuditEntry, AuditPage, NewAuditEntry};
use crate::models::presentation::{NewPresentationToken, PresentationToken};
use crate::models::project::{NewProject, Project, ProjectFilters};
use crate::models::risk::{NewRisk, Risk};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::store::{PortfolioStore, StoreResult};

#[derive(Default)]
struct State {
    users: HashMap<DbId, User>,
    projects: HashMap<DbId, Project>,
    risks: HashMap<DbId, Risk>,
    audit: Vec<AuditEntry>,
    tokens: HashMap<DbId, PresentationToken>,
    next_audit_id: i64,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
    audit_unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make only audit appends fail.
    pub fn set_audit_unavailable(&self, unavailable: bool) {
        self.audit_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Insert a user with a caller-chosen id. Used to seed fixtures.
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Total audit entries held, across all projects.
    pub async fn audit_len(&self) -> usize {
        self.state.read().await.audit.len()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PortfolioStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check_available()
    }

    // -- Users ---------------------------------------------------------------

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        self.check_available()?;
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let email = input.email.to_lowercase();
        if state.users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::Conflict(format!(
                "A user with email '{}' already exists",
                input.email
            )));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            email: input.email.clone(),
            full_name: input.full_name.clone(),
            role: input.role,
            department: input.department.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: DbId, input: &UpdateUser) -> StoreResult<Option<User>> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &input.full_name {
            user.full_name = v.clone();
        }
        if let Some(v) = input.role {
            user.role = v;
        }
        if let Some(v) = &input.department {
            user.department = Some(v.clone());
        }
        if let Some(v) = input.active {
            user.active = v;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    // -- Projects ------------------------------------------------------------

    async fn list_projects(
        &self,
        scope: ProjectScope,
        filters: &ProjectFilters,
    ) -> StoreResult<Vec<Project>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| scope.permits(p.manager_id, &p.team_member_ids))
            .filter(|p| filters.matches(p))
            .cloned()
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn find_project(&self, id: DbId, scope: ProjectScope) -> StoreResult<Option<Project>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .projects
            .get(&id)
            .filter(|p| scope.permits(p.manager_id, &p.team_member_ids))
            .cloned())
    }

    async fn create_project(&self, input: &NewProject) -> StoreResult<Project> {
        self.check_available()?;
        let now = Utc::now();
        let project = Project {
            id: Uuid::now_v7(),
            name: input.name.clone(),
            description: input.description.clone(),
            status: input.status,
            criticality_score: input.criticality_score,
            criticality_level: input.criticality_level,
            start_date: input.start_date,
            planned_end_date: input.planned_end_date,
            actual_end_date: None,
            progress_percentage: input.progress_percentage,
            manager_id: input.manager_id,
            team_member_ids: input.team_member_ids.clone(),
            financials: Some(input.financials),
            milestones: input.milestones.clone(),
            documents: input.documents.clone(),
            created_by: Some(input.created_by),
            created_at: now,
            updated_at: now,
        };
        self.state
            .write()
            .await
            .projects
            .insert(project.id, project.clone());
        Ok(project)
    }

    async fn update_project(&self, project: &Project) -> StoreResult<Option<Project>> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let Some(stored) = state.projects.get_mut(&project.id) else {
            return Ok(None);
        };
        let (score, level, created_by, created_at) = (
            stored.criticality_score,
            stored.criticality_level,
            stored.created_by,
            stored.created_at,
        );
        *stored = project.clone();
        stored.criticality_score = score;
        stored.criticality_level = level;
        stored.created_by = created_by;
        stored.created_at = created_at;
        stored.financials = Some(project.financials.unwrap_or_default());
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn set_criticality(
        &self,
        id: DbId,
        score: i32,
        level: CriticalityLevel,
    ) -> StoreResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        match state.projects.get_mut(&id) {
            Some(p) => {
                p.criticality_score = score;
                p.criticality_level = level;
                p.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_project(&self, id: DbId) -> StoreResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if state.projects.remove(&id).is_none() {
            return Ok(false);
        }
        state.risks.retain(|_, r| r.project_id != id);
        state.tokens.retain(|_, t| t.project_id != id);
        Ok(true)
    }

    // -- Risks ---------------------------------------------------------------

    async fn list_risks(&self, project_id: DbId) -> StoreResult<Vec<Risk>> {
        self.list_risks_for_projects(&[project_id]).await
    }

    async fn list_risks_for_projects(&self, project_ids: &[DbId]) -> StoreResult<Vec<Risk>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut risks: Vec<Risk> = state
            .risks
            .values()
            .filter(|r| project_ids.contains(&r.project_id))
            .cloned()
            .collect();
        risks.sort_by(|a, b| {
            a.project_id
                .cmp(&b.project_id)
                .then(b.risk_level.cmp(&a.risk_level))
                .then(a.identified_date.cmp(&b.identified_date))
                .then(a.id.cmp(&b.id))
        });
        Ok(risks)
    }

    async fn find_risk(&self, id: DbId) -> StoreResult<Option<Risk>> {
        self.check_available()?;
        Ok(self.state.read().await.risks.get(&id).cloned())
    }

    async fn create_risk(&self, input: &NewRisk) -> StoreResult<Risk> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if !state.projects.contains_key(&input.project_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        let now = Utc::now();
        let risk = Risk {
            id: Uuid::now_v7(),
            project_id: input.project_id,
            title: input.title.clone(),
            description: input.description.clone(),
            category: input.category,
            probability: input.probability,
            impact: input.impact,
            risk_level: input.risk_level,
            status: input.status,
            mitigation_plan: input.mitigation_plan.clone(),
            responsible_id: input.responsible_id,
            identified_date: input.identified_date,
            resolved_date: None,
            created_at: now,
            updated_at: now,
        };
        state.risks.insert(risk.id, risk.clone());
        Ok(risk)
    }

    async fn update_risk(&self, risk: &Risk) -> StoreResult<Option<Risk>> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let Some(stored) = state.risks.get_mut(&risk.id) else {
            return Ok(None);
        };
        let (project_id, identified_date, created_at) =
            (stored.project_id, stored.identified_date, stored.created_at);
        *stored = risk.clone();
        stored.project_id = project_id;
        stored.identified_date = identified_date;
        stored.created_at = created_at;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_risk(&self, id: DbId) -> StoreResult<bool> {
        self.check_available()?;
        Ok(self.state.write().await.risks.remove(&id).is_some())
    }

    // -- Audit ---------------------------------------------------------------

    async fn append_audit(&self, entries: &[NewAuditEntry]) -> StoreResult<Vec<AuditEntry>> {
        self.check_available()?;
        if self.audit_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut written = Vec::with_capacity(entries.len());
        for entry in entries {
            state.next_audit_id += 1;
            let row = AuditEntry {
                id: state.next_audit_id,
                project_id: entry.project_id,
                actor_id: entry.actor_id,
                action: entry.action,
                old_values: entry.old_values.clone(),
                new_values: entry.new_values.clone(),
                ip_address: entry.origin.ip_address.clone(),
                user_agent: entry.origin.user_agent.clone(),
                created_at: now,
            };
            state.audit.push(row.clone());
            written.push(row);
        }
        Ok(written)
    }

    async fn list_audit(&self, project_id: DbId, page: AuditPage) -> StoreResult<Vec<AuditEntry>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut entries: Vec<AuditEntry> = state
            .audit
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    // -- Presentation tokens -------------------------------------------------

    async fn insert_token(&self, input: &NewPresentationToken) -> StoreResult<PresentationToken> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if state.tokens.values().any(|t| t.token_hash == input.token_hash) {
            return Err(StoreError::Conflict("Duplicate presentation token".into()));
        }
        let token = PresentationToken {
            id: Uuid::now_v7(),
            project_id: input.project_id,
            issued_by: input.issued_by,
            token_hash: input.token_hash.clone(),
            view_role: input.view_role,
            expires_at: input.expires_at,
            active: true,
            access_count: 0,
            last_accessed_at: None,
            created_at: Utc::now(),
        };
        state.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_token(&self, id: DbId) -> StoreResult<Option<PresentationToken>> {
        self.check_available()?;
        Ok(self.state.read().await.tokens.get(&id).cloned())
    }

    async fn find_token_by_hash(&self, token_hash: &str) -> StoreResult<Option<PresentationToken>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn record_token_access(
        &self,
        id: DbId,
        now: Timestamp,
    ) -> StoreResult<Option<PresentationToken>> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let Some(token) = state.tokens.get_mut(&id).filter(|t| t.active) else {
            return Ok(None);
        };
        token.access_count += 1;
        token.last_accessed_at = Some(token.last_accessed_at.map_or(now, |prev| prev.max(now)));
        Ok(Some(token.clone()))
    }

    async fn deactivate_token(&self, id: DbId) -> StoreResult<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        match state.tokens.get_mut(&id).filter(|t| t.active) {
            Some(token) => {
                token.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
