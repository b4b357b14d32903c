//! The persistent-store collaborator contract.
//!
//! Services only ever talk to a [`PortfolioStore`]. [`crate::PgStore`] backs
//! it with PostgreSQL; [`crate::InMemoryStore`] keeps everything in process
//! for tests and local runs. Both must honour the same semantics, in
//! particular that [`ProjectScope`] narrows what is fetched.

use std::sync::Arc;

use async_trait::async_trait;
use portfolio_core::classification::CriticalityLevel;
use portfolio_core::scope::ProjectScope;
use portfolio_core::types::{DbId, Timestamp};

use crate::error::StoreError;
use crate::models::audit::{AuditEntry, AuditPage, NewAuditEntry};
use crate::models::presentation::{NewPresentationToken, PresentationToken};
use crate::models::project::{NewProject, Project, ProjectFilters};
use crate::models::risk::{NewRisk, Risk};
use crate::models::user::{CreateUser, UpdateUser, User};

pub type StoreResult<T> = Result<T, StoreError>;

pub type SharedStore = Arc<dyn PortfolioStore>;

#[async_trait]
pub trait PortfolioStore: Send + Sync + 'static {
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> StoreResult<()>;

    // -- Users ---------------------------------------------------------------

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>>;

    /// All users ordered by name.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Fails with [`StoreError::Conflict`] on a duplicate email.
    async fn create_user(&self, input: &CreateUser) -> StoreResult<User>;

    async fn update_user(&self, id: DbId, input: &UpdateUser) -> StoreResult<Option<User>>;

    // -- Projects ------------------------------------------------------------

    /// Projects inside `scope` matching `filters`, ordered by name.
    async fn list_projects(
        &self,
        scope: ProjectScope,
        filters: &ProjectFilters,
    ) -> StoreResult<Vec<Project>>;

    /// A single project, or `None` if it does not exist or lies outside `scope`.
    async fn find_project(&self, id: DbId, scope: ProjectScope) -> StoreResult<Option<Project>>;

    async fn create_project(&self, input: &NewProject) -> StoreResult<Project>;

    /// Write every editable column of `project`. Last write wins.
    async fn update_project(&self, project: &Project) -> StoreResult<Option<Project>>;

    /// Overwrite the cached criticality of a project.
    async fn set_criticality(
        &self,
        id: DbId,
        score: i32,
        level: CriticalityLevel,
    ) -> StoreResult<bool>;

    /// Hard delete. Risks and tokens go with the project; audit entries stay.
    async fn delete_project(&self, id: DbId) -> StoreResult<bool>;

    // -- Risks ---------------------------------------------------------------

    /// Risks of one project, highest `risk_level` first.
    async fn list_risks(&self, project_id: DbId) -> StoreResult<Vec<Risk>>;

    /// Risks of several projects in one round trip.
    async fn list_risks_for_projects(&self, project_ids: &[DbId]) -> StoreResult<Vec<Risk>>;

    async fn find_risk(&self, id: DbId) -> StoreResult<Option<Risk>>;

    async fn create_risk(&self, input: &NewRisk) -> StoreResult<Risk>;

    async fn update_risk(&self, risk: &Risk) -> StoreResult<Option<Risk>>;

    async fn delete_risk(&self, id: DbId) -> StoreResult<bool>;

    // -- Audit ---------------------------------------------------------------

    /// Append entries in one batch.
    async fn append_audit(&self, entries: &[NewAuditEntry]) -> StoreResult<Vec<AuditEntry>>;

    /// A project's history, newest first.
    async fn list_audit(&self, project_id: DbId, page: AuditPage) -> StoreResult<Vec<AuditEntry>>;

    // -- Presentation tokens -------------------------------------------------

    async fn insert_token(&self, input: &NewPresentationToken) -> StoreResult<PresentationToken>;

    async fn find_token(&self, id: DbId) -> StoreResult<Option<PresentationToken>>;

    async fn find_token_by_hash(&self, token_hash: &str) -> StoreResult<Option<PresentationToken>>;

    /// Atomically bump the access counter and move `last_accessed_at`
    /// forward to `now` (never backwards). Only active tokens are touched.
    async fn record_token_access(
        &self,
        id: DbId,
        now: Timestamp,
    ) -> StoreResult<Option<PresentationToken>>;

    async fn deactivate_token(&self, id: DbId) -> StoreResult<bool>;
}
