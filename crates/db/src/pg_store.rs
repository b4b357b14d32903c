//! PostgreSQL implementation of [`PortfolioStore`], delegating to the
//! repositories.

use async_trait::async_trait;
use portfolio_core::classification::CriticalityLevel;
use portfolio_core::scope::ProjectScope;
use portfolio_core::types::{DbId, Timestamp};

use crate::models::audit::{AuditEntry, AuditPage, NewAuditEntry};
use crate::models::presentation::{NewPresentationToken, PresentationToken};
use crate::models::project::{NewProject, Project, ProjectFilters};
use crate::models::risk::{NewRisk, Risk};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repositories::{
    AuditEntryRepo, PresentationTokenRepo, ProjectRepo, RiskRepo, UserRepo,
};
use crate::store::{PortfolioStore, StoreResult};
use crate::DbPool;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl PortfolioStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(UserRepo::list(&self.pool).await?)
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn update_user(&self, id: DbId, input: &UpdateUser) -> StoreResult<Option<User>> {
        Ok(UserRepo::update(&self.pool, id, input).await?)
    }

    async fn list_projects(
        &self,
        scope: ProjectScope,
        filters: &ProjectFilters,
    ) -> StoreResult<Vec<Project>> {
        Ok(ProjectRepo::list(&self.pool, scope, filters).await?)
    }

    async fn find_project(&self, id: DbId, scope: ProjectScope) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::find_by_id(&self.pool, id, scope).await?)
    }

    async fn create_project(&self, input: &NewProject) -> StoreResult<Project> {
        Ok(ProjectRepo::create(&self.pool, input).await?)
    }

    async fn update_project(&self, project: &Project) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::update(&self.pool, project).await?)
    }

    async fn set_criticality(
        &self,
        id: DbId,
        score: i32,
        level: CriticalityLevel,
    ) -> StoreResult<bool> {
        Ok(ProjectRepo::set_criticality(&self.pool, id, score, level).await?)
    }

    async fn delete_project(&self, id: DbId) -> StoreResult<bool> {
        Ok(ProjectRepo::hard_delete(&self.pool, id).await?)
    }

    async fn list_risks(&self, project_id: DbId) -> StoreResult<Vec<Risk>> {
        Ok(RiskRepo::list_by_project(&self.pool, project_id).await?)
    }

    async fn list_risks_for_projects(&self, project_ids: &[DbId]) -> StoreResult<Vec<Risk>> {
        Ok(RiskRepo::list_by_projects(&self.pool, project_ids).await?)
    }

    async fn find_risk(&self, id: DbId) -> StoreResult<Option<Risk>> {
        Ok(RiskRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_risk(&self, input: &NewRisk) -> StoreResult<Risk> {
        Ok(RiskRepo::create(&self.pool, input).await?)
    }

    async fn update_risk(&self, risk: &Risk) -> StoreResult<Option<Risk>> {
        Ok(RiskRepo::update(&self.pool, risk).await?)
    }

    async fn delete_risk(&self, id: DbId) -> StoreResult<bool> {
        Ok(RiskRepo::delete(&self.pool, id).await?)
    }

    async fn append_audit(&self, entries: &[NewAuditEntry]) -> StoreResult<Vec<AuditEntry>> {
        Ok(AuditEntryRepo::batch_insert(&self.pool, entries).await?)
    }

    async fn list_audit(&self, project_id: DbId, page: AuditPage) -> StoreResult<Vec<AuditEntry>> {
        Ok(AuditEntryRepo::list_by_project(&self.pool, project_id, page).await?)
    }

    async fn insert_token(&self, input: &NewPresentationToken) -> StoreResult<PresentationToken> {
        Ok(PresentationTokenRepo::create(&self.pool, input).await?)
    }

    async fn find_token(&self, id: DbId) -> StoreResult<Option<PresentationToken>> {
        Ok(PresentationTokenRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_token_by_hash(&self, token_hash: &str) -> StoreResult<Option<PresentationToken>> {
        Ok(PresentationTokenRepo::find_by_hash(&self.pool, token_hash).await?)
    }

    async fn record_token_access(
        &self,
        id: DbId,
        now: Timestamp,
    ) -> StoreResult<Option<PresentationToken>> {
        Ok(PresentationTokenRepo::record_access(&self.pool, id, now).await?)
    }

    async fn deactivate_token(&self, id: DbId) -> StoreResult<bool> {
        Ok(PresentationTokenRepo::deactivate(&self.pool, id).await?)
    }
}
