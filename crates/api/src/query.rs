//! Shared query parameter types for API handlers.

use std::str::FromStr;

use portfolio_core::classification::CriticalityLevel;
use portfolio_core::error::CoreError;
use portfolio_core::project::ProjectStatus;
use portfolio_core::types::DbId;
use portfolio_db::models::audit::AuditPage;
use portfolio_db::models::project::ProjectFilters;
use serde::Deserialize;

/// Pagination parameters (`?limit=&offset=`). Clamped in [`AuditPage`].
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<PaginationParams> for AuditPage {
    fn from(p: PaginationParams) -> Self {
        AuditPage {
            limit: p.limit,
            offset: p.offset,
        }
    }
}

/// `GET /projects` filters.
///
/// `status` and `level` take comma-separated lists, e.g.
/// `?status=InProgress,Paused&level=Red`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListParams {
    pub status: Option<String>,
    pub level: Option<String>,
    pub manager_id: Option<DbId>,
    pub search: Option<String>,
}

impl ProjectListParams {
    pub fn into_filters(self) -> Result<ProjectFilters, CoreError> {
        Ok(ProjectFilters {
            statuses: parse_list::<ProjectStatus>(self.status.as_deref())?,
            levels: parse_list::<CriticalityLevel>(self.level.as_deref())?,
            manager_id: self.manager_id,
            search: self.search.filter(|s| !s.trim().is_empty()),
        })
    }
}

fn parse_list<T>(raw: Option<&str>) -> Result<Vec<T>, CoreError>
where
    T: FromStr<Err = CoreError>,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_are_parsed() {
        let filters = ProjectListParams {
            status: Some("InProgress, Paused".into()),
            level: Some("Red".into()),
            ..Default::default()
        }
        .into_filters()
        .unwrap();
        assert_eq!(filters.statuses, [ProjectStatus::InProgress, ProjectStatus::Paused]);
        assert_eq!(filters.levels, [CriticalityLevel::Red]);
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = ProjectListParams {
            status: Some("Archived".into()),
            ..Default::default()
        }
        .into_filters()
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn blank_search_is_dropped() {
        let filters = ProjectListParams {
            search: Some("  ".into()),
            ..Default::default()
        }
        .into_filters()
        .unwrap();
        assert!(filters.search.is_none());
    }
}
