/// All entity identifiers are UUIDs issued by the store.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (project start, planned end, milestones) carry no time zone.
pub type Date = chrono::NaiveDate;
