pub mod audit;
pub mod classification;
pub mod criticality;
pub mod dashboard;
pub mod error;
pub mod field_filter;
pub mod hashing;
pub mod permissions;
pub mod presentation;
pub mod project;
pub mod risk;
pub mod roles;
pub mod scope;
pub mod types;
