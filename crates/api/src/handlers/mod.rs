pub mod dashboard;
pub mod presentations;
pub mod projects;
pub mod risks;
pub mod users;
