//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - An entity struct as returned to callers (`FromRow` where the row maps directly)
//! - A `Deserialize` create DTO validated with `validator`
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//! - The resolved insert struct handed to the store

pub mod audit;
pub mod presentation;
pub mod project;
pub mod risk;
pub mod user;
