//! Core domain modules of the SmartLMS backend
//!
//! Each feature module owns its request validation, its axum router and the
//! state that router needs. Persistence lives under [`db`].

pub mod admin;
pub mod auth;
pub mod config;
pub mod courses;
pub mod db;
pub mod goals;
pub mod notifications;
pub mod predictions;
pub mod progress;
pub mod projects;
pub mod response;
pub mod storage;
pub mod students;
pub mod templates;
pub mod validation;

#[cfg(test)]
pub mod testing;
