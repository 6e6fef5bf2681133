//! Request extractors for authentication and role-based authorization.

pub mod auth;
pub mod rbac;
