/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, logout, profile)
/// - `tasks`: Task CRUD and filtered views

pub mod auth;
pub mod health;
pub mod tasks;
