//! Mealsmith - budget-aware meal planning backend.
//!
//! # Overview
//!
//! Mealsmith stores user onboarding profiles, accepts generated meal plans,
//! and derives everything the app shows from them: nutrition and cost
//! rollups, consolidated shopping lists, calendar schedules, completion
//! streaks and translated plan content.
//!
//! The computation core is a set of pure functions over the domain model;
//! persistence, authentication, plan generation and translation are
//! external collaborators behind thin clients.
//!
//! # Modules
//!
//! - [`model`]: Domain types and construction-time validation
//! - [`aggregation`]: Nutrition/cost rollups and rollup verification
//! - [`shopping`]: Shopping-list consolidation and flag-preserving merge
//! - [`streak`]: Completion-streak statistics
//! - [`calories`]: Calorie targets and macro-gram conversion
//! - [`schedule`]: Start-date assignment, day moves, week copies, snapshots
//! - [`translation`]: Batched AI translation with an injectable cache
//! - [`export`]: Share-text and sectioned-document rendering
//! - [`storage`]: SQLite persistence, one JSON aggregate per row
//! - [`auth`]: Bearer-token resolution against the hosted auth service
//! - [`planner`]: Client for the hosted plan generator
//! - [`api`]: HTTP API handlers and router
//! - [`error`]: Validation/conflict/collaborator error taxonomy

pub mod aggregation;
pub mod api;
pub mod auth;
pub mod calories;
pub mod error;
pub mod export;
pub mod model;
pub mod planner;
pub mod schedule;
pub mod shopping;
pub mod storage;
pub mod streak;
pub mod translation;
