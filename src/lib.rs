//! Heart-disease risk service
//!
//! Predicts heart-disease risk from 11 clinical features, trains the
//! classification pipeline offline and keeps every observed record in
//! PostgreSQL under a feature-identity uniqueness contract.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         HEART RISK                             │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌────────────────┐   ┌──────────────────────┐  │
//! │  │ POST     │   │ Prediction     │   │ ETL Orchestrator     │  │
//! │  │ /predict ├──►│ Service        │   │ (load_to_db)         │  │
//! │  │ (Axum)   │   └───────▲────────┘   └──────────┬───────────┘  │
//! │  └────┬─────┘           │ artifact              │              │
//! │       │         ┌───────┴────────┐              │              │
//! │       │         │ Training       │◄── dataset ──┤              │
//! │       │         │ Service        │              │              │
//! │       │         └────────────────┘              ▼              │
//! │       └──────────────────────────────►┌──────────────────┐     │
//! │                                       │ Upsert Repository│     │
//! │                                       │ (PostgreSQL)     │     │
//! │                                       └──────────────────┘     │
//! └────────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod config;
pub mod dataset;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod services;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{AppError, AppResult, Error, Result};
