// src/lib.rs

//! DeFi Insights Library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod sources;
pub mod storage;
