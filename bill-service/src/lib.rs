//! Bill Service - Reconciliation and verification of analysed vendor bills
//! and journal entries against ledger master data.

pub mod config;
pub mod models;
pub mod services;
