//! Services for bill-service.

pub mod catalog;
pub mod gateway;
pub mod lifecycle;
pub mod matcher;
pub mod metrics;
pub mod reconciliation;
pub mod validator;
