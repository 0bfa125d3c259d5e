//! Casper
//!
//! Command line client for Cloud Deploy: lists and inspects applications,
//! deployments and jobs, submits jobs and follows their logs.

pub mod cli;
pub mod commands;
pub mod errors;
pub mod http;
pub mod joblog;
pub mod logs;
pub mod models;
pub mod settings;
pub mod utils;
