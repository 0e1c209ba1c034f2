//! IC偽造品検査ステーション オペレーター用CLI

pub mod batch;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
