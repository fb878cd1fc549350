pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod http;
pub mod ingest;
pub mod mappers;
pub mod models;
pub mod orchestrator;
pub mod permissions;
pub mod sanitize;
pub mod snowflake;
