pub mod api;
pub mod config;
pub mod event;
pub mod humanize;
pub mod observability;
pub mod relay;
