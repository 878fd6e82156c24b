pub mod config;
pub mod controllers;
pub mod enums;
pub mod error;
pub mod json_repair;
pub mod models;
pub mod money;
pub mod report;
pub mod repositories;
pub mod services;
