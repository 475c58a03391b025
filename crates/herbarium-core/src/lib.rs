pub mod config;
pub mod logging;

pub mod auth;
pub mod catalog;
pub mod forms;
pub mod inventory_db;
pub mod stock;
pub mod storage;
pub mod text;
pub mod upload;
