pub mod app_config;
pub mod constants;
pub mod db;
pub mod middleware;
pub mod migration;
pub mod orm;
pub mod polls;
pub mod web;
