pub mod app_config;
pub mod auth;
pub mod db;
pub mod middleware;
pub mod orm;
pub mod repository;
pub mod tally;
pub mod web;
