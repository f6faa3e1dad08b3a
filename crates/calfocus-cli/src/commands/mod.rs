pub mod account;
pub mod auth;
pub mod bridge;
pub mod calendar;
pub mod check;
pub mod config;
pub mod focus;
pub mod run;
pub mod status;
