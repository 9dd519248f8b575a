pub mod app;
pub mod auth;
pub mod calendar;
pub mod config;
mod legacy;
pub mod nutrition;
pub mod state;
pub mod storage;
pub mod workouts;
