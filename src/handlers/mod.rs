// src/handlers/mod.rs

pub mod auth;
pub mod lesson;
pub mod report;
pub mod survey;
