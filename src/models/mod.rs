// src/models/mod.rs

pub mod lesson;
pub mod member;
pub mod survey;
