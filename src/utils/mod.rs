// src/utils/mod.rs
pub mod text;
