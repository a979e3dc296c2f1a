// src/utils/mod.rs

pub mod client;
pub mod html;
pub mod jwt;
