// src/handlers/mod.rs

pub mod comment;
pub mod like;
pub mod post;
