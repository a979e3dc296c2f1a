// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

use crate::error::AppError;

/// Weights of the post heat score:
/// `heat = likes * like + comments * comment + views * view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatWeights {
    pub like: i64,
    pub comment: i64,
    pub view: i64,
}

impl HeatWeights {
    pub fn score(&self, likes: i64, comments: i64, views: i64) -> i64 {
        likes * self.like + comments * self.comment + views * self.view
    }
}

impl Default for HeatWeights {
    fn default() -> Self {
        Self {
            like: 3,
            comment: 5,
            view: 1,
        }
    }
}

/// Tuning values injected into the engine components.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub max_reply_depth: i64,
    pub heat: HeatWeights,
    pub liked_users_max: i64,
    pub page_size_max: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_reply_depth: 5,
            heat: HeatWeights::default(),
            liked_users_max: 100,
            page_size_max: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub engine: EngineSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://engagement.db".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET must be set".to_string()))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let defaults = EngineSettings::default();
        let engine = EngineSettings {
            max_reply_depth: parse_var("MAX_REPLY_DEPTH", defaults.max_reply_depth)?,
            heat: HeatWeights {
                like: parse_var("HEAT_WEIGHT_LIKE", defaults.heat.like)?,
                comment: parse_var("HEAT_WEIGHT_COMMENT", defaults.heat.comment)?,
                view: parse_var("HEAT_WEIGHT_VIEW", defaults.heat.view)?,
            },
            liked_users_max: parse_var("LIKED_USERS_MAX", defaults.liked_users_max)?,
            page_size_max: parse_var("PAGE_SIZE_MAX", defaults.page_size_max)?,
        };

        if engine.max_reply_depth < 1 {
            return Err(AppError::Config(
                "MAX_REPLY_DEPTH must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            engine,
        })
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}")))
}
