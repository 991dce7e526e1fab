pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::{
    backfill_service::{BackfillService, BackfillSettings},
    catalog_service::{CatalogService, StatsStore},
    identity_service::{IdentityProvider, IdentityService},
    pacer::FixedIntervalPacer,
    quiz_generator::HttpQuizGenerator,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub backfill_service: BackfillService,
    pub stats: Arc<dyn StatsStore>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.generator_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let catalog = Arc::new(CatalogService::new(pool.clone()));
        let generator = HttpQuizGenerator::new(
            http_client,
            &config.quiz_functions_url,
            config.service_role_key.clone(),
        )?;
        let backfill_service = BackfillService::new(
            catalog.clone(),
            catalog.clone(),
            Arc::new(generator),
            Arc::new(FixedIntervalPacer::new(config.generation_interval)),
            BackfillSettings {
                default_limit: config.batch_default_limit,
                max_limit: config.batch_max_limit,
                overfetch_factor: config.batch_overfetch_factor,
                questions_per_quiz: config.questions_per_quiz,
            },
        );
        let identity = IdentityService::new(pool, config.jwt_secret.clone());

        Ok(Self::from_parts(Arc::new(identity), backfill_service, catalog))
    }

    pub fn from_parts(
        identity: Arc<dyn IdentityProvider>,
        backfill_service: BackfillService,
        stats: Arc<dyn StatsStore>,
    ) -> Self {
        Self {
            identity,
            backfill_service,
            stats,
        }
    }
}
