pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::repository::Storage;
use crate::services::{
    application_service::ApplicationService, chat_service::ChatService,
    cleanup_service::CleanupEngine, file_store::FileStore,
};
use crate::utils::time::Clock;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub application_service: ApplicationService,
    pub chat_service: ChatService,
    pub cleanup_engine: Arc<CleanupEngine>,
    pub file_store: Arc<dyn FileStore>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        storage: Storage,
        file_store: Arc<dyn FileStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let chat_service = ChatService::new(
            storage.applications.clone(),
            storage.chats.clone(),
            clock.clone(),
        );
        let application_service = ApplicationService::new(
            &storage,
            file_store.clone(),
            chat_service.clone(),
            clock.clone(),
        );
        let cleanup_engine = Arc::new(CleanupEngine::new(
            storage.applications.clone(),
            file_store.clone(),
            clock,
            &config.cleanup,
        ));

        Self {
            config,
            application_service,
            chat_service,
            cleanup_engine,
            file_store,
        }
    }
}
