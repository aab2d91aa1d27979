use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::AreaCatalog;
use storage::repository::Storage;

use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::essay_service::EssayService;
use crate::quiz_service::QuizService;
use crate::stats_service::StatsService;

/// Assembles the app-facing services over a storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CatalogService>,
    quiz: Arc<QuizService>,
    stats: Arc<StatsService>,
    essay: Arc<EssayService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with the essay grader
    /// configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, EssayService::from_env()))
    }

    /// Build services over an existing storage backend (in-memory in tests).
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, essay: EssayService) -> Self {
        let catalog = Arc::new(AreaCatalog::standard());

        let catalog_service = Arc::new(CatalogService::new(
            Arc::clone(&catalog),
            Arc::clone(&storage.questions),
        ));
        let quiz = Arc::new(QuizService::new(
            clock,
            Arc::clone(&catalog),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.results),
            Arc::clone(&storage.sessions),
        ));
        let stats = Arc::new(StatsService::new(
            catalog,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.results),
        ));

        Self {
            catalog: catalog_service,
            quiz,
            stats,
            essay: Arc::new(essay),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn essay(&self) -> Arc<EssayService> {
        Arc::clone(&self.essay)
    }
}
