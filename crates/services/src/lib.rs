#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod essay_service;
pub mod quiz_service;
pub mod stats_service;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::{AreaSummary, CatalogService, IssuerSummary};
pub use error::{AppServicesError, CatalogError, EssayError, QuizError, StatsError};
pub use essay_service::{
    CompetencyScore, EssayReview, EssayService, EssayTopic, RemoteGraderConfig,
};
pub use quiz_service::{
    AnswerOutcome, AnswerView, FinishReport, QuestionView, QuizSelection, QuizService, QuizStep,
};
pub use stats_service::{AreaStats, BestResult, Dashboard, OverallStats, RecentResult, StatsService};
