use std::sync::Arc;

use serde::Serialize;

use exam_core::model::AreaCatalog;
use storage::repository::QuestionRepository;

use crate::error::CatalogError;

/// A catalog area with its live question count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaSummary {
    pub name: String,
    pub subjects: Vec<String>,
    pub question_count: u64,
}

/// An issuing organization with its question count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuerSummary {
    pub name: String,
    pub question_count: u64,
}

/// Read-through listings over the area catalog and the question bank.
pub struct CatalogService {
    catalog: Arc<AreaCatalog>,
    questions: Arc<dyn QuestionRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(catalog: Arc<AreaCatalog>, questions: Arc<dyn QuestionRepository>) -> Self {
        Self { catalog, questions }
    }

    /// Every area with at least one stored question, sorted by count
    /// descending.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn list_areas(&self) -> Result<Vec<AreaSummary>, CatalogError> {
        let mut areas = Vec::new();
        for entry in self.catalog.entries() {
            if entry.subjects.is_empty() {
                continue;
            }
            let question_count = self.questions.count_by_subjects(&entry.subjects).await?;
            if question_count == 0 {
                continue;
            }
            areas.push(AreaSummary {
                name: entry.name.clone(),
                subjects: entry.subjects.clone(),
                question_count,
            });
        }
        areas.sort_by(|a, b| b.question_count.cmp(&a.question_count));
        Ok(areas)
    }

    /// Distinct issuers present in the question bank, sorted by count
    /// descending.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn list_issuers(&self) -> Result<Vec<IssuerSummary>, CatalogError> {
        let counts = self.questions.issuer_counts().await?;
        Ok(counts
            .into_iter()
            .map(|(name, question_count)| IssuerSummary {
                name,
                question_count,
            })
            .collect())
    }
}
