use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::EssayError;

//
// ─── TOPICS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EssayTopic {
    pub id: u32,
    pub title: &'static str,
}

const TOPICS: &[EssayTopic] = &[
    EssayTopic { id: 1, title: "Os desafios da educação pública brasileira no século XXI" },
    EssayTopic { id: 2, title: "Impactos da inteligência artificial no mercado de trabalho" },
    EssayTopic { id: 3, title: "Crise hídrica e gestão sustentável dos recursos naturais" },
    EssayTopic { id: 4, title: "Violência urbana e políticas de segurança pública" },
    EssayTopic { id: 5, title: "Desafios do sistema de saúde pública no Brasil" },
    EssayTopic { id: 6, title: "A importância da preservação da Amazônia para o equilíbrio climático" },
    EssayTopic { id: 7, title: "Os efeitos das fake news na democracia brasileira" },
    EssayTopic { id: 8, title: "Mobilidade urbana e qualidade de vida nas grandes cidades" },
    EssayTopic { id: 9, title: "Desigualdade social e seus impactos no acesso à educação" },
    EssayTopic { id: 10, title: "Tecnologia e privacidade: os limites da exposição digital" },
    EssayTopic { id: 11, title: "Esporte como ferramenta de inclusão social" },
    EssayTopic { id: 12, title: "Desafios da alimentação saudável na sociedade contemporânea" },
    EssayTopic { id: 13, title: "Representatividade racial nos espaços de poder" },
    EssayTopic { id: 14, title: "Sustentabilidade e consumo consciente" },
    EssayTopic { id: 15, title: "Envelhecimento populacional e previdência social" },
    EssayTopic { id: 16, title: "Democratização do acesso à cultura no Brasil" },
    EssayTopic { id: 17, title: "Desafios da inclusão de pessoas com deficiência no mercado de trabalho" },
    EssayTopic { id: 18, title: "Importância do investimento em ciência e tecnologia" },
    EssayTopic { id: 19, title: "Crise habitacional e direito à moradia" },
    EssayTopic { id: 20, title: "Preconceito linguístico na sociedade brasileira" },
];

//
// ─── REVIEW SHAPES ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub name: String,
    pub score: u32,
    pub comment: String,
}

/// Rubric breakdown for one graded essay. Scores are on a 0..=100 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayReview {
    pub overall: u32,
    pub competencies: Vec<CompetencyScore>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
    pub exam_tips: Vec<String>,
}

/// Fixed competency weights of the rubric; they sum to 1.0.
const COMPETENCIES: &[(&str, f64, &str)] = &[
    (
        "Competência 1: Domínio da norma culta",
        0.18,
        "Bom domínio da norma padrão, com poucos desvios gramaticais.",
    ),
    (
        "Competência 2: Compreensão do tema e estrutura",
        0.20,
        "Tema compreendido adequadamente com estrutura dissertativa clara.",
    ),
    (
        "Competência 3: Argumentação e repertório",
        0.19,
        "Argumentos consistentes, poderia usar mais repertório sociocultural.",
    ),
    (
        "Competência 4: Coesão e coerência",
        0.20,
        "Texto coeso com boa progressão argumentativa.",
    ),
    (
        "Competência 5: Proposta de intervenção",
        0.23,
        "Proposta concreta e detalhada, respeitando os direitos humanos.",
    ),
];

const MIN_SCORE: usize = 60;
const MAX_SCORE: usize = 95;

/// Deterministic local rubric from word and paragraph counts, bounded to
/// the 60..=95 range.
#[must_use]
pub fn local_review(text: &str) -> EssayReview {
    let words = text.split_whitespace().count();
    let paragraphs = text
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .count()
        .max(1);

    let word_bonus = (words / 20).min(25);
    let paragraph_bonus = (paragraphs.saturating_sub(1) * 2).min(10);
    let overall = (MIN_SCORE + word_bonus + paragraph_bonus).min(MAX_SCORE) as u32;

    let competencies = COMPETENCIES
        .iter()
        .map(|(name, weight, comment)| CompetencyScore {
            name: (*name).to_string(),
            score: (f64::from(overall) * weight).round() as u32,
            comment: (*comment).to_string(),
        })
        .collect();

    let mut strengths = vec!["Estrutura organizada".to_string(), "Argumentação clara".to_string()];
    let mut weaknesses = vec!["Repertório sociocultural limitado".to_string()];
    if words < 200 {
        weaknesses.push("Poderia usar mais exemplos concretos".to_string());
    } else {
        strengths.push("Proposta de intervenção completa".to_string());
    }

    EssayReview {
        overall,
        competencies,
        strengths,
        weaknesses,
        suggestions: vec![
            "Ampliar o repertório de citações".to_string(),
            "Desenvolver mais os exemplos".to_string(),
        ],
        exam_tips: vec![
            "Mantenha a estrutura dissertativa".to_string(),
            "Use conectivos variados".to_string(),
            "Revise a concordância verbal".to_string(),
        ],
    }
}

//
// ─── REMOTE GRADER ─────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct RemoteGraderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl RemoteGraderConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("EXAM_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("EXAM_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("EXAM_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Grades essays, delegating to an external generative-text service when
/// configured and falling back to the deterministic local rubric otherwise.
#[derive(Clone)]
pub struct EssayService {
    client: Client,
    config: Option<RemoteGraderConfig>,
}

impl EssayService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(RemoteGraderConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<RemoteGraderConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn remote_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// The static essay topic catalog.
    #[must_use]
    pub fn topics(&self) -> &'static [EssayTopic] {
        TOPICS
    }

    /// Grades an essay against a topic.
    ///
    /// # Errors
    ///
    /// Returns `EssayError::MissingInput` when either input is blank, and
    /// upstream errors when the remote grader is configured but fails or
    /// replies with something that is not an `EssayReview` JSON document.
    pub async fn grade(&self, topic: &str, text: &str) -> Result<EssayReview, EssayError> {
        if topic.trim().is_empty() || text.trim().is_empty() {
            return Err(EssayError::MissingInput);
        }

        match &self.config {
            Some(config) => self.grade_remote(config, topic, text).await,
            None => Ok(local_review(text)),
        }
    }

    async fn grade_remote(
        &self,
        config: &RemoteGraderConfig,
        topic: &str,
        text: &str,
    ) -> Result<EssayReview, EssayError> {
        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: grading_prompt(topic, text),
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EssayError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EssayError::MalformedReply("empty completion".into()))?;

        let mut review: EssayReview = serde_json::from_str(strip_fences(&content))
            .map_err(|e| EssayError::MalformedReply(e.to_string()))?;

        review.overall = review.overall.min(100);
        for competency in &mut review.competencies {
            competency.score = competency.score.min(100);
        }
        Ok(review)
    }
}

fn grading_prompt(topic: &str, text: &str) -> String {
    format!(
        "Você é um corretor de redações de concursos públicos. Avalie a redação \
         abaixo sobre o tema \"{topic}\" e responda APENAS com um objeto JSON com \
         os campos: overall (0-100), competencies (lista de {{name, score, comment}}), \
         strengths, weaknesses, suggestions e exam_tips (listas de strings).\n\n\
         Redação:\n{text}"
    )
}

/// Strips a Markdown code fence, which chat models often wrap JSON in.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_review_stays_in_bounds() {
        let short = local_review("Texto curto.");
        assert_eq!(short.overall, 60);

        let long: String = (0..8)
            .map(|_| "palavra ".repeat(100))
            .collect::<Vec<_>>()
            .join("\n\n");
        let review = local_review(&long);
        assert_eq!(review.overall, 95);

        for competency in &review.competencies {
            assert!(competency.score <= review.overall);
        }
    }

    #[test]
    fn local_review_is_deterministic() {
        let text = "Primeiro parágrafo com algumas palavras.\n\nSegundo parágrafo.";
        assert_eq!(local_review(text), local_review(text));
    }

    #[test]
    fn competency_weights_sum_to_one() {
        let sum: f64 = COMPETENCIES.iter().map(|(_, w, _)| w).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fence_stripping_handles_plain_and_fenced_json() {
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn grade_rejects_blank_input() {
        let service = EssayService::new(None);
        let err = service.grade("", "texto").await.unwrap_err();
        assert!(matches!(err, EssayError::MissingInput));

        let err = service.grade("tema", "   ").await.unwrap_err();
        assert!(matches!(err, EssayError::MissingInput));
    }

    #[tokio::test]
    async fn grade_without_remote_uses_local_rubric() {
        let service = EssayService::new(None);
        assert!(!service.remote_enabled());

        let review = service
            .grade("Tema de teste", "Uma redação curta sobre o tema.")
            .await
            .unwrap();
        assert_eq!(review.competencies.len(), 5);
        assert!(review.overall >= 60 && review.overall <= 95);
    }

    #[test]
    fn topics_catalog_is_nonempty_with_unique_ids() {
        let service = EssayService::new(None);
        let topics = service.topics();
        assert!(!topics.is_empty());
        let mut ids: Vec<u32> = topics.iter().map(|t| t.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), topics.len());
    }
}
