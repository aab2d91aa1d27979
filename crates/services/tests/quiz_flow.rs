use std::sync::Arc;

use exam_core::model::{
    AreaCatalog, OptionLetter, OptionSet, QuestionDraft, QuestionId, SessionKey,
    ValidatedQuestion,
};
use exam_core::time::fixed_clock;
use services::{
    AppServices, EssayService, QuizError, QuizSelection, QuizService, StatsService,
};
use storage::repository::{QuestionRepository, Storage};

fn build_question(subject: &str, correct: OptionLetter) -> ValidatedQuestion {
    let options = OptionSet::new([
        (OptionLetter::A, "alternativa a".to_string()),
        (OptionLetter::B, "alternativa b".to_string()),
        (OptionLetter::C, "alternativa c".to_string()),
    ])
    .unwrap();
    QuestionDraft {
        subject: subject.to_string(),
        difficulty: None,
        prompt: format!("Pergunta de {subject}?"),
        options,
        correct,
        rationale: Some("Justificativa de teste.".to_string()),
        hint: None,
        formula: None,
        issuer: Some("CESPE".to_string()),
    }
    .validate()
    .unwrap()
}

async fn seed_portuguese(storage: &Storage, count: usize) -> Vec<QuestionId> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let id = storage
            .questions
            .insert_question(&build_question("Língua Portuguesa", OptionLetter::A))
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}

fn services_over(storage: &Storage) -> AppServices {
    AppServices::from_storage(storage, fixed_clock(), EssayService::new(None))
}

fn portuguese_area() -> Vec<String> {
    vec!["Língua Portuguesa".to_string()]
}

#[tokio::test]
async fn full_quiz_run_scores_one_hundred_percent() {
    let storage = Storage::in_memory();
    seed_portuguese(&storage, 3).await;
    let services = services_over(&storage);
    let quiz: Arc<QuizService> = services.quiz();
    let key = SessionKey::generate();

    let started = quiz
        .start(key, &portuguese_area(), None, QuizSelection::Limit(3))
        .await
        .unwrap();
    assert_eq!(started.total, 3);
    assert_eq!(started.position, 0);
    assert!(started.previous_answer.is_none());

    // the public view must not leak the answer
    let as_json = serde_json::to_value(&started.question).unwrap();
    assert!(as_json.get("correct").is_none());
    assert!(as_json.get("rationale").is_none());

    for index in 0..3 {
        let step = quiz.question_at(key, index).await.unwrap();
        let outcome = quiz
            .answer(key, QuestionId::new(step.question.id), "A")
            .await
            .unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.correct_option, "A");
        assert_eq!(outcome.rationale, "Justificativa de teste.");
    }

    let report = quiz.finish(key).await.unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.correct, 3);
    assert_eq!(report.accuracy, 100.0);

    // finishing cleared the session
    let err = quiz.finish(key).await.unwrap_err();
    assert!(matches!(err, QuizError::NoActiveSession));
}

#[tokio::test]
async fn start_honors_requested_count_and_filters() {
    let storage = Storage::in_memory();
    seed_portuguese(&storage, 5).await;
    let services = services_over(&storage);
    let quiz = services.quiz();

    let started = quiz
        .start(
            SessionKey::generate(),
            &portuguese_area(),
            None,
            QuizSelection::Limit(2),
        )
        .await
        .unwrap();
    assert_eq!(started.total, 2);

    // a limit above the pool size returns the whole pool
    let started = quiz
        .start(
            SessionKey::generate(),
            &portuguese_area(),
            None,
            QuizSelection::Limit(50),
        )
        .await
        .unwrap();
    assert_eq!(started.total, 5);

    let started = quiz
        .start(
            SessionKey::generate(),
            &portuguese_area(),
            None,
            QuizSelection::All,
        )
        .await
        .unwrap();
    assert_eq!(started.total, 5);

    // issuer filter that matches nothing
    let err = quiz
        .start(
            SessionKey::generate(),
            &portuguese_area(),
            Some("FGV"),
            QuizSelection::All,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::NoQuestionsFound));
}

#[tokio::test]
async fn start_rejects_empty_or_unknown_areas() {
    let storage = Storage::in_memory();
    seed_portuguese(&storage, 1).await;
    let services = services_over(&storage);
    let quiz = services.quiz();

    let err = quiz
        .start(SessionKey::generate(), &[], None, QuizSelection::All)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::NoAreaSelected));

    let err = quiz
        .start(
            SessionKey::generate(),
            &vec!["Área Inexistente".to_string()],
            None,
            QuizSelection::All,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::NoAreaSelected));

    // a valid area whose subjects have no stored questions
    let err = quiz
        .start(
            SessionKey::generate(),
            &vec!["Informática".to_string()],
            None,
            QuizSelection::All,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::NoQuestionsFound));
}

#[tokio::test]
async fn repeated_answers_conflict_and_navigation_is_bounded() {
    let storage = Storage::in_memory();
    seed_portuguese(&storage, 3).await;
    let services = services_over(&storage);
    let quiz = services.quiz();
    let key = SessionKey::generate();

    let started = quiz
        .start(key, &portuguese_area(), None, QuizSelection::All)
        .await
        .unwrap();
    let first_id = QuestionId::new(started.question.id);

    let outcome = quiz.answer(key, first_id, "b").await.unwrap();
    assert!(!outcome.correct);
    assert_eq!(outcome.correct_option, "A");

    let err = quiz.answer(key, first_id, "a").await.unwrap_err();
    assert!(matches!(err, QuizError::AlreadyAnswered));

    // revisiting shows the recorded answer
    let step = quiz.question_at(key, 0).await.unwrap();
    let previous = step.previous_answer.unwrap();
    assert_eq!(previous.chosen, "b");
    assert!(!previous.correct);

    let err = quiz.question_at(key, 5).await.unwrap_err();
    assert!(matches!(
        err,
        QuizError::IndexOutOfRange { index: 5, total: 3 }
    ));

    // an id that exists in the store but not in this session
    let foreign = storage
        .questions
        .insert_question(&build_question("Informática", OptionLetter::A))
        .await
        .unwrap();
    let err = quiz.answer(key, foreign, "a").await.unwrap_err();
    assert!(matches!(err, QuizError::QuestionNotInSession(_)));

    let err = quiz.answer(key, first_id, "z").await.unwrap_err();
    assert!(matches!(err, QuizError::AlreadyAnswered));
}

#[tokio::test]
async fn starting_again_discards_previous_answers() {
    let storage = Storage::in_memory();
    seed_portuguese(&storage, 2).await;
    let services = services_over(&storage);
    let quiz = services.quiz();
    let key = SessionKey::generate();

    let started = quiz
        .start(key, &portuguese_area(), None, QuizSelection::All)
        .await
        .unwrap();
    let first_id = QuestionId::new(started.question.id);
    quiz.answer(key, first_id, "a").await.unwrap();

    // a new start replaces the session; the same question is answerable again
    quiz.start(key, &portuguese_area(), None, QuizSelection::All)
        .await
        .unwrap();
    let outcome = quiz.answer(key, first_id, "a").await.unwrap();
    assert!(outcome.correct);
}

#[tokio::test]
async fn unanswered_questions_count_against_accuracy() {
    let storage = Storage::in_memory();
    seed_portuguese(&storage, 4).await;
    let services = services_over(&storage);
    let quiz = services.quiz();
    let key = SessionKey::generate();

    let started = quiz
        .start(key, &portuguese_area(), None, QuizSelection::All)
        .await
        .unwrap();
    // answer only the first question, correctly
    quiz.answer(key, QuestionId::new(started.question.id), "a")
        .await
        .unwrap();

    let report = quiz.finish(key).await.unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.correct, 1);
    assert_eq!(report.accuracy, 25.0);
}

#[tokio::test]
async fn dashboard_reflects_finished_quizzes() {
    let storage = Storage::in_memory();
    seed_portuguese(&storage, 3).await;
    let services = services_over(&storage);
    let quiz = services.quiz();
    let stats: Arc<StatsService> = services.stats();
    let key = SessionKey::generate();

    // empty dashboard first: no division errors, zeroed figures
    let dashboard = stats.dashboard().await.unwrap();
    assert_eq!(dashboard.overall.question_bank, 3);
    assert_eq!(dashboard.overall.quizzes_finished, 0);
    assert_eq!(dashboard.overall.mean_accuracy, 0.0);
    assert!(dashboard.overall.best.is_none());
    assert!(dashboard.recent.is_empty());
    let portuguese = dashboard
        .areas
        .iter()
        .find(|a| a.area == "Língua Portuguesa")
        .unwrap();
    assert_eq!(portuguese.question_count, 3);
    assert_eq!(portuguese.attempted, 0);
    assert_eq!(portuguese.percentage, 0.0);

    let started = quiz
        .start(key, &portuguese_area(), None, QuizSelection::All)
        .await
        .unwrap();
    for index in 0..started.total {
        let step = quiz.question_at(key, index).await.unwrap();
        let letter = if index == 0 { "a" } else { "b" };
        quiz.answer(key, QuestionId::new(step.question.id), letter)
            .await
            .unwrap();
    }
    quiz.finish(key).await.unwrap();

    let dashboard = stats.dashboard().await.unwrap();
    assert_eq!(dashboard.overall.quizzes_finished, 1);
    assert_eq!(dashboard.overall.total_attempted, 3);
    assert_eq!(dashboard.overall.total_correct, 1);
    assert_eq!(dashboard.overall.mean_accuracy, 33.33);
    assert_eq!(dashboard.overall.best.as_ref().unwrap().accuracy, 33.33);
    assert_eq!(dashboard.recent.len(), 1);

    let portuguese = dashboard
        .areas
        .iter()
        .find(|a| a.area == "Língua Portuguesa")
        .unwrap();
    assert_eq!(portuguese.attempted, 3);
    assert_eq!(portuguese.correct, 1);
    assert_eq!(portuguese.percentage, 33.33);
}

#[tokio::test]
async fn round_trip_single_question_report() {
    let storage = Storage::in_memory();
    let id = storage
        .questions
        .insert_question(&build_question("Língua Portuguesa", OptionLetter::C))
        .await
        .unwrap();
    let services = services_over(&storage);
    let quiz = services.quiz();
    let key = SessionKey::generate();

    quiz.start(key, &portuguese_area(), None, QuizSelection::Limit(1))
        .await
        .unwrap();
    let outcome = quiz.answer(key, id, "C").await.unwrap();
    assert!(outcome.correct);

    let report = quiz.finish(key).await.unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.correct, 1);
    assert_eq!(report.accuracy, 100.0);
}
