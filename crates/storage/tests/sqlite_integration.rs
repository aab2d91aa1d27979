use exam_core::model::{
    AnswerRecord, OptionLetter, OptionSet, QuestionDraft, QuestionId, QuizReport, QuizSession,
    SessionKey, ValidatedQuestion,
};
use exam_core::time::fixed_now;
use storage::repository::{
    QuestionRepository, ResultRepository, SessionRepository, StorageError,
};
use storage::sqlite::SqliteRepository;

fn build_question(subject: &str, issuer: Option<&str>, correct: OptionLetter) -> ValidatedQuestion {
    let options = OptionSet::new([
        (OptionLetter::A, "alternativa a".to_string()),
        (OptionLetter::B, "alternativa b".to_string()),
        (OptionLetter::C, "alternativa c".to_string()),
    ])
    .unwrap();
    QuestionDraft {
        subject: subject.to_string(),
        difficulty: Some("Médio".to_string()),
        prompt: format!("Pergunta de {subject}?"),
        options,
        correct,
        rationale: Some("Porque sim.".to_string()),
        hint: Some("Pense devagar.".to_string()),
        formula: None,
        issuer: issuer.map(str::to_string),
    }
    .validate()
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrips_questions_with_option_blob() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_questions?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = repo
        .insert_question(&build_question("Matemática", Some("CESPE"), OptionLetter::B))
        .await
        .unwrap();

    let fetched = repo.get_question(id).await.unwrap();
    assert_eq!(fetched.subject, "Matemática");
    assert_eq!(fetched.correct, OptionLetter::B);
    assert_eq!(fetched.options.len(), 3);
    assert_eq!(fetched.options.text_for(OptionLetter::C), Some("alternativa c"));
    assert_eq!(fetched.issuer.as_deref(), Some("CESPE"));
    assert_eq!(fetched.hint.as_deref(), Some("Pense devagar."));

    let err = repo.get_question(QuestionId::new(999)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_filters_by_subject_and_issuer() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_filters?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.insert_question(&build_question("Matemática", Some("CESPE"), OptionLetter::A))
        .await
        .unwrap();
    repo.insert_question(&build_question("Matemática", Some("FGV"), OptionLetter::A))
        .await
        .unwrap();
    repo.insert_question(&build_question("Informática", Some("CESPE"), OptionLetter::A))
        .await
        .unwrap();
    repo.insert_question(&build_question("Informática", None, OptionLetter::A))
        .await
        .unwrap();

    let math = vec!["Matemática".to_string()];
    assert_eq!(
        repo.questions_by_subjects(&math, None).await.unwrap().len(),
        2
    );
    assert_eq!(
        repo.questions_by_subjects(&math, Some("FGV"))
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(repo.count_by_subjects(&math).await.unwrap(), 2);
    assert_eq!(repo.count_all().await.unwrap(), 4);

    // issuer counts skip the NULL issuer row and sort descending
    let issuers = repo.issuer_counts().await.unwrap();
    assert_eq!(issuers.len(), 2);
    assert_eq!(issuers[0], ("CESPE".to_string(), 2));
    assert_eq!(issuers[1], ("FGV".to_string(), 1));
}

#[tokio::test]
async fn sqlite_orders_get_questions_by_request() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_order?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let first = repo
        .insert_question(&build_question("Matemática", None, OptionLetter::A))
        .await
        .unwrap();
    let second = repo
        .insert_question(&build_question("Informática", None, OptionLetter::A))
        .await
        .unwrap();

    let fetched = repo.get_questions(&[second, first]).await.unwrap();
    assert_eq!(fetched[0].id, second);
    assert_eq!(fetched[1].id, first);

    let err = repo
        .get_questions(&[first, QuestionId::new(12345)])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_session_store_roundtrips() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_sessions?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let key = SessionKey::generate();
    assert!(repo.load_session(key).await.unwrap().is_none());

    let mut session = QuizSession::new(vec![
        QuestionId::new(10),
        QuestionId::new(20),
        QuestionId::new(30),
    ])
    .unwrap();
    session
        .record_answer(
            QuestionId::new(20),
            AnswerRecord {
                chosen: OptionLetter::C,
                correct: false,
            },
        )
        .unwrap();
    session.move_to(2).unwrap();

    repo.save_session(key, &session).await.unwrap();

    let loaded = repo.load_session(key).await.unwrap().unwrap();
    assert_eq!(loaded.question_ids(), session.question_ids());
    assert_eq!(loaded.cursor(), 2);
    let record = loaded.answer_for(QuestionId::new(20)).unwrap();
    assert_eq!(record.chosen, OptionLetter::C);
    assert!(!record.correct);

    // saving again replaces the previous state
    let replacement = QuizSession::new(vec![QuestionId::new(99)]).unwrap();
    repo.save_session(key, &replacement).await.unwrap();
    let loaded = repo.load_session(key).await.unwrap().unwrap();
    assert_eq!(loaded.total(), 1);
    assert_eq!(loaded.answered_count(), 0);

    repo.clear_session(key).await.unwrap();
    assert!(repo.load_session(key).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_result_aggregates() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_results?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let totals = repo.overall_totals().await.unwrap();
    assert_eq!(totals.finished, 0);
    assert_eq!(totals.mean_accuracy, 0.0);
    assert!(repo.best_result().await.unwrap().is_none());

    let early = fixed_now();
    let late = early + chrono::Duration::hours(2);

    let weaker = QuizReport::tally(
        early,
        [
            ("Matemática", Some(true)),
            ("Matemática", None),
            ("Informática", Some(false)),
            ("Informática", Some(true)),
        ],
    )
    .unwrap();
    let stronger = QuizReport::tally(late, [("Matemática", Some(true))]).unwrap();

    repo.append_report(&weaker).await.unwrap();
    let best_id = repo.append_report(&stronger).await.unwrap();

    let totals = repo.overall_totals().await.unwrap();
    assert_eq!(totals.finished, 2);
    assert_eq!(totals.correct, 3);
    assert_eq!(totals.attempted, 5);
    assert_eq!(totals.mean_accuracy, 75.0);

    let best = repo.best_result().await.unwrap().unwrap();
    assert_eq!(best.id, best_id);
    assert_eq!(best.result.accuracy(), 100.0);

    let recent = repo.recent_results(5).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].result.recorded_at(), late);
    assert_eq!(recent[1].result.recorded_at(), early);

    let math = repo
        .subject_totals(&vec!["Matemática".to_string()])
        .await
        .unwrap();
    assert_eq!(math.correct, 2);
    assert_eq!(math.attempted, 3);

    let absent = repo
        .subject_totals(&vec!["Direito Constitucional".to_string()])
        .await
        .unwrap();
    assert_eq!(absent.attempted, 0);
}
