//! 数据库初始化与词库服务的端到端测试

use std::sync::Arc;

use danci_vocab::seed::{SeedOrigin, SeedSource};
use danci_vocab::session::StudySessionState;
use danci_vocab::storage::{Collection, SessionType, StudySession, Word};
use danci_vocab::{
    Config, DatabaseInitializer, ObjectStore, ProgressService, ReviewRating, SearchFilters,
    StorageError, VocabularyService,
};
use tempfile::TempDir;

fn file_store(dir: &TempDir) -> Arc<ObjectStore> {
    Arc::new(ObjectStore::new(dir.path().join("data").join("danci-vocab.db")))
}

#[tokio::test]
async fn unreachable_seed_url_falls_back_to_sample() {
    let dir = TempDir::new().unwrap();
    let init = DatabaseInitializer::new(file_store(&dir))
        .with_seed_source(SeedSource::parse("http://127.0.0.1:1/words.json"));

    init.initialize().await.expect("initialize should fall back to sample data");

    let status = init.get_database_status();
    assert_eq!(status.words_count, 6);
    assert_eq!(status.word_sets_count, 4);
}

#[tokio::test]
async fn seed_file_is_imported_and_persisted() {
    let dir = TempDir::new().unwrap();
    let seed_path = dir.path().join("words.json");
    std::fs::write(
        &seed_path,
        r#"{
            "wordSets": [
                { "id": "daily", "name": "日常", "description": "日常词汇", "difficulty": 1, "isDefault": true }
            ],
            "words": [
                { "id": "d-1", "word": "apple", "pronunciation": "/ˈæp(ə)l/",
                  "definitions": [{ "partOfSpeech": "n.", "meaning": "苹果" }],
                  "difficulty": 1, "frequency": 5000, "tags": ["food"], "wordSet": "daily" },
                { "id": "d-2", "word": "run", "pronunciation": "/rʌn/",
                  "definitions": [{ "partOfSpeech": "v.", "meaning": "跑" }],
                  "difficulty": 1, "frequency": 9000, "tags": ["verb"], "wordSet": "daily" }
            ]
        }"#,
    )
    .unwrap();

    let config = Config {
        db_path: dir.path().join("vocab.db"),
        seed_url: Some(format!("file://{}", seed_path.display())),
        log_level: "debug".to_string(),
        log_dir: None,
    };

    {
        let init = DatabaseInitializer::from_config(&config);
        init.initialize().await.unwrap();
        let status = init.get_database_status();
        assert_eq!(status.words_count, 2);
        assert_eq!(status.word_sets_count, 1);
        init.store().close().unwrap();
    }

    // 重新打开后数据仍在，不会再次导入
    let init = DatabaseInitializer::from_config(&config);
    init.initialize().await.unwrap();
    let vocabulary = VocabularyService::new(Arc::clone(init.store()));
    let words = vocabulary.get_words_from_set("daily").unwrap();
    assert_eq!(words.len(), 2);
    assert_eq!(
        vocabulary.get_default_word_set().unwrap().map(|s| s.id),
        Some("daily".to_string())
    );
}

#[tokio::test]
async fn reset_clears_progress_and_sessions() {
    let store = Arc::new(ObjectStore::in_memory());
    let init = DatabaseInitializer::new(Arc::clone(&store));
    init.initialize().await.unwrap();

    let progress = ProgressService::new(Arc::clone(&store));
    progress
        .record_review("default-user", "word-1", ReviewRating::Good, chrono::Utc::now())
        .unwrap();
    progress
        .save_session(&StudySession::new("default-user", SessionType::Study))
        .unwrap();
    assert_eq!(init.get_database_status().progress_count, 1);
    assert_eq!(init.get_database_status().sessions_count, 1);

    let summary = init.reset_database().await.unwrap();
    assert_eq!(summary.origin, SeedOrigin::Sample);

    let status = init.get_database_status();
    assert_eq!(status.progress_count, 0);
    assert_eq!(status.sessions_count, 0);
    assert_eq!(status.words_count, 6);
}

#[test]
fn store_rejects_use_before_open() {
    let store = ObjectStore::in_memory();
    let result = store.count(Collection::Words);
    assert!(matches!(result, Err(StorageError::NotInitialized)));
}

#[tokio::test]
async fn study_session_flow() {
    let store = Arc::new(ObjectStore::in_memory());
    DatabaseInitializer::new(Arc::clone(&store))
        .initialize()
        .await
        .unwrap();

    let vocabulary = VocabularyService::new(Arc::clone(&store));
    let progress = ProgressService::new(Arc::clone(&store));

    let filters = SearchFilters::default().with_word_set("basic-english");
    let words: Vec<Word> = vocabulary.search_words("", Some(&filters)).unwrap();
    assert_eq!(words.len(), 3);

    let mut state = StudySessionState::new();
    state
        .start_session(StudySession::new("default-user", SessionType::Study), words)
        .unwrap();

    state.next_word();
    state.next_word();
    assert_eq!(state.current_index(), 2);
    assert_eq!(state.current_word().map(|w| w.id.as_str()), Some("word-3"));
    state.next_word();
    assert_eq!(state.current_index(), 2);

    let finished = state.end_session().expect("session record");
    assert!(!state.is_active());
    assert_eq!(state.progress(), 100.0);
    assert_eq!(finished.words_studied.len(), 3);

    for word_id in &finished.words_studied {
        progress
            .record_review("default-user", word_id, ReviewRating::Good, chrono::Utc::now())
            .unwrap();
    }
    progress.save_session(&finished).unwrap();

    assert_eq!(progress.get_user_progress("default-user").unwrap().len(), 3);
    let sessions = progress.get_sessions("default-user").unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].end_time.is_some());
}
