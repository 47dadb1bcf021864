//! End-to-end tests through the facade: config, builder, SQLite store.

use wordforge::prelude::*;

const ROUND: RoundId = RoundId(1830);

fn oracle() -> StaticOracle {
    StaticOracle::new()
        .with_word(ROUND, "lar", Some("lar"), 0)
        .with_word(ROUND, "casa", Some("casa"), 200)
        .with_word(ROUND, "mar", None, 900)
}

#[tokio::test]
async fn test_sessions_and_cache_survive_restart() {
    wordforge::telemetry::init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wordforge.db");

    let id = {
        let registry = WordforgeBuilder::new().build_sqlite(oracle(), &path).unwrap();
        let session = registry
            .create_session(PlayerId(1), GameMode::Competitive, ROUND)
            .unwrap();
        registry.submit_guess(PlayerId(1), "casa").await.unwrap();
        let done = registry.submit_guess(PlayerId(1), "lar").await.unwrap();
        assert!(done.solved);
        registry.shutdown().await.unwrap();
        session.id()
    };

    let registry = WordforgeBuilder::new().build_sqlite(oracle(), &path).unwrap();
    let session = registry.join_session(PlayerId(2), id).await.unwrap();

    // Player 1's answers are still in the shared cache: no oracle call.
    let outcome = registry.submit_guess(PlayerId(2), "casa").await.unwrap();
    assert_eq!(outcome.guess.distance(), Some(200));
    assert_eq!(registry.oracle().oracle().calls(), 0);

    let board = session.leaderboard().unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].player_id, PlayerId(1));
    assert_eq!(board[0].guess_count, 2);
    assert_eq!(session.guess_count(None), 3);

    registry.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_config_document_drives_registry() {
    let config = WordforgeConfig::from_json(
        r#"{
            "game": { "allow_tips": false, "default_mode": "competitive", "machine_id": 12 },
            "persistence": { "force_save_every": 1 }
        }"#,
    )
    .unwrap();
    let store = std::sync::Arc::new(MemoryStore::new());
    let registry = WordforgeBuilder::from_config(config)
        .build(oracle(), std::sync::Arc::clone(&store))
        .unwrap();

    let session = registry
        .create_session(PlayerId(1), GameMode::Cooperative, ROUND)
        .unwrap();

    assert!(!session.allow_tips());
    let tip = registry.request_tip(PlayerId(1)).await;
    assert!(matches!(tip, Err(GameError::TipsDisabled(_))));
    assert_eq!(registry.config().default_mode, GameMode::Competitive);
}

#[tokio::test]
async fn test_errors_convert_into_wordforge_error() {
    async fn create_twice(registry: &SessionRegistry<StaticOracle, MemoryStore>) -> Result<(), WordforgeError> {
        registry.create_session(PlayerId(1), GameMode::Cooperative, ROUND)?;
        registry.create_session(PlayerId(1), GameMode::Cooperative, ROUND)?;
        Ok(())
    }

    let registry = WordforgeBuilder::new()
        .build(oracle(), std::sync::Arc::new(MemoryStore::new()))
        .unwrap();

    let result = create_twice(&registry).await;

    assert!(matches!(
        result,
        Err(WordforgeError::Game(GameError::AlreadyInSession(PlayerId(1), _)))
    ));
}
