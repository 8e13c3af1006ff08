//! Plays the bundled assets through the runtime.
use std::path::PathBuf;
use std::sync::Arc;

use tower_content::ContentFactory;
use tower_core::{Direction, Position};
use tower_runtime::{
    DirectoryFloorSource, DirectoryStorySource, InputOutcome, RecordingUi, Runtime,
    RuntimeBuilder, RuntimeConfig,
};

fn content() -> ContentFactory {
    ContentFactory::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"))
}

fn lobby(ui: Arc<RecordingUi>) -> RuntimeBuilder {
    let content = content();
    let config = content.load_config().unwrap();
    let level = content.load_level("floor_1", &config).unwrap();
    Runtime::builder()
        .config(RuntimeConfig::default())
        .game_config(config)
        .level(level)
        .ui(ui)
        .stories(Arc::new(DirectoryStorySource::new(content.story_dir())))
}

#[test]
fn bundled_content_loads() {
    let content = content();
    let config = content.load_config().unwrap();
    assert_eq!(config.player.atk, 10);

    let lobby = content.load_level("floor_1", &config).unwrap();
    assert_eq!(lobby.name(), "Lobby");
    assert_eq!(lobby.spawn(), Position::new(1, 1));
    assert_eq!(lobby.player_defaults().name, "Ada");
    assert_eq!(lobby.catalog().display_name(Some("badge"), None), "Staff Badge");

    let archive = content.load_level("floor_2", &config).unwrap();
    assert_eq!(archive.name(), "Archive");
    assert_eq!(archive.unlockers().count(), 1);

    let story = content.load_story("orientation").unwrap();
    assert!(story.node(&story.start).is_some());
}

#[tokio::test]
async fn lobby_walkthrough() {
    let ui = Arc::new(RecordingUi::new());
    let runtime = lobby(ui.clone()).build().await.unwrap();
    let handle = runtime.handle();

    for _ in 0..3 {
        handle.move_player(Direction::Right).await.unwrap();
    }
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.player.position, Position::new(4, 1));
    assert_eq!(snapshot.player.keys, 0);
    assert!(ui.messages().contains(&"Picked up key x1.".to_string()));
    assert_eq!(
        ui.last_message().as_deref(),
        Some("Used 1 key(s). The door opened.")
    );

    handle.move_player(Direction::Left).await.unwrap();
    handle.move_player(Direction::Down).await.unwrap();
    let outcome = handle.move_player(Direction::Down).await.unwrap();
    assert_eq!(outcome, InputOutcome::Story { started: true });

    handle.story_next().await.unwrap();
    handle.story_choose(0).await.unwrap();
    handle.story_close().await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.dialogue.is_none());
    assert_eq!(snapshot.player.inventory.count("badge"), 1);
    assert_eq!(snapshot.journal.len(), 1);
    assert_eq!(snapshot.journal[0].title, "Badge Policy");

    // The guide only talks once; afterwards the cell is walkable.
    handle.move_player(Direction::Down).await.unwrap();
    handle.move_player(Direction::Right).await.unwrap();
    assert_eq!(
        ui.last_message().as_deref(),
        Some("You used Staff Badge to open the door.")
    );
    handle.move_player(Direction::Right).await.unwrap();
    assert_eq!(ui.last_message().as_deref(), Some("Lobby complete!"));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.player.position, Position::new(5, 3));
    assert!(!snapshot.player.inventory.contains("badge"));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn stairs_climb_to_the_archive() {
    let content = content();
    let config = content.load_config().unwrap();
    let ui = Arc::new(RecordingUi::new());
    let floors = DirectoryFloorSource::new(content.levels_dir(), config);
    let runtime = lobby(ui.clone())
        .floors(Arc::new(floors))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    // Key, door, then down the east corridor to the stairs.
    for direction in [
        Direction::Right,
        Direction::Right,
        Direction::Right,
        Direction::Right,
        Direction::Down,
        Direction::Down,
    ] {
        handle.move_player(direction).await.unwrap();
    }

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.floor, Some(2));
    assert_eq!(snapshot.level.name(), "Floor 2");
    assert_eq!(snapshot.player.position, Position::new(1, 2));
    assert_eq!(snapshot.player.atk, 13);
    assert_eq!(ui.level_names().last().map(String::as_str), Some("Floor 2"));

    runtime.shutdown().await.unwrap();
}
