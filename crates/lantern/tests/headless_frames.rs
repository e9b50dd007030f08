//! # Headless Frame Tests
//!
//! Loads a level snapshot through the built-in registries and drives it with
//! the game loop, the way `lantern-headless` does.
//!
//! Run with: cargo test --package lantern --test headless_frames

use lantern::core::{EcsError, EntityId, WorldManager, WorldSnapshot};
use lantern::{
    builtin_catalog, builtin_registry, builtin_registry_with_sink, read_snapshot,
    write_snapshot, Camera, DrawCommand, DrawSink, EngineConfig, EngineError, EngineEvent,
    GameLoop, RecordingSink, Sprite, Transform,
};

const LEVEL: &str = r#"{
    "systemNames": ["camera_controller", "movement", "sprite_render"],
    "singletons": {
        "components": [
            {"type": "Camera", "x": 0.0, "y": 0.0, "zoom": 2.0,
             "viewport_width": 800, "viewport_height": 600}
        ]
    },
    "entities": [
        {"id": 0, "components": [
            {"type": "Transform", "x": 0.0, "y": 0.0},
            {"type": "Velocity", "x": 10.0, "y": 0.0},
            {"type": "Sprite", "texture": "ship.png", "width": 4.0, "height": 2.0, "layer": 1}
        ]},
        {"id": 3, "components": [
            {"type": "Transform", "x": 5.0, "y": 5.0},
            {"type": "Sprite", "texture": "rock.png"}
        ]},
        {"id": 4, "components": [
            {"type": "Transform", "x": -1.0, "y": 0.0}
        ]}
    ]
}"#;

fn load(sink: &RecordingSink) -> WorldManager<EngineEvent> {
    let snapshot = WorldSnapshot::from_json(LEVEL).unwrap();
    let shared = sink.clone();
    let mut registry =
        builtin_registry_with_sink(move || Box::new(shared.clone()) as Box<dyn DrawSink>);
    WorldManager::from_snapshot(
        &snapshot,
        &mut registry,
        &builtin_catalog(),
        EngineConfig::default().world,
    )
    .unwrap()
}

#[test]
fn test_level_loads_with_subscriptions() {
    let world = load(&RecordingSink::new());

    assert_eq!(
        world.system_names(),
        vec!["camera_controller", "movement", "sprite_render"]
    );
    // Snapshot camera wins over the controller's default
    assert!((world.singleton::<Camera>().unwrap().zoom - 2.0).abs() < f32::EPSILON);

    let ship = EntityId::new(0);
    let rock = EntityId::new(3);
    let marker = EntityId::new(4);
    assert_eq!(world.subscription("movement", ship), Some(0));
    assert_eq!(world.subscription("movement", rock), None);
    assert_eq!(world.subscription("sprite_render", ship), Some(0));
    assert_eq!(world.subscription("sprite_render", rock), Some(0));
    assert_eq!(world.subscription("sprite_render", marker), Some(1));
    assert!(world.subscribers("camera_controller").unwrap().is_empty());
}

#[test]
fn test_frames_move_and_draw() {
    let sink = RecordingSink::new();
    let mut game_loop = GameLoop::new(load(&sink), EngineConfig::default().frame);

    game_loop.run_frames(10, 0.1);

    let ship = game_loop
        .world()
        .entity(EntityId::new(0))
        .and_then(|e| e.component::<Transform>())
        .unwrap();
    assert!((ship.x - 10.0).abs() < 1e-4);

    assert_eq!(sink.frame_count(), 10);
    let frame = sink.last_frame();
    assert_eq!(frame.len(), 3);
    // rock (layer 0), ship (layer 1), marker last
    assert!(matches!(&frame[0], DrawCommand::Sprite { texture, .. } if texture == "rock.png"));
    assert!(matches!(&frame[1], DrawCommand::Sprite { texture, .. } if texture == "ship.png"));
    assert!(matches!(frame[2], DrawCommand::Marker { entity, .. } if entity == EntityId::new(4)));

    // Ship at world x=10, zoom 2, viewport center 400
    if let DrawCommand::Sprite { x, width, .. } = frame[1] {
        assert!((x - 420.0).abs() < 1e-3);
        assert!((width - 8.0).abs() < f32::EPSILON);
    }
}

#[test]
fn test_input_events_reach_camera() {
    let sink = RecordingSink::new();
    let mut game_loop = GameLoop::new(load(&sink), EngineConfig::default().frame);
    let input = game_loop.input();
    let output = game_loop.output();

    assert!(input.send(EngineEvent::CameraZoom { factor: 0.5 }));
    assert!(input.send(EngineEvent::Custom {
        name: "ignored".to_string(),
        payload: serde_json::Value::Null,
    }));
    let stats = game_loop.step(0.016);

    assert_eq!(stats.events_processed, 2);
    assert!((game_loop.world().singleton::<Camera>().unwrap().zoom - 1.0).abs() < f32::EPSILON);
    assert_eq!(
        output.drain(),
        vec![EngineEvent::CameraMoved {
            x: 0.0,
            y: 0.0,
            zoom: 1.0
        }]
    );
}

#[test]
fn test_export_after_frames_round_trips() {
    let sink = RecordingSink::new();
    let mut game_loop = GameLoop::new(load(&sink), EngineConfig::default().frame);
    game_loop.run_frames(5, 0.1);

    let exported = game_loop.world().export_state().unwrap();
    let reloaded: WorldManager<EngineEvent> = WorldManager::from_snapshot(
        &WorldSnapshot::from_json(&exported.to_json().unwrap()).unwrap(),
        &mut builtin_registry(),
        &builtin_catalog(),
        EngineConfig::default().world,
    )
    .unwrap();

    assert_eq!(reloaded.export_state().unwrap(), exported);
    let ship = reloaded
        .entity(EntityId::new(0))
        .and_then(|e| e.component::<Transform>())
        .unwrap();
    assert!((ship.x - 5.0).abs() < 1e-4);
    assert_eq!(
        reloaded
            .entity(EntityId::new(3))
            .and_then(|e| e.component::<Sprite>())
            .map(|s| s.texture.as_str()),
        Some("rock.png")
    );
}

#[test]
fn test_unknown_system_fails_load() {
    let snapshot = WorldSnapshot::from_json(r#"{"systemNames": ["physics"]}"#).unwrap();
    let result: Result<WorldManager<EngineEvent>, EcsError> = WorldManager::from_snapshot(
        &snapshot,
        &mut builtin_registry(),
        &builtin_catalog(),
        EngineConfig::default().world,
    );
    assert!(matches!(result, Err(EcsError::UnknownSystem(_))));
}

#[test]
fn test_snapshot_files() {
    let path = std::env::temp_dir().join(format!("lantern_snapshot_{}.json", std::process::id()));
    let snapshot = WorldSnapshot::from_json(LEVEL).unwrap();

    write_snapshot(&path, &snapshot).unwrap();
    let read = read_snapshot(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(read, snapshot);

    let missing = read_snapshot(std::env::temp_dir().join("lantern_missing_snapshot.json"));
    assert!(matches!(missing, Err(EngineError::Io(_))));
}
