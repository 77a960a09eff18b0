use gg_core::{EngineOutput, OverlayState, PlayMode, SceneKind};

use super::runtime_test_support::*;
use super::*;

fn engine_at_greeting(name: &str) -> (GalgameEngine, gg_core::SceneView) {
    let mut engine = demo_engine();
    engine_at_name(&mut engine, name);
    let greeting = expect_scene(engine.advance().expect("greeting"));
    (engine, greeting)
}

#[test]
fn greeting_arms_overlay_with_emotion_sprite() {
    let (engine, greeting) = engine_at_greeting("狛枝凪斗");
    assert_eq!(greeting.scene_id, 6);
    assert_eq!(greeting.text, "狛枝同学，是你啊。");
    assert_eq!(
        greeting.sprite.map(|sprite| sprite.path),
        Some("assets/characters/kurose_worried.png".to_string())
    );
    let pending = engine.state().pending.clone().expect("armed");
    assert_eq!(pending.overlay, "nagito_special");
    assert_eq!(pending.user_type, "danganronpa");
}

#[test]
fn next_advance_enters_registered_overlay_at_its_start_scene() {
    let (mut engine, _) = engine_at_greeting("狛枝凪斗");
    let view = expect_scene(engine.advance().expect("enter overlay"));

    assert_eq!(view.script, "nagito_special.json");
    assert_eq!(view.scene_id, 2);
    assert_eq!(view.kind, SceneKind::Choice);

    let state = engine.state();
    assert!(state.in_overlay());
    assert!(state.pending.is_none());
    assert_eq!(state.variable("guest"), Some("狛枝"));
    assert_eq!(state.variable("player_name"), Some("狛枝凪斗"));
    let OverlayState::Overlay { name, saved } = &state.overlay else {
        panic!("expected overlay state");
    };
    assert_eq!(name, "nagito_special");
    assert_eq!(saved.script, BASE);
    assert_eq!(saved.scene_id, 6);
}

#[test]
fn overlay_scenes_resolve_their_own_characters() {
    let (mut engine, _) = engine_at_greeting("狛枝凪斗");
    engine.advance().expect("enter overlay");
    let view = expect_scene(engine.choose(0).expect("care"));
    assert_eq!(view.speaker, "狛枝");
    assert_eq!(
        view.sprite.map(|sprite| sprite.path),
        Some("assets/characters/nagito_smile.png".to_string())
    );
    assert_eq!(view.affection, 1);
}

#[test]
fn return_to_main_restores_base_and_carries_progress() {
    let (mut engine, _) = engine_at_greeting("狛枝凪斗");
    engine.advance().expect("enter overlay");
    engine.choose(0).expect("care");
    let ending = expect_scene(engine.advance().expect("to ending"));
    assert_eq!(ending.kind, SceneKind::Ending);

    let view = expect_scene(engine.advance().expect("return"));
    assert_eq!(view.script, BASE);
    assert_eq!(view.scene_id, 1);
    assert_eq!(view.text, "欢迎来到心理咨询室。");

    let state = engine.state();
    assert_eq!(state.overlay, OverlayState::Base);
    assert_eq!(state.affection, 1);
    assert!(state.choices.contains_key(&2));
    assert_eq!(
        state.identity.as_ref().map(|identity| identity.user_type.as_str()),
        Some("danganronpa")
    );
    assert!(state.variable("guest").is_none());
    assert_eq!(state.variable("player_name"), Some("狛枝凪斗"));
}

#[test]
fn special_end_restores_base_and_opens_free_chat() {
    let (mut engine, _) = engine_at_greeting("狛枝凪斗");
    engine.advance().expect("enter overlay");

    let output = engine.choose(1).expect("special end");
    assert!(matches!(output, EngineOutput::FreeChat(_)));
    let state = engine.state();
    assert_eq!(state.mode, PlayMode::FreeChat);
    assert_eq!(state.active_script, BASE);
    assert_eq!(state.current_scene_id, 6);
    assert!(!state.in_overlay());
}

#[test]
fn unregistered_overlay_uses_default_script_and_ends_past_last_scene() {
    let (mut engine, greeting) = engine_at_greeting("川崎蝾井");
    assert_eq!(greeting.text, "...");

    let first = expect_scene(engine.advance().expect("enter overlay"));
    assert_eq!(first.script, "kawasaki_special.json");
    assert_eq!(first.scene_id, 1);
    assert_eq!(first.speaker, "川崎");

    expect_scene(engine.advance().expect("to 2"));
    let output = engine.advance().expect("past end");
    assert!(matches!(output, EngineOutput::FreeChat(_)));
    assert_eq!(engine.state().active_script, BASE);
}

#[test]
fn failed_overlay_load_falls_back_to_free_chat() {
    let (mut engine, _) = engine_at_greeting("不存在");
    let output = engine.advance().expect("overlay fails");
    assert!(matches!(output, EngineOutput::FreeChat(_)));
    let state = engine.state();
    assert_eq!(state.mode, PlayMode::FreeChat);
    assert_eq!(state.overlay, OverlayState::Base);
    assert!(state.pending.is_none());
}

#[test]
fn load_sentinel_in_next_enters_overlay() {
    let mut sources = sources();
    sources.insert(
        BASE.to_string(),
        r#"{"scenes": [
  {"id": 1, "text": "门开了。", "next": "load:kawasaki_special"}
]}"#
        .to_string(),
    );
    let mut engine = engine_from_sources(sources);
    engine.start().expect("start");
    let view = expect_scene(engine.advance().expect("load"));
    assert_eq!(view.script, "kawasaki_special.json");
    assert_eq!(view.text, "哟。");
}

#[test]
fn restart_inside_overlay_returns_to_fresh_base() {
    let (mut engine, _) = engine_at_greeting("狛枝凪斗");
    engine.advance().expect("enter overlay");
    let view = expect_scene(engine.restart().expect("restart"));
    assert_eq!(view.script, BASE);
    assert_eq!(view.scene_id, 1);
    assert!(!engine.state().in_overlay());
}

#[test]
fn nested_overlay_load_keeps_the_first_base_snapshot() {
    let mut sources = sources();
    sources.insert(
        "kawasaki_special.json".to_string(),
        r#"{"scenes": [
  {"id": 1, "speaker": "川崎", "text": "带你去见个人。", "next": "load:nagito_special"}
]}"#
        .to_string(),
    );
    let mut engine = engine_from_sources(sources);
    engine_at_name(&mut engine, "川崎蝾井");
    engine.advance().expect("greeting");
    let first = expect_scene(engine.advance().expect("enter kawasaki"));
    assert_eq!(first.script, "kawasaki_special.json");

    let second = expect_scene(engine.advance().expect("enter nagito"));
    assert_eq!(second.script, "nagito_special.json");
    assert_eq!(second.scene_id, 2);
    let OverlayState::Overlay { name, saved } = &engine.state().overlay else {
        panic!("expected overlay state");
    };
    assert_eq!(name, "nagito_special");
    assert_eq!(saved.script, BASE);
    assert_eq!(saved.scene_id, 6);

    let output = engine.choose(1).expect("special end");
    assert!(matches!(output, EngineOutput::FreeChat(_)));
    let state = engine.state();
    assert_eq!(state.overlay, OverlayState::Base);
    assert_eq!(state.active_script, BASE);
    assert_eq!(state.current_scene_id, 6);
    assert_eq!(state.mode, PlayMode::FreeChat);
}
