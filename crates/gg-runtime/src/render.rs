use gg_core::{
    AssetRef, ChoiceItem, FreeChatView, PendingTrigger, Scene, SceneKind, SceneView,
    ScriptDocument, SessionState, SpriteView, FIRST_SCENE_ID,
};
use tracing::warn;

use crate::overrides::SpecialResponseTable;
use crate::story::StoryConfig;
use crate::text::substitute_variables;

pub const SPEAKER_FALLBACK: &str = "系统";
const HINT_CONTINUE: &str = "💬 点击继续";
const HINT_INPUT: &str = "✏️ 请输入";
const HINT_NARRATION: &str = "📖 旁白";
const HINT_FREE_CHAT: &str = "💬 自由对话";
const SCENE_CHANGE_FALLBACK: &str = "场景切换";

pub struct RenderContext<'a> {
    pub active: &'a ScriptDocument,
    /// Base script while an overlay is active; its characters and backgrounds
    /// back up the overlay's own.
    pub base: Option<&'a ScriptDocument>,
    pub story: &'a StoryConfig,
    pub overrides: &'a SpecialResponseTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedScene {
    pub view: SceneView,
    pub trigger: Option<PendingTrigger>,
}

pub fn scene_hint(scene: &Scene, loop_count: u32) -> String {
    match scene.kind {
        SceneKind::Choice => String::new(),
        SceneKind::Input => HINT_INPUT.to_string(),
        SceneKind::SceneChange => format!(
            "🎬 {}",
            scene
                .title
                .as_deref()
                .filter(|title| !title.is_empty())
                .unwrap_or(SCENE_CHANGE_FALLBACK)
        ),
        SceneKind::Narration => HINT_NARRATION.to_string(),
        SceneKind::FreeChat => HINT_FREE_CHAT.to_string(),
        SceneKind::Ending if loop_count > 0 => {
            format!("🔄 点击开始第{}轮对话", loop_count + 1)
        }
        SceneKind::Ending => "🔄 点击开始新一轮对话".to_string(),
        SceneKind::Dialogue => HINT_CONTINUE.to_string(),
    }
}

/// Override, then placeholders, then assets. Returns the trigger the greeting
/// override armed, if any.
pub fn render_scene(ctx: &RenderContext<'_>, scene: &Scene, state: &SessionState) -> RenderedScene {
    let special = ctx.overrides.resolve(scene, state);
    let raw_text = special
        .as_ref()
        .map(|response| response.text.as_str())
        .unwrap_or(scene.text.as_str());
    let mut text = substitute_variables(raw_text, &state.variables);
    if state.loop_count > 0 && scene.id == FIRST_SCENE_ID && !state.in_overlay() {
        text.push_str(&format!(
            "\n\n🔄 第{}轮对话（好感度: {}）",
            state.loop_count + 1,
            state.affection
        ));
    }

    let speaker = scene
        .speaker
        .as_deref()
        .filter(|speaker| !speaker.is_empty())
        .map(|speaker| substitute_variables(speaker, &state.variables))
        .unwrap_or_else(|| SPEAKER_FALLBACK.to_string());

    let emotion = special
        .as_ref()
        .and_then(|response| response.emotion.as_deref());
    let sprite = match (scene.character.as_deref(), emotion) {
        (Some(character), Some(emotion)) => Some(resolve_sprite(
            ctx,
            character,
            Some(emotion),
            scene.position.clone(),
        )),
        (Some(character), None) => Some(resolve_sprite(
            ctx,
            character,
            scene.sprite.as_deref(),
            scene.position.clone(),
        )),
        (None, Some(emotion)) => Some(resolve_sprite(
            ctx,
            &ctx.story.protagonist,
            Some(emotion),
            scene.position.clone(),
        )),
        (None, None) => None,
    };

    let view = SceneView {
        script: state.active_script.clone(),
        scene_id: scene.id,
        kind: scene.kind,
        speaker,
        text,
        title: scene.title.clone(),
        background: scene
            .background
            .as_deref()
            .map(|name| resolve_background(ctx, name)),
        sprite,
        hint: scene_hint(scene, state.loop_count),
        choices: scene
            .choices
            .iter()
            .enumerate()
            .map(|(index, option)| ChoiceItem {
                index,
                text: substitute_variables(&option.text, &state.variables),
            })
            .collect(),
        input_placeholder: scene
            .placeholder
            .as_deref()
            .map(|placeholder| substitute_variables(placeholder, &state.variables)),
        affection: state.affection,
    };

    RenderedScene {
        view,
        trigger: special.and_then(|response| response.trigger),
    }
}

/// Free-chat screen. `scene` is the `free_chat` scene that opened it, if any.
pub fn render_free_chat(
    ctx: &RenderContext<'_>,
    scene: Option<&Scene>,
    state: &SessionState,
) -> FreeChatView {
    let intro = scene
        .filter(|scene| scene.kind == SceneKind::FreeChat)
        .map(|scene| substitute_variables(&scene.text, &state.variables))
        .unwrap_or_default();
    FreeChatView {
        intro,
        speaker: protagonist_name(ctx),
        background: scene
            .and_then(|scene| scene.background.as_deref())
            .map(|name| resolve_background(ctx, name)),
        sprite: lookup_sprite(ctx, &ctx.story.protagonist, "normal", None),
        hint: HINT_FREE_CHAT.to_string(),
        affection: state.affection,
    }
}

pub(crate) fn protagonist_name(ctx: &RenderContext<'_>) -> String {
    let key = ctx.story.protagonist.as_str();
    [Some(ctx.active), ctx.base]
        .into_iter()
        .flatten()
        .find_map(|document| {
            document
                .characters
                .get(key)
                .and_then(|character| character.name.clone())
        })
        .unwrap_or_else(|| key.to_string())
}

/// Strict lookup used for chat emotions: `None` when no document defines the pose.
pub(crate) fn lookup_sprite(
    ctx: &RenderContext<'_>,
    character: &str,
    pose: &str,
    position: Option<String>,
) -> Option<SpriteView> {
    [Some(ctx.active), ctx.base]
        .into_iter()
        .flatten()
        .find_map(|document| document.sprite_file(character, pose))
        .map(|file| SpriteView {
            character: character.to_string(),
            pose: pose.to_string(),
            path: ctx.story.assets.character(file),
            position,
        })
}

fn resolve_sprite(
    ctx: &RenderContext<'_>,
    character: &str,
    pose: Option<&str>,
    position: Option<String>,
) -> SpriteView {
    let Some(pose) = pose.filter(|pose| !pose.is_empty()) else {
        return SpriteView {
            character: character.to_string(),
            pose: String::new(),
            path: ctx.story.assets.character(character),
            position,
        };
    };
    if let Some(sprite) = lookup_sprite(ctx, character, pose, position.clone()) {
        return sprite;
    }
    let file = format!("{}_{}.png", character, pose);
    warn!(character, pose, file = %file, "sprite not defined, using file-name fallback");
    SpriteView {
        character: character.to_string(),
        pose: pose.to_string(),
        path: ctx.story.assets.character(&file),
        position,
    }
}

fn resolve_background(ctx: &RenderContext<'_>, name: &str) -> AssetRef {
    let file = [Some(ctx.active), ctx.base]
        .into_iter()
        .flatten()
        .find_map(|document| document.backgrounds.get(name))
        .map(String::as_str)
        .unwrap_or(name);
    AssetRef {
        name: name.to_string(),
        path: ctx.story.assets.background(file),
    }
}

#[cfg(test)]
mod render_tests {
    use std::collections::BTreeMap;

    use super::*;

    fn document(raw: &str) -> ScriptDocument {
        ScriptDocument::parse("story.json", raw).expect("document should parse")
    }

    fn base() -> ScriptDocument {
        document(
            r#"{
  "title": "demo",
  "scenes": [
    {"id": 1, "speaker": "黒瀨澄", "text": "欢迎。", "background": "therapy_room",
     "character": "kurose", "sprite": "normal", "position": "center"},
    {"id": 2, "text": "旁白", "type": "narration", "character": "kurose", "sprite": "blink"},
    {"id": 3, "type": "scene_change", "text": "...", "background": "hallway"},
    {"id": 4, "type": "input", "text": "名字？", "input_variable": "player_name",
     "placeholder": "{hint}"},
    {"id": 5, "speaker": "{player_name}", "text": "我是{player_name}", "character": "extra.png"},
    {"id": 6, "speaker": "黒瀨澄", "text": "啊，你好，{player_name}。"},
    {"id": 7, "type": "ending", "text": "完"}
  ],
  "characters": {"kurose": {"name": "黒瀨澄", "sprites": {"normal": "kurose_normal.png", "worried": "kurose_worried.png"}}},
  "backgrounds": {"therapy_room": "room.jpg"}
}"#,
        )
    }

    fn story() -> StoryConfig {
        StoryConfig::new("story.json", "kurose")
    }

    fn render(document: &ScriptDocument, id: u32, state: &SessionState) -> RenderedScene {
        let story = story();
        let overrides = SpecialResponseTable::default();
        let ctx = RenderContext {
            active: document,
            base: None,
            story: &story,
            overrides: &overrides,
        };
        render_scene(&ctx, document.scene(id).expect("scene"), state)
    }

    #[test]
    fn dialogue_resolves_assets_from_maps() {
        let document = base();
        let view = render(&document, 1, &SessionState::new("story.json", BTreeMap::new())).view;
        assert_eq!(view.speaker, "黒瀨澄");
        assert_eq!(view.hint, "💬 点击继续");
        assert_eq!(
            view.background.map(|background| background.path),
            Some("assets/backgrounds/room.jpg".to_string())
        );
        let sprite = view.sprite.expect("sprite");
        assert_eq!(sprite.path, "assets/characters/kurose_normal.png");
        assert_eq!(sprite.position.as_deref(), Some("center"));
    }

    #[test]
    fn missing_assets_fall_back_to_names() {
        let document = base();
        let state = SessionState::new("story.json", BTreeMap::new());
        let narration = render(&document, 2, &state).view;
        assert_eq!(narration.speaker, SPEAKER_FALLBACK);
        assert_eq!(narration.hint, "📖 旁白");
        assert_eq!(
            narration.sprite.map(|sprite| sprite.path),
            Some("assets/characters/kurose_blink.png".to_string())
        );

        let change = render(&document, 3, &state).view;
        assert_eq!(change.hint, "🎬 场景切换");
        assert_eq!(
            change.background.map(|background| background.path),
            Some("assets/backgrounds/hallway".to_string())
        );

        let bare = render(&document, 5, &state).view;
        assert_eq!(
            bare.sprite.map(|sprite| sprite.path),
            Some("assets/characters/extra.png".to_string())
        );
    }

    #[test]
    fn placeholders_fill_text_speaker_and_input_hint() {
        let document = base();
        let mut state = SessionState::new("story.json", BTreeMap::new());
        let input = render(&document, 4, &state).view;
        assert_eq!(input.hint, "✏️ 请输入");
        assert_eq!(input.input_placeholder.as_deref(), Some("{hint}"));

        state
            .variables
            .insert("player_name".to_string(), "小红".to_string());
        let line = render(&document, 5, &state).view;
        assert_eq!(line.speaker, "小红");
        assert_eq!(line.text, "我是小红");
    }

    #[test]
    fn loop_annotation_and_ending_hint_track_loop_count() {
        let document = base();
        let mut state = SessionState::new("story.json", BTreeMap::new());
        assert_eq!(render(&document, 7, &state).view.hint, "🔄 点击开始新一轮对话");

        state.loop_count = 1;
        state.affection = 3;
        assert_eq!(render(&document, 7, &state).view.hint, "🔄 点击开始第2轮对话");
        assert_eq!(
            render(&document, 1, &state).view.text,
            "欢迎。\n\n🔄 第2轮对话（好感度: 3）"
        );
    }

    #[test]
    fn greeting_override_replaces_text_and_protagonist_pose() {
        let document = base();
        let overrides = SpecialResponseTable::parse(
            r#"{"greetingSceneId": 6, "greetingMarkers": ["{player_name}"],
                "identities": [{"names": ["狛枝凪斗"], "userType": "danganronpa", "characterId": "nagito",
                                "reply": "狛枝同学，是你啊。", "emotion": "worried", "overlay": "nagito_special"}]}"#,
        )
        .expect("table");
        let story = story();
        let ctx = RenderContext {
            active: &document,
            base: None,
            story: &story,
            overrides: &overrides,
        };
        let mut state = SessionState::new("story.json", BTreeMap::new());
        state.identity = overrides.recognize("狛枝凪斗");

        let rendered = render_scene(&ctx, document.scene(6).expect("scene"), &state);
        assert_eq!(rendered.view.text, "狛枝同学，是你啊。");
        assert_eq!(
            rendered.view.sprite.map(|sprite| sprite.path),
            Some("assets/characters/kurose_worried.png".to_string())
        );
        assert_eq!(
            rendered.trigger.map(|trigger| trigger.overlay),
            Some("nagito_special".to_string())
        );
    }

    #[test]
    fn overlay_documents_fall_back_to_base_definitions() {
        let base = base();
        let overlay = document(
            r#"{"scenes": [{"id": 1, "text": "x", "character": "kurose", "sprite": "worried", "background": "therapy_room"},
                           {"id": 2, "type": "free_chat", "text": "聊聊吧"}]}"#,
        );
        let story = story();
        let overrides = SpecialResponseTable::default();
        let ctx = RenderContext {
            active: &overlay,
            base: Some(&base),
            story: &story,
            overrides: &overrides,
        };
        let state = SessionState::new("overlay.json", BTreeMap::new());
        let view = render_scene(&ctx, overlay.scene(1).expect("scene"), &state).view;
        assert_eq!(
            view.sprite.map(|sprite| sprite.path),
            Some("assets/characters/kurose_worried.png".to_string())
        );
        assert_eq!(
            view.background.map(|background| background.path),
            Some("assets/backgrounds/room.jpg".to_string())
        );

        let chat = render_free_chat(&ctx, overlay.scene(2), &state);
        assert_eq!(chat.intro, "聊聊吧");
        assert_eq!(chat.speaker, "黒瀨澄");
        assert_eq!(chat.hint, "💬 自由对话");
        assert_eq!(
            chat.sprite.map(|sprite| sprite.path),
            Some("assets/characters/kurose_normal.png".to_string())
        );
    }
}
