use gg_core::{
    EngineOutput, GalgameError, NextTarget, OverlaySnapshot, OverlaySpec, OverlayState, PlayMode,
    Scene, SceneId, SceneKind, ScriptDocument, SessionState, SpecialAction, FIRST_SCENE_ID,
};
use tracing::{debug, info, warn};

use crate::library::SceneLookup;
use crate::overrides::SpecialResponseTable;
use crate::render::{render_free_chat, render_scene, RenderContext};
use crate::story::StoryConfig;

pub const STORY_ENDED_MESSAGE: &str = "故事已结束，感谢游玩！";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Re-render whatever the state points at.
    Refresh,
    Advance,
    Choose(usize),
    SubmitInput(String),
    OverlayLoaded {
        name: String,
        script: String,
        start_scene: SceneId,
    },
    OverlayFailed {
        name: String,
    },
    Restart,
    AdjustAffection(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Output(EngineOutput),
    /// The driver must make `spec.script` available and answer with
    /// `OverlayLoaded` or `OverlayFailed`.
    LoadOverlay { name: String, spec: OverlaySpec },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effect: Effect,
}

pub struct ReduceContext<'a> {
    pub scripts: &'a dyn SceneLookup,
    pub overrides: &'a SpecialResponseTable,
    pub story: &'a StoryConfig,
}

/// `(state, event) -> (state', effect)`. Never mutates its input.
pub fn reduce(
    state: &SessionState,
    event: Event,
    ctx: &ReduceContext<'_>,
) -> Result<Transition, GalgameError> {
    let mut next = state.clone();
    let effect = match event {
        Event::Refresh => show_current(&mut next, ctx)?,
        Event::Advance => advance(&mut next, ctx)?,
        Event::Choose(index) => choose(&mut next, index, ctx)?,
        Event::SubmitInput(text) => submit_input(&mut next, &text, ctx)?,
        Event::OverlayLoaded {
            name,
            script,
            start_scene,
        } => enter_overlay(&mut next, name, script, start_scene, ctx)?,
        Event::OverlayFailed { name } => {
            warn!(overlay = %name, "overlay failed to load, switching to free chat");
            enter_free_chat(&mut next, ctx)?
        }
        Event::Restart => {
            next = fresh_state(ctx)?;
            info!("session restarted");
            go_to(&mut next, FIRST_SCENE_ID, ctx)?
        }
        Event::AdjustAffection(delta) => {
            next.affection += delta;
            Effect::Output(EngineOutput::Unchanged)
        }
    };
    Ok(Transition {
        state: next,
        effect,
    })
}

fn document<'a>(ctx: &ReduceContext<'a>, script: &str) -> Result<&'a ScriptDocument, GalgameError> {
    ctx.scripts.document(script).ok_or_else(|| {
        GalgameError::new(
            "ENGINE_SCRIPT_MISSING",
            format!("Script \"{}\" is not loaded.", script),
        )
    })
}

fn render_context<'a>(
    state: &SessionState,
    ctx: &ReduceContext<'a>,
) -> Result<RenderContext<'a>, GalgameError> {
    let active = document(ctx, &state.active_script)?;
    let base = if state.active_script == ctx.story.base_script {
        None
    } else {
        ctx.scripts.document(&ctx.story.base_script)
    };
    Ok(RenderContext {
        active,
        base,
        story: ctx.story,
        overrides: ctx.overrides,
    })
}

fn fresh_state(ctx: &ReduceContext<'_>) -> Result<SessionState, GalgameError> {
    let base = document(ctx, &ctx.story.base_script)?;
    Ok(SessionState::new(
        ctx.story.base_script.clone(),
        base.variables.clone(),
    ))
}

fn ended(state: &mut SessionState) -> Effect {
    state.mode = PlayMode::Ended;
    Effect::Output(EngineOutput::Ended {
        message: STORY_ENDED_MESSAGE.to_string(),
    })
}

fn show_current(state: &mut SessionState, ctx: &ReduceContext<'_>) -> Result<Effect, GalgameError> {
    match state.mode {
        PlayMode::FreeChat => enter_free_chat(state, ctx),
        PlayMode::Ended => Ok(ended(state)),
        PlayMode::Script => {
            let current = state.current_scene_id;
            go_to(state, current, ctx)
        }
    }
}

fn show_scene(
    state: &mut SessionState,
    scene: &Scene,
    ctx: &ReduceContext<'_>,
) -> Result<Effect, GalgameError> {
    if scene.kind == SceneKind::FreeChat {
        return enter_free_chat(state, ctx);
    }
    state.mode = PlayMode::Script;
    let rendered = render_scene(&render_context(state, ctx)?, scene, state);
    if let Some(trigger) = rendered.trigger {
        info!(
            user_type = %trigger.user_type,
            overlay = %trigger.overlay,
            "greeting armed overlay for next advance"
        );
        state.pending = Some(trigger);
    }
    Ok(Effect::Output(EngineOutput::Scene(rendered.view)))
}

fn go_to(
    state: &mut SessionState,
    id: SceneId,
    ctx: &ReduceContext<'_>,
) -> Result<Effect, GalgameError> {
    let active = document(ctx, &state.active_script)?;
    if let Some(scene) = active.scene(id) {
        state.current_scene_id = id;
        return show_scene(state, scene, ctx);
    }

    warn!(script = %state.active_script, scene = id, "scene not found");
    scene_missing(state, ctx)
}

/// Implicit `id + 1` step. Past the last representable id counts as a
/// missing scene.
fn go_to_following(
    state: &mut SessionState,
    id: SceneId,
    ctx: &ReduceContext<'_>,
) -> Result<Effect, GalgameError> {
    match id.checked_add(1) {
        Some(next) => go_to(state, next, ctx),
        None => {
            warn!(script = %state.active_script, scene = id, "no scene id after the last one");
            scene_missing(state, ctx)
        }
    }
}

fn scene_missing(state: &mut SessionState, ctx: &ReduceContext<'_>) -> Result<Effect, GalgameError> {
    if state.in_overlay() {
        return end_overlay(state, ctx);
    }
    let active = document(ctx, &state.active_script)?;
    if let Some(first) = active.scene(FIRST_SCENE_ID) {
        state.current_scene_id = FIRST_SCENE_ID;
        return show_scene(state, first, ctx);
    }
    Ok(ended(state))
}

fn follow(
    state: &mut SessionState,
    target: NextTarget,
    ctx: &ReduceContext<'_>,
) -> Result<Effect, GalgameError> {
    match target {
        NextTarget::GoToScene(id) => go_to(state, id, ctx),
        NextTarget::EnterFreeChat => {
            restore_base(state);
            enter_free_chat(state, ctx)
        }
        NextTarget::EndOverlay => end_overlay(state, ctx),
        NextTarget::LoadOverlay(name) => {
            state.pending = None;
            Ok(load_overlay(name, ctx))
        }
    }
}

fn load_overlay(name: String, ctx: &ReduceContext<'_>) -> Effect {
    let spec = ctx.story.overlay_spec(&name);
    debug!(overlay = %name, script = %spec.script, "overlay requested");
    Effect::LoadOverlay { name, spec }
}

fn advance(state: &mut SessionState, ctx: &ReduceContext<'_>) -> Result<Effect, GalgameError> {
    match state.mode {
        PlayMode::FreeChat => return Ok(Effect::Output(EngineOutput::Unchanged)),
        PlayMode::Ended => return Ok(ended(state)),
        PlayMode::Script => {}
    }

    if let Some(trigger) = state.pending.take() {
        return Ok(load_overlay(trigger.overlay, ctx));
    }

    let current = state.current_scene_id;
    let active = document(ctx, &state.active_script)?;
    let Some(scene) = active.scene(current) else {
        return go_to(state, current, ctx);
    };

    if scene.kind.waits_for_interaction() {
        return Ok(Effect::Output(EngineOutput::Unchanged));
    }

    if scene.kind == SceneKind::Ending {
        return if scene.special_action == Some(SpecialAction::ReturnToMain) {
            return_to_main(state, ctx)
        } else {
            loop_story(state, ctx)
        };
    }

    match scene.next.clone() {
        Some(target) => follow(state, target, ctx),
        None => go_to_following(state, scene.id, ctx),
    }
}

fn current_scene<'a>(
    state: &SessionState,
    ctx: &ReduceContext<'a>,
    kind: SceneKind,
) -> Option<&'a Scene> {
    if state.mode != PlayMode::Script {
        return None;
    }
    ctx.scripts
        .document(&state.active_script)
        .and_then(|document| document.scene(state.current_scene_id))
        .filter(|scene| scene.kind == kind)
}

fn choose(
    state: &mut SessionState,
    index: usize,
    ctx: &ReduceContext<'_>,
) -> Result<Effect, GalgameError> {
    let Some(scene) = current_scene(state, ctx, SceneKind::Choice) else {
        return Err(GalgameError::new(
            "ENGINE_NO_PENDING_CHOICE",
            "No pending choice is available.",
        ));
    };
    let Some(option) = scene.choices.get(index) else {
        return Err(GalgameError::new(
            "ENGINE_CHOICE_INDEX",
            format!("Choice index \"{}\" is out of range.", index),
        ));
    };

    state.affection += option.affection;
    state.choices.insert(scene.id, option.next.clone());
    debug!(
        scene = scene.id,
        index,
        target = %option.next,
        affection = state.affection,
        "choice selected"
    );
    follow(state, option.next.clone(), ctx)
}

fn submit_input(
    state: &mut SessionState,
    text: &str,
    ctx: &ReduceContext<'_>,
) -> Result<Effect, GalgameError> {
    let Some(scene) = current_scene(state, ctx, SceneKind::Input) else {
        return Err(GalgameError::new(
            "ENGINE_NO_PENDING_INPUT",
            "No pending input is available.",
        ));
    };
    let value = text.trim();
    if value.is_empty() {
        return Ok(Effect::Output(EngineOutput::Unchanged));
    }

    if let Some(variable) = &scene.input_variable {
        state.variables.insert(variable.clone(), value.to_string());
        if *variable == ctx.overrides.name_variable {
            state.identity = ctx.overrides.recognize(value);
            if let Some(identity) = &state.identity {
                info!(
                    name = value,
                    user_type = %identity.user_type,
                    "special identity recognized"
                );
            }
        }
    }
    go_to_following(state, scene.id, ctx)
}

fn enter_overlay(
    state: &mut SessionState,
    name: String,
    script: String,
    start_scene: SceneId,
    ctx: &ReduceContext<'_>,
) -> Result<Effect, GalgameError> {
    let overlay_document = document(ctx, &script)?;
    let saved = match std::mem::take(&mut state.overlay) {
        OverlayState::Overlay { saved, .. } => saved,
        OverlayState::Base => Box::new(OverlaySnapshot {
            script: state.active_script.clone(),
            scene_id: state.current_scene_id,
            state: Box::new(state.clone()),
        }),
    };
    info!(overlay = %name, script = %script, start_scene, "entering overlay");

    state.overlay = OverlayState::Overlay { name, saved };
    state.active_script = script;
    state.pending = None;
    state.mode = PlayMode::Script;
    state.variables.extend(
        overlay_document
            .variables
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    state.current_scene_id = start_scene;
    go_to(state, start_scene, ctx)
}

/// Swaps the saved base session back in, carrying identity, affection,
/// loop count and choice history across. Returns false outside an overlay.
fn restore_base(state: &mut SessionState) -> bool {
    let OverlayState::Overlay { name, saved } = std::mem::take(&mut state.overlay) else {
        return false;
    };
    let OverlaySnapshot {
        script,
        scene_id,
        state: saved_state,
    } = *saved;

    let identity = state.identity.take();
    let affection = state.affection;
    let loop_count = state.loop_count;
    let choices = std::mem::take(&mut state.choices);

    *state = *saved_state;
    state.active_script = script;
    state.current_scene_id = scene_id;
    state.identity = identity;
    state.affection = affection;
    state.loop_count = loop_count;
    state.choices = choices;
    state.pending = None;
    state.overlay = OverlayState::Base;
    state.mode = PlayMode::Script;
    info!(overlay = %name, scene = scene_id, "returned from overlay");
    true
}

fn end_overlay(state: &mut SessionState, ctx: &ReduceContext<'_>) -> Result<Effect, GalgameError> {
    restore_base(state);
    enter_free_chat(state, ctx)
}

fn return_to_main(
    state: &mut SessionState,
    ctx: &ReduceContext<'_>,
) -> Result<Effect, GalgameError> {
    if !restore_base(state) {
        return enter_free_chat(state, ctx);
    }
    go_to(state, FIRST_SCENE_ID, ctx)
}

fn loop_story(state: &mut SessionState, ctx: &ReduceContext<'_>) -> Result<Effect, GalgameError> {
    let name_variable = ctx.overrides.name_variable.clone();
    let kept_name = state.variables.get(&name_variable).cloned();

    let mut fresh = fresh_state(ctx)?;
    if let Some(name) = kept_name {
        fresh.variables.insert(name_variable, name);
    }
    fresh.affection = state.affection;
    fresh.loop_count = state.loop_count + 1;
    *state = fresh;
    info!(
        loop_count = state.loop_count,
        affection = state.affection,
        "story looped"
    );
    go_to(state, FIRST_SCENE_ID, ctx)
}

fn enter_free_chat(
    state: &mut SessionState,
    ctx: &ReduceContext<'_>,
) -> Result<Effect, GalgameError> {
    if state.mode != PlayMode::FreeChat {
        info!(script = %state.active_script, scene = state.current_scene_id, "entering free chat");
    }
    state.mode = PlayMode::FreeChat;
    state.pending = None;
    let render = render_context(state, ctx)?;
    let scene = render.active.scene(state.current_scene_id);
    Ok(Effect::Output(EngineOutput::FreeChat(render_free_chat(
        &render, scene, state,
    ))))
}
