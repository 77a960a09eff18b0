use gg_core::{EngineOutput, GalgameError, SessionState};
use tracing::{info, warn};

use crate::library::{SceneLookup, ScriptLibrary, ScriptLoader};
use crate::overrides::SpecialResponseTable;
use crate::reducer::{reduce, Effect, Event, ReduceContext};
use crate::render::RenderContext;
use crate::story::StoryConfig;

pub struct GalgameEngineOptions {
    pub loader: Box<dyn ScriptLoader>,
    pub story: StoryConfig,
    pub overrides: SpecialResponseTable,
}

/// Drives the reducer: owns the session, the loaded scripts and the I/O the
/// reducer asks for (overlay loads).
pub struct GalgameEngine {
    pub(super) library: ScriptLibrary,
    pub(super) story: StoryConfig,
    pub(super) overrides: SpecialResponseTable,
    pub(super) state: SessionState,
}

impl GalgameEngine {
    pub fn new(options: GalgameEngineOptions) -> Result<Self, GalgameError> {
        let mut library = ScriptLibrary::new(options.loader);
        let base = library.ensure(&options.story.base_script).map_err(|error| {
            GalgameError::new(
                "ENGINE_BASE_SCRIPT",
                format!(
                    "Failed to load base script \"{}\": {}",
                    options.story.base_script, error
                ),
            )
        })?;
        let state = SessionState::new(options.story.base_script.clone(), base.variables.clone());
        info!(
            script = %options.story.base_script,
            scenes = base.scenes.len(),
            "engine ready"
        );

        Ok(Self {
            library,
            story: options.story,
            overrides: options.overrides,
            state,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn story(&self) -> &StoryConfig {
        &self.story
    }

    pub fn special_responses(&self) -> &SpecialResponseTable {
        &self.overrides
    }

    pub(super) fn render_context(&self) -> Result<RenderContext<'_>, GalgameError> {
        let active = self
            .library
            .document(&self.state.active_script)
            .ok_or_else(|| {
                GalgameError::new(
                    "ENGINE_SCRIPT_MISSING",
                    format!("Script \"{}\" is not loaded.", self.state.active_script),
                )
            })?;
        let base = if self.state.active_script == self.story.base_script {
            None
        } else {
            self.library.document(&self.story.base_script)
        };
        Ok(RenderContext {
            active,
            base,
            story: &self.story,
            overrides: &self.overrides,
        })
    }

    /// Runs one event to completion, servicing overlay loads in between.
    pub(super) fn dispatch(&mut self, event: Event) -> Result<EngineOutput, GalgameError> {
        let mut event = event;
        loop {
            let transition = {
                let ctx = ReduceContext {
                    scripts: &self.library,
                    overrides: &self.overrides,
                    story: &self.story,
                };
                reduce(&self.state, event, &ctx)?
            };
            self.state = transition.state;

            match transition.effect {
                Effect::Output(output) => return Ok(output),
                Effect::LoadOverlay { name, spec } => {
                    event = match self.library.ensure(&spec.script) {
                        Ok(_) => Event::OverlayLoaded {
                            name,
                            script: spec.script,
                            start_scene: spec.start_scene,
                        },
                        Err(error) => {
                            warn!(overlay = %name, %error, "overlay script unavailable");
                            Event::OverlayFailed { name }
                        }
                    };
                }
            }
        }
    }
}
