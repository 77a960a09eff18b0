use gg_core::{EngineOutput, GalgameError};

use super::GalgameEngine;
use crate::reducer::Event;

impl GalgameEngine {
    /// Renders the state's current position: scene 1 for a fresh session.
    pub fn start(&mut self) -> Result<EngineOutput, GalgameError> {
        self.dispatch(Event::Refresh)
    }

    pub fn current_output(&mut self) -> Result<EngineOutput, GalgameError> {
        self.dispatch(Event::Refresh)
    }

    /// The click/Enter step. Waiting scenes answer `Unchanged`.
    pub fn advance(&mut self) -> Result<EngineOutput, GalgameError> {
        self.dispatch(Event::Advance)
    }

    /// Back to a fresh base session at scene 1. Affection, loop count and
    /// identity are all cleared.
    pub fn restart(&mut self) -> Result<EngineOutput, GalgameError> {
        self.dispatch(Event::Restart)
    }
}
