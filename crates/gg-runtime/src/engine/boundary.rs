use gg_core::{EngineOutput, GalgameError};

use super::GalgameEngine;
use crate::reducer::Event;

impl GalgameEngine {
    pub fn choose(&mut self, index: usize) -> Result<EngineOutput, GalgameError> {
        self.dispatch(Event::Choose(index))
    }

    /// Stores the trimmed text in the scene's input variable. Blank input
    /// is ignored and answers `Unchanged`.
    pub fn submit_input(&mut self, text: &str) -> Result<EngineOutput, GalgameError> {
        self.dispatch(Event::SubmitInput(text.to_string()))
    }
}
