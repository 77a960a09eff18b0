pub mod error;
pub mod output;
pub mod script;
pub mod snapshot;
pub mod state;

pub use error::GalgameError;
pub use output::*;
pub use script::*;
pub use snapshot::*;
pub use state::*;
