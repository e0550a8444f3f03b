//! Incremental search control
//!
//! [`SearchController`] is the synchronous state machine. [`SearchSession`]
//! runs it inside an actor together with the debouncer, the debounce timers
//! and the page fetches, and publishes [`SearchEvent`]s to observers.

pub mod actor;
pub mod events;
pub mod machine;
pub mod state;

pub use actor::{SearchActor, SearchSession};
pub use events::{changes, SearchCommand, SearchEvent};
pub use machine::SearchController;
pub use state::{ControllerState, Phase};
