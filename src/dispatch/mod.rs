mod reaper;
mod transition_dispatcher;


pub use reaper::*;
pub use transition_dispatcher::*;
