//! State - reactive input, focus, scroll, and timing state.

pub mod debounce;
pub mod focus;
pub mod input;
pub mod keyboard;
pub mod mouse;
pub mod scroll;
