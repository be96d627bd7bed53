//! spark-grid - a keyboard-navigable virtualized grid for terminal UIs.
//!
//! Built on fine-grained signals: the cursor, the visible window, and
//! subtree focus are all reactive values, and components wire themselves
//! together with effects instead of callbacks threaded through layers.
//!
//! The pieces:
//!
//! - [`components::stepper`]: arrow-key cursor navigation with cells and
//!   edges modes, plus a debounced follow-focus reclamp.
//! - [`state::focus`]: a focused-component index and [focus
//!   trapping](state::focus::FocusTrapper) over component subtrees.
//! - [`components::cell`]: focusable cells that auto-focus when selected,
//!   handle clicks, and acknowledge a key with their content.
//! - [`components::grid`]: the host that windows the data, materializes
//!   only visible cells, and hit-tests the terminal.
//!
//! # Example
//!
//! ```ignore
//! use std::time::{Duration, Instant};
//! use spark_grid::components::grid::{GridProps, GridView};
//! use spark_grid::state::input;
//! use spark_grid::types::CellValues;
//!
//! fn main() -> std::io::Result<()> {
//!     let values = (0..900).map(|i| format!("cell {i}")).collect();
//!     let grid = GridView::mount(GridProps {
//!         values: CellValues::new(values, 6),
//!         viewport_rows: 10,
//!         viewport_columns: 6,
//!         notify: Some(std::rc::Rc::new(|content| {
//!             eprintln!("acknowledged: {content}");
//!         })),
//!         ..Default::default()
//!     });
//!
//!     input::enable_mouse()?;
//!     loop {
//!         // Wake up for the next debounce deadline if one is pending.
//!         let timeout = grid
//!             .next_deadline()
//!             .map(|deadline| deadline.saturating_duration_since(Instant::now()))
//!             .unwrap_or(Duration::from_millis(100));
//!         if let Some(event) = input::poll_event(timeout)? {
//!             grid.handle_event(&event);
//!         }
//!         grid.poll();
//!     }
//! }
//! ```

pub mod components;
pub mod engine;
pub mod state;
pub mod types;

pub use components::grid::{GridProps, GridView};
pub use components::stepper::{ArrowKeyStepper, StepperProps, arrow_key_stepper};
pub use state::focus::{FocusTrapper, focus_trapper};
pub use types::{CellCoord, CellValues, NavigationMode, SectionRendered, VisibleWindow};
