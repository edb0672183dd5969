//! Widgets for the three panels.

pub mod command_composer;
pub mod detail_view;
pub mod stage_table;

pub use command_composer::{ComposerAction, CommandComposer};
pub use detail_view::DetailView;
pub use stage_table::{render_stage_table, StageState};
