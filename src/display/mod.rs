//! Terminal rendering for the CLI: tables, spinners and colors.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_spinner, with_spinner};
pub use tables::{
    TableBuilder, build_report_table, index_info_table, mentor_table, recommendation_table,
};
pub use theme::{ScoreBand, THEME, Theme, Tone};
