//! Pure derivation pipeline behind the partition matrix:
//! runs → [`builder`] → [`sort`] → [`viewport`], with [`status`] colouring the
//! cells and [`age`] fading them. Nothing here touches the terminal.

pub mod age;
pub mod builder;
pub mod layout;
pub mod selection;
pub mod sort;
pub mod status;
pub mod viewport;

pub use age::{AgeThreshold, cell_opacity};
pub use builder::{MatrixCell, MatrixData, PartitionColumn, StepRow, build_for_query, build_matrix};
pub use layout::{LaidOutStep, StepGraph};
pub use selection::select_steps;
pub use sort::{SortKey, sort_rows};
pub use status::StatusColor;
pub use viewport::{RenderColumn, ViewportRequest, ViewportWindow, render_list, visible_window};
