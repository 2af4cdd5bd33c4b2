pub mod footer;
pub mod help_overlay;
pub mod matrix_grid;
pub mod options_bar;
pub mod run_dialog;
pub mod scrollbar;
pub mod text_input;
