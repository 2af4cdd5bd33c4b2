use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::config::keybindings::MergedBindings;
use crate::config::types::AppConfig;
use crate::engine::EngineHandle;
use crate::theme::ResolvedTheme;
use crate::view_state::{ViewState, ViewStateStore};
use crate::views::matrix::MatrixView;

// ---------------------------------------------------------------------------
// Root App component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct AppProps<'a> {
    pub config: Option<&'a AppConfig>,
    pub engine: Option<&'a EngineHandle>,
    pub theme: Option<&'a ResolvedTheme>,
    pub keybindings: Option<&'a MergedBindings>,
    pub color_depth: ColorDepth,
    pub initial_state: Option<&'a ViewState>,
    pub view_store: Option<&'a ViewStateStore>,
}

#[component]
pub fn App<'a>(props: &AppProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let (width, height) = hooks.use_terminal_size();
    let mut system = hooks.use_context_mut::<SystemContext>();
    let should_exit = hooks.use_state(|| false);

    // Exit handling.
    if should_exit.get() {
        system.exit();
    }

    element! {
        View(width: u32::from(width), height: u32::from(height), flex_direction: FlexDirection::Column) {
            MatrixView(
                config: props.config,
                engine: props.engine,
                theme: props.theme,
                keybindings: props.keybindings,
                color_depth: props.color_depth,
                width,
                height,
                should_exit,
                initial_state: props.initial_state,
                view_store: props.view_store,
            )
        }
    }
}
