use iocraft::prelude::{KeyCode, KeyEventKind, KeyModifiers};
use partition_matrix::config::keybindings::{
    BuiltinAction, Keybinding, KeybindingsConfig, MergedBindings, ResolvedBinding, TemplateVars,
    ViewContext, expand_template, key_event_to_string,
};

fn builtin(bindings: &MergedBindings, key: &str, context: ViewContext) -> Option<BuiltinAction> {
    match bindings.resolve(key, context) {
        Some(ResolvedBinding::Builtin(action)) => Some(action),
        _ => None,
    }
}

fn binding(key: &str, builtin: Option<&str>, command: Option<&str>) -> Keybinding {
    Keybinding {
        key: key.to_owned(),
        builtin: builtin.map(str::to_owned),
        command: command.map(str::to_owned),
        name: None,
    }
}

#[test]
fn defaults_resolve_per_context() {
    let bindings = MergedBindings::from_config(&KeybindingsConfig::default());
    assert_eq!(
        builtin(&bindings, "enter", ViewContext::Matrix),
        Some(BuiltinAction::OpenRuns)
    );
    assert_eq!(
        builtin(&bindings, "enter", ViewContext::Dialog),
        Some(BuiltinAction::CloseDialog)
    );
    assert_eq!(
        builtin(&bindings, "y", ViewContext::Dialog),
        Some(BuiltinAction::CopyRunId)
    );
    assert_eq!(
        builtin(&bindings, "T", ViewContext::Matrix),
        Some(BuiltinAction::SortFinal)
    );
}

#[test]
fn context_falls_back_to_universal() {
    let bindings = MergedBindings::from_config(&KeybindingsConfig::default());
    assert_eq!(
        builtin(&bindings, "j", ViewContext::Dialog),
        Some(BuiltinAction::MoveDown)
    );
    assert_eq!(
        builtin(&bindings, "ctrl+c", ViewContext::Matrix),
        Some(BuiltinAction::Quit)
    );
    // `q` closes the dialog instead of quitting.
    assert_eq!(
        builtin(&bindings, "q", ViewContext::Dialog),
        Some(BuiltinAction::CloseDialog)
    );
    assert!(bindings.resolve("z", ViewContext::Matrix).is_none());
}

#[test]
fn override_replaces_default_for_same_key() {
    let config = KeybindingsConfig {
        matrix: vec![binding("t", None, Some("echo {{.Step}}"))],
        ..KeybindingsConfig::default()
    };
    let bindings = MergedBindings::from_config(&config);
    assert!(matches!(
        bindings.resolve("t", ViewContext::Matrix),
        Some(ResolvedBinding::ShellCommand(cmd)) if cmd == "echo {{.Step}}"
    ));
    // The other defaults survive.
    assert_eq!(
        builtin(&bindings, "T", ViewContext::Matrix),
        Some(BuiltinAction::SortFinal)
    );
    assert_eq!(bindings.matrix.iter().filter(|b| b.key == "t").count(), 1);
}

#[test]
fn new_keys_are_appended() {
    let config = KeybindingsConfig {
        universal: vec![binding("x", Some("refresh"), None)],
        ..KeybindingsConfig::default()
    };
    let bindings = MergedBindings::from_config(&config);
    assert_eq!(
        builtin(&bindings, "x", ViewContext::Dialog),
        Some(BuiltinAction::Refresh)
    );
    assert_eq!(
        builtin(&bindings, "r", ViewContext::Matrix),
        Some(BuiltinAction::Refresh)
    );
}

#[test]
fn unknown_builtin_without_command_is_ignored() {
    let config = KeybindingsConfig {
        matrix: vec![binding("t", Some("does_not_exist"), None)],
        ..KeybindingsConfig::default()
    };
    let bindings = MergedBindings::from_config(&config);
    assert!(bindings.resolve("t", ViewContext::Matrix).is_none());
}

#[test]
fn help_groups_universal_first() {
    let bindings = MergedBindings::from_config(&KeybindingsConfig::default());
    let groups = bindings.all_for_context(ViewContext::Dialog);
    assert_eq!(groups[0].0, "Universal");
    assert_eq!(groups[1].0, "Run dialog");
    assert!(groups[1].1.iter().any(|b| b.key == "o"));
}

#[test]
fn every_default_builtin_name_parses() {
    let bindings = MergedBindings::from_config(&KeybindingsConfig::default());
    for b in bindings
        .universal
        .iter()
        .chain(&bindings.matrix)
        .chain(&bindings.dialog)
    {
        let name = b.builtin.as_deref().unwrap();
        assert!(BuiltinAction::from_name(name).is_some(), "{name}");
    }
}

#[test]
fn key_strings() {
    let press = KeyEventKind::Press;
    let none = KeyModifiers::empty();
    assert_eq!(
        key_event_to_string(KeyCode::Char('G'), none, press).as_deref(),
        Some("G")
    );
    assert_eq!(
        key_event_to_string(KeyCode::Char('['), none, press).as_deref(),
        Some("[")
    );
    assert_eq!(
        key_event_to_string(KeyCode::Char('c'), KeyModifiers::CONTROL, press).as_deref(),
        Some("ctrl+c")
    );
    assert_eq!(
        key_event_to_string(KeyCode::PageDown, none, press).as_deref(),
        Some("pagedown")
    );
    assert_eq!(
        key_event_to_string(KeyCode::Esc, none, KeyEventKind::Release),
        None
    );
}

#[test]
fn template_leaves_unknown_placeholders() {
    let vars = TemplateVars {
        pipeline: "etl".to_owned(),
        partition: "2024-01-02".to_owned(),
        step: "load".to_owned(),
        run_id: "r3".to_owned(),
        url: String::new(),
    };
    assert_eq!(
        expand_template("rerun {{.Pipeline}} {{.Partition}} {{.Step}} {{.RunId}} {{.Other}}", &vars),
        "rerun etl 2024-01-02 load r3 {{.Other}}"
    );
}
