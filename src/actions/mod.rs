// actions module: side effects triggered from key bindings

pub mod clipboard;
