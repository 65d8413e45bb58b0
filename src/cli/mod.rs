pub mod terminal;

pub use terminal::{check_for_escape, print_status, render_decision, render_recording, EscapeKey, StatusAwareStderr};
