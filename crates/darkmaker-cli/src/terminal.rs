use std::time::Duration;

use console::Style;
use darkmaker_core::console::ConsoleLine;
use indicatif::{ProgressBar, ProgressStyle};

/// Renders session console lines: transient lines replace each other on a
/// spinner, permanent lines are printed above it.
pub struct TerminalPrinter {
    spinner: ProgressBar,
    heading: Style,
    detail: Style,
}

impl TerminalPrinter {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self {
            spinner,
            heading: Style::new().cyan().bold(),
            detail: Style::new().dim(),
        }
    }

    pub fn print(&self, line: &ConsoleLine) {
        let indent = "  ".repeat(line.indent.max(0) as usize);
        if line.transient {
            self.spinner.set_message(format!("{indent}{}", line.text));
            return;
        }
        let styled = if line.indent == 0 {
            self.heading.apply_to(&line.text).to_string()
        } else {
            self.detail.apply_to(&line.text).to_string()
        };
        self.spinner.println(format!("{indent}{styled}"));
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}
