use console::style;

/// Console rendering for command output
pub struct Output {
    color: bool,
}

impl Output {
    pub fn new() -> Self {
        Self {
            color: console::colors_enabled(),
        }
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// A labelled block meant to be copied as-is
    pub fn block(&self, label: &str, content: &str) {
        println!("{}", style(format!("▸ {}", label)).cyan().bold());
        if content.trim().is_empty() {
            println!("{}", style("(empty)").dim());
        } else {
            println!("{}", content.trim_end());
        }
        println!();
    }

    pub fn key_value(&self, key: &str, value: impl std::fmt::Display) {
        if self.color {
            println!("  {:<14} {}", style(key).dim(), value);
        } else {
            println!("  {:<14} {}", key, value);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
