use colored::Colorize;
use declarative::{ExecuteSummary, Outcome};
use similar::TextDiff;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Status symbol of an outcome
pub fn symbol(outcome: &Outcome) -> colored::ColoredString {
    match outcome {
        Outcome::Changed { .. } => "✓".green(),
        Outcome::WouldChange { .. } => "~".yellow(),
        Outcome::NoChange { .. } => "·".dimmed(),
        Outcome::Failed(_) => "✗".red(),
    }
}

/// Print one resource outcome, with captured stderr on failure
pub fn outcome(id: &str, outcome: &Outcome) {
    println!("  {} {} {}", symbol(outcome), id.bold(), outcome.message());
    if let Outcome::Failed(failure) = outcome {
        for line in failure.stderr.lines().filter(|l| !l.trim().is_empty()) {
            println!("      {}", line.dimmed());
        }
    }
}

/// Print an outcome as JSON
pub fn outcome_json(id: &str, outcome: &Outcome) -> anyhow::Result<()> {
    let mut value = serde_json::to_value(outcome)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("id".to_string(), serde_json::Value::from(id));
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Render a unified diff between two documents
pub fn unified_diff(current: &str, desired: &str, label: &str) -> String {
    TextDiff::from_lines(current, desired)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{label} (current)"), &format!("{label} (desired)"))
        .to_string()
}

/// Print a colored unified diff; nothing when the documents match
pub fn print_diff(current: &str, desired: &str, label: &str) {
    for line in unified_diff(current, desired, label).lines() {
        if line.starts_with("---") || line.starts_with("+++") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else {
            println!("{}", line.dimmed());
        }
    }
}

/// Print the final summary of a batch
pub fn summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if summary.is_success() {
        let title = if dry_run {
            "Preview complete"
        } else {
            "Configuration applied"
        };
        println!("  {} {}", "✓".green().bold(), title);
    } else {
        println!("  {} Completed with errors", "⚠".yellow().bold());
    }

    if summary.changed > 0 {
        println!("    • {} changed", summary.changed);
    }
    if summary.would_change > 0 {
        println!("    • {} would change", summary.would_change);
    }
    if summary.no_change > 0 {
        println!("    • {} unchanged", summary.no_change);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Failure;

    #[test]
    fn test_unified_diff_marks_changed_lines() {
        let diff = unified_diff(
            "config:\n  limits.cpu: '2'\n",
            "config:\n  limits.cpu: '4'\n",
            "web",
        );
        assert!(diff.contains("--- web (current)"));
        assert!(diff.contains("+++ web (desired)"));
        assert!(diff.contains("-  limits.cpu: '2'"));
        assert!(diff.contains("+  limits.cpu: '4'"));
    }

    #[test]
    fn test_unified_diff_empty_when_equal() {
        assert!(unified_diff("a\n", "a\n", "web").is_empty());
    }

    #[test]
    fn test_symbols() {
        colored::control::set_override(false);
        assert_eq!(symbol(&Outcome::changed("x")).to_string(), "✓");
        assert_eq!(symbol(&Outcome::would_change("x")).to_string(), "~");
        assert_eq!(symbol(&Outcome::no_change("x")).to_string(), "·");
        assert_eq!(symbol(&Outcome::Failed(Failure::new("x"))).to_string(), "✗");
    }
}
