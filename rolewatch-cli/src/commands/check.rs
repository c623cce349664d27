//! Settings validation command

use crate::error::{CliError, CliResult};
use colored::Colorize;
use rolewatch_config::{Diagnostic, Settings, Severity, Validate};

/// Check command
pub fn execute(settings: &Settings) -> CliResult<()> {
    let diagnostics = settings.diagnostics();

    if diagnostics.is_empty() {
        println!("{} Settings are valid", "✓".green());
        return Ok(());
    }

    for diagnostic in &diagnostics {
        println!("{}", format_diagnostic(diagnostic));
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;
    println!();
    println!("{} error(s), {} warning(s)", errors, warnings);

    if errors > 0 {
        Err(CliError::Validation(errors))
    } else {
        Ok(())
    }
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    format!("{}: {}: {}", label, diagnostic.field, diagnostic.message)
}
