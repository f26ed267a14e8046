//! Terminal output utilities
//!
//! Standard output is reserved for the generated manifest, so every
//! diagnostic here goes to stderr.

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), message);
}

/// Print a success message to stderr
pub fn print_success(message: &str) {
    eprintln!("{}: {}", style("success").green().bold(), message);
}

/// Print an info message to stderr
pub fn print_info(message: &str) {
    eprintln!("{}: {}", style("info").blue().bold(), message);
}

/// Print a dimmed diagnostic line, only in verbose mode
pub fn print_verbose(verbose: bool, message: &str) {
    if verbose {
        eprintln!("{}", style(message).dim());
    }
}

/// Create a progress bar with a known length
///
/// The bar is hidden when stderr is not a terminal.
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    if !get_term().is_term() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(bar_style) =
        ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(bar_style.progress_chars("=>-"));
    }
    pb.set_message(message.to_string());
    pb
}

/// Get the terminal for interactive output
pub fn get_term() -> Term {
    Term::stderr()
}
