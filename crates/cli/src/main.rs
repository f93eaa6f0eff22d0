fn main() {
    if let Err(error) = fluentree_cli::run() {
        // Tracing is initialized inside run() after argument parsing.
        tracing::error!(error = format!("{error:#}"), "fluentree failed");
        std::process::exit(1);
    }
}
