/// Ties settings, sheets, and the pipeline together
mod app;
/// Clap arg declarations
mod args;
/// Validated run settings built from the args
mod settings;
/// The bundled bisulfite pipeline's step definitions
mod steps;

// re-exported so integration tests can drive the app:
pub use app::App;
pub use args::{Args, LogLevel, SchedulerKind};
pub use settings::Settings;

/// Parse the command line and run the app, logging to stderr.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    // SETTINGS /////////////////
    let settings: Settings = args.try_into()?;
    simple_logging::log_to_stderr(settings.loglevel.to_filter());

    // RUNNING /////////////////
    App::new(settings).run()
}
