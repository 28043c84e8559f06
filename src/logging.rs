use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

/// Install the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` directives are honoured; on top of them the crate logs at `info`, or at `debug`
/// when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = match format!("snxroster={level}").parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
