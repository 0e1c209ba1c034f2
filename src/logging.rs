use tracing_subscriber::EnvFilter;

/// `RUST_LOG` があればそれを優先し、なければ `-v` で debug まで出す
pub fn init(verbose: bool) {
    let default = if verbose {
        "ic_inspect=debug,ic_inspect_common=debug"
    } else {
        "ic_inspect=warn,ic_inspect_common=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
