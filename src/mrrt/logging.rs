use tracing_subscriber::filter::LevelFilter;

/// Installs the fmt subscriber on stderr, so stdout only carries results.
/// `log` records from the library are bridged into it.
pub fn init(verbose: u8) {
    tracing_subscriber::fmt()
        .with_max_level(level(verbose))
        .with_writer(std::io::stderr)
        .init();
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
