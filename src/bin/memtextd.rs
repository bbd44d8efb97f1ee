use std::env;
use std::process;
use tracing::info;

fn main() {
    let cli_config = match memtext::memcache::cli::parser::parse(env::args().collect()) {
        Ok(config) => config,
        Err(err) => {
            eprint!("{}", err);
            process::exit(1);
        }
    };

    // Vary the output based on how many times the user used the "verbose"
    // flag (i.e. 'memtextd -v -v -v' or 'memtextd -vvv' vs 'memtextd -v')
    tracing_subscriber::fmt()
        .with_max_level(cli_config.log_level())
        .init();

    info!("Listen address: {}", cli_config.listen_address);
    info!("Listen port: {}", cli_config.port);
    info!("Connection limit: {}", cli_config.connection_limit);
    info!("Number of threads: {}", cli_config.threads);
    info!("Memory limit: {} bytes", cli_config.memory_limit);
    info!("Max item size: {} bytes", cli_config.item_size_limit);
    info!("Idle timeout: {}s", cli_config.timeout_secs);

    memtext::server::runtime_builder::start_memtext_server(cli_config);
}
