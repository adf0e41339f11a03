use clap::Parser;
use simse_ft_engine::config::CliArgs;
use simse_ft_engine::server::FtServer;
use simse_ft_engine::transport::NdjsonTransport;
use simse_ft_engine::tree::FileTree;

fn main() {
    let args = CliArgs::parse();

    // Logs go to stderr; stdout carries only protocol messages.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut tree = FileTree::with_config(args.tree_config());
    if args.auto_init {
        if let Err(e) = tree.init() {
            tracing::error!("Failed to initialize file tree: {}", e);
            std::process::exit(1);
        }
    }

    let transport = NdjsonTransport::new();
    let mut server = FtServer::new(transport, tree, args.server_config());

    tracing::info!(
        auto_init = args.auto_init,
        max_path_depth = args.max_path_depth,
        "simse-ft-engine ready"
    );

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
