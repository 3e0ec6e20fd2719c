use clap::Parser;
use oxo::OxoServer;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

/// Networked tic-tac-toe match server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    /// Port to listen on.
    #[arg(short = 'p', long = "port", value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let addr = format!("0.0.0.0:{}", cli.port);

    let server = match OxoServer::bind(&addr).await {
        Ok(server) => server,
        Err(err) => {
            eprintln!("oxo: failed to bind {addr}: {err}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(err) => {
            eprintln!("oxo: failed to install SIGHUP handler: {err}");
            std::process::exit(1);
        }
    };
    tokio::spawn(async move {
        sighup.recv().await;
        tracing::info!("SIGHUP received, starting graceful shutdown");
        let _ = shutdown_tx.send(true);
    });

    // SIGPIPE is already ignored by the Rust runtime at process start, so a
    // broken peer surfaces as a normal send error instead of terminating us.
    if let Err(err) = server.run(shutdown_rx).await {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}
