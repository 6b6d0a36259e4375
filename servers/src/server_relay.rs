use anyhow::Result;
use tokio::signal;

mod relay_logic;
use relay_logic::{config, downstream, logger, monitor, state, upstream};

async fn wait_for_terminate() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term_signal) => {
                term_signal.recv().await;
                log::info!("SIGTERM received, initiating shutdown.");
            }
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Explicitly install the default crypto provider for rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = config::load_config();
    let _log_guard = logger::setup_logging(&config.log_dir(), config.log_level())?;

    let relay = config.relay();
    log::info!("Starting relay on port {}", config.port());
    log::info!("{}", relay);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let app_state = state::AppState::new(relay);

    let upstream_handle = tokio::spawn(upstream::run(
        config.clone(),
        app_state.clone(),
        shutdown_tx.subscribe(),
    ));

    let monitor_handle = tokio::spawn(monitor::run(app_state.clone(), shutdown_tx.subscribe()));

    let mut downstream_handle = tokio::spawn(downstream::run(
        config.clone(),
        app_state.clone(),
        shutdown_tx.subscribe(),
    ));

    tokio::select! {
        res = signal::ctrl_c() => {
            if let Err(e) = res {
                log::warn!("Cannot listen for Ctrl-C: {}", e);
            }
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = wait_for_terminate() => {}
        res = &mut downstream_handle => {
            match res {
                Ok(Ok(())) => log::warn!("Downstream server exited."),
                Ok(Err(e)) => log::error!("Downstream server failed: {:#}", e),
                Err(e) => log::error!("Downstream task panicked: {}", e),
            }
        }
    }

    // Send shutdown signal to all components
    let _ = shutdown_tx.send(());

    let _ = tokio::join!(upstream_handle, monitor_handle);
    if !downstream_handle.is_finished() {
        if let Ok(Err(e)) = downstream_handle.await {
            log::error!("Downstream server failed: {:#}", e);
        }
    }

    log::info!("Shutdown complete.");
    Ok(())
}
