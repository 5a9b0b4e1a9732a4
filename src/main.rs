use quizito_backend::config::Config;
use quizito_backend::db::DatabaseProxy;
use quizito_backend::logging;
use quizito_backend::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = logging::init_tracing(&config.log_level);

    if config.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET not set; /api/adaptive requests will be rejected");
    }

    let db_proxy = match DatabaseProxy::from_env().await {
        Ok(proxy) => Some(proxy),
        Err(err) if err.is_unconfigured() => {
            tracing::warn!(error = %err, "no database configured, using in-memory store");
            None
        }
        Err(err) => {
            tracing::error!(error = %err, "database initialization failed");
            std::process::exit(1);
        }
    };

    let adaptive = AppState::create_adaptive_service(db_proxy.clone());
    tracing::info!(store = adaptive.store_backend(), "adaptive difficulty service ready");

    let addr = config.bind_addr();
    let state = AppState::new(config, db_proxy, adaptive);
    let app = quizito_backend::build_app(state);

    tracing::info!(%addr, "quizito-backend listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "bind listener failed");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
