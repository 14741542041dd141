use gym_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv, logging)
    setup_environment()?;

    print_banner();

    tracing::info!("Gym server starting...");

    // 2. Configuration
    let config = Config::from_env();
    if config.jwt.secret.len() < 32 && !config.is_development() {
        tracing::warn!("JWT_SECRET is shorter than 32 bytes");
    }

    // 3. State: database, migrations, bootstrap admin
    let state = ServerState::initialize(&config).await?;

    // 4. HTTP server, background tasks start with it
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
