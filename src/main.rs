use fittrack::app::{build_app, init_tracing};
use fittrack::config::AppConfig;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.log);

    let state = build_app(config)?;
    match state.auth().current_user() {
        Some(user) => tracing::info!(user_id = user.id, email = %user.email, "session restored"),
        None => tracing::info!("no active session"),
    }
    Ok(())
}
