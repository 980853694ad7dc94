use recycling_tracker::{app, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("recycling_tracker=debug,axum=info,tower_http=info");

    let state = AppState::init().await?;
    let app = app::build_app(state);
    app::serve(app).await
}
