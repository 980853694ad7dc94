use clap::Parser;
use rand::SeedableRng;
use recycling_tracker::{
    appliances::PgApplianceStore,
    db,
    identity::PgIdentity,
    seed::{self, SeedArgs, SeedOutcome},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("recycling_tracker=info,seed=info");
    let args = SeedArgs::parse();

    let pool = db::connect_url(&args.database_url, 2).await?;
    db::migrate(&pool).await?;

    let store = PgApplianceStore::new(pool.clone());
    let users = PgIdentity::new(pool);
    let mut rng = rand::rngs::StdRng::from_entropy();

    match seed::run(&store, &users, args.keep_existing, args.count, &mut rng).await? {
        SeedOutcome::Skipped { existing } => {
            tracing::info!(existing, "database already contains appliances, nothing seeded")
        }
        SeedOutcome::Inserted { cleared, inserted } => {
            tracing::info!(cleared, inserted, "seeding completed")
        }
    }
    Ok(())
}
