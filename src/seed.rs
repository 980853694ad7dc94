//! Synthetic appliance data for demos and local development.

use clap::Parser;
use rand::{seq::SliceRandom, Rng};
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::appliances::{
    ApplianceCondition, ApplianceStore, CollectionStatus, NewAppliance, RecyclingStatus,
};
use crate::identity::UserDirectory;

pub const DEFAULT_SEED_COUNT: usize = 50;

/// Populate the appliances table with synthetic pickup requests
#[derive(Debug, Parser)]
#[command(name = "seed", about = "Seed the appliances table with sample data", long_about = None)]
pub struct SeedArgs {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Keep existing appliances instead of clearing them first
    #[arg(long)]
    pub keep_existing: bool,

    /// Number of appliances to insert
    #[arg(long, default_value_t = DEFAULT_SEED_COUNT)]
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Rows were already present and clearing was disabled.
    Skipped { existing: i64 },
    Inserted { cleared: u64, inserted: usize },
}

const APPLIANCE_TYPES: &[&str] = &[
    "Refrigerator",
    "Washing Machine",
    "Dryer",
    "Dishwasher",
    "Microwave",
    "Oven",
    "Stove",
    "Air Conditioner",
    "Freezer",
    "Water Heater",
    "Television",
    "Vacuum Cleaner",
    "Toaster",
    "Coffee Maker",
    "Blender",
];

const BRANDS: &[&str] = &[
    "Samsung",
    "LG",
    "Whirlpool",
    "GE",
    "Maytag",
    "Bosch",
    "Kenmore",
    "Frigidaire",
    "KitchenAid",
    "Panasonic",
];

const ADDRESSES: &[&str] = &[
    "123 Main St, Springfield, IL 62701",
    "456 Oak Ave, Chicago, IL 60601",
    "789 Elm St, Naperville, IL 60540",
    "321 Pine Rd, Aurora, IL 60505",
    "654 Maple Dr, Joliet, IL 60435",
    "987 Cedar Ln, Rockford, IL 61101",
    "147 Birch Ct, Peoria, IL 61602",
    "258 Walnut Way, Champaign, IL 61820",
    "369 Ash Blvd, Bloomington, IL 61701",
    "741 Cherry St, Decatur, IL 62521",
];

const CUSTOMER_NAMES: &[&str] = &[
    "John Smith",
    "Mary Johnson",
    "Robert Williams",
    "Patricia Brown",
    "Michael Davis",
    "Linda Miller",
    "David Wilson",
    "Elizabeth Moore",
    "James Taylor",
    "Jennifer Anderson",
    "William Thomas",
    "Barbara Jackson",
    "Richard White",
    "Susan Harris",
    "Joseph Martin",
];

const CONDITIONS: &[ApplianceCondition] = &[
    ApplianceCondition::Working,
    ApplianceCondition::PartiallyWorking,
    ApplianceCondition::NotWorking,
    ApplianceCondition::ForParts,
];

const STATUSES: &[CollectionStatus] = &[
    CollectionStatus::Pending,
    CollectionStatus::Scheduled,
    CollectionStatus::InTransit,
    CollectionStatus::Collected,
    CollectionStatus::Cancelled,
];

const RECYCLING_STATUSES: &[RecyclingStatus] = &[
    RecyclingStatus::NotProcessed,
    RecyclingStatus::InProcessing,
    RecyclingStatus::Recycled,
    RecyclingStatus::Disposed,
    RecyclingStatus::Resold,
];

fn condition_label(c: ApplianceCondition) -> &'static str {
    match c {
        ApplianceCondition::Working => "working",
        ApplianceCondition::PartiallyWorking => "partially working",
        ApplianceCondition::NotWorking => "not working",
        ApplianceCondition::ForParts => "for-parts",
    }
}

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    // Candidate lists are non-empty constants.
    &items[rng.gen_range(0..items.len())]
}

/// Money-like amount in `[low, low + span)` with two decimals.
fn cents<R: Rng + ?Sized>(rng: &mut R, low: i64, span: i64) -> Decimal {
    Decimal::new(rng.gen_range(low * 100..(low + span) * 100), 2)
}

/// One fake pickup request drawn from the fixed candidate lists.
pub fn synthetic_appliance<R: Rng + ?Sized>(
    rng: &mut R,
    owner: Option<Uuid>,
    now: OffsetDateTime,
) -> NewAppliance {
    let appliance_type = *pick(rng, APPLIANCE_TYPES);
    let brand = *pick(rng, BRANDS);
    let customer_name = *pick(rng, CUSTOMER_NAMES);
    let described_condition = *pick(rng, CONDITIONS);
    let prefix: String = brand.chars().take(2).collect::<String>().to_uppercase();

    NewAppliance {
        appliance_type: appliance_type.to_string(),
        brand: Some(brand.to_string()),
        model_number: Some(format!("{}{}", prefix, rng.gen_range(1000..9999))),
        year_of_manufacture: Some(rng.gen_range(2005..2024)),
        condition: *pick(rng, CONDITIONS),
        description: Some(format!(
            "{} in {} condition",
            appliance_type,
            condition_label(described_condition)
        )),
        weight: Some(cents(rng, 10, 100)),
        collection_date: Some(now + Duration::days(rng.gen_range(-30..60))),
        collection_address: Some(pick(rng, ADDRESSES).to_string()),
        collection_fee: Decimal::from(rng.gen_range(30..100)),
        status: *pick(rng, STATUSES),
        recycling_status: *pick(rng, RECYCLING_STATUSES),
        estimated_value: rng.gen_bool(0.5).then(|| cents(rng, 50, 500)),
        recycled_value: rng.gen_ratio(1, 3).then(|| cents(rng, 30, 400)),
        recycling_comment: rng
            .gen_ratio(1, 3)
            .then(|| "Processed successfully".to_string()),
        date_submitted: now - Duration::days(rng.gen_range(1..90)),
        last_updated: Some(now - Duration::days(rng.gen_range(0..30))),
        user_id: owner,
        customer_name: Some(customer_name.to_string()),
        customer_phone: Some(format!(
            "555-{}-{}",
            rng.gen_range(100..999),
            rng.gen_range(1000..9999)
        )),
        customer_email: Some(format!(
            "{}@example.com",
            customer_name.replace(' ', ".").to_lowercase()
        )),
    }
}

/// Clears (unless `keep_existing`) and refills the appliance store. Owners
/// are drawn from the accounts already in the directory.
pub async fn run<R: Rng + Send>(
    store: &dyn ApplianceStore,
    users: &dyn UserDirectory,
    keep_existing: bool,
    count: usize,
    rng: &mut R,
) -> anyhow::Result<SeedOutcome> {
    let mut cleared = 0;
    if !keep_existing {
        cleared = store.clear().await?;
        if cleared > 0 {
            info!(cleared, "existing appliances cleared");
        }
    }

    let existing = store.count(crate::policy::ListScope::All).await?;
    if existing > 0 {
        info!(existing, "appliances already present, skipping seed");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let owners: Vec<Uuid> = users
        .list_with_roles()
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();
    if owners.is_empty() {
        info!("no user accounts found, seeded appliances will have no owner");
    }

    let now = OffsetDateTime::now_utc();
    for _ in 0..count {
        let owner = owners.choose(rng).copied();
        store.insert(synthetic_appliance(rng, owner, now)).await?;
    }
    info!(inserted = count, "sample appliances seeded");
    Ok(SeedOutcome::Inserted {
        cleared,
        inserted: count,
    })
}
