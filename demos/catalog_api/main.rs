//! Catalogue list API example
//!
//! This example demonstrates:
//! - Loading page-size rules from YAML
//! - Seeding in-memory stores for shows and arrangements
//! - Serving `GET /api/shows` and `GET /api/arrangements` with search,
//!   filters, multi-key sort and pagination
//!
//! Try:
//!
//! ```text
//! curl 'http://127.0.0.1:3000/api/shows?search=night'
//! curl 'http://127.0.0.1:3000/api/arrangements?sort=[{"field":"price","direction":"desc"}]&limit=10'
//! curl 'http://127.0.0.1:3000/api/arrangements/filters'
//! ```

use chrono::TimeZone;
use showcase::prelude::*;
use tracing_subscriber::EnvFilter;

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn seed_shows() -> Vec<Show> {
    let rows = [
        ("Nightfall", 2023, Difficulty::Advanced, 1450.0, true, &["Dark", "Cinematic"][..]),
        ("Carnival of Light", 2022, Difficulty::Intermediate, 980.0, false, &["Latin"][..]),
        ("First Steps", 2021, Difficulty::Beginner, 450.0, false, &["Classical"][..]),
        ("Brass Horizons", 2024, Difficulty::Advanced, 1800.0, true, &["Jazz", "Cinematic"][..]),
        ("Paper Cranes", 2020, Difficulty::Intermediate, 760.0, false, &[][..]),
        ("Night Market", 2024, Difficulty::Beginner, 520.0, false, &["Latin", "Jazz"][..]),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, (title, year, difficulty, price, featured, tags))| {
            let id = u32::try_from(i).unwrap_or_default() + 1;
            let mut show = Show::new(id, *title, date(*year - 1, 9, 1));
            show.description = Some(format!("{} is a {} field show.", title, difficulty.as_str().to_lowercase()));
            show.year = Some(*year);
            show.difficulty = Some(*difficulty);
            show.duration = Some("7:30".to_string());
            show.price = Some(*price);
            show.featured = *featured;
            show.display_order = i32::try_from(i).unwrap_or_default();
            show.tags = tags.iter().map(|t| t.to_string()).collect();
            show
        })
        .collect()
}

fn seed_arrangements() -> Vec<Arrangement> {
    let rows = [
        ("Nightfall Opener", "Marching Band", 120.0, "A. Reyes", 1, "Nightfall"),
        ("Nightfall Ballad", "Full Orchestral", 240.0, "A. Reyes", 1, "Nightfall"),
        ("Samba Closer", "Marching Band", 95.0, "L. Costa", 2, "Carnival of Light"),
        ("Warmup Chorale", "Concert Band", 45.0, "J. Park", 3, "First Steps"),
        ("Horizon Fanfare", "Full Orchestral", 310.0, "M. Okafor", 4, "Brass Horizons"),
        ("Lantern Groove", "Marching Band", 80.0, "L. Costa", 6, "Night Market"),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, (title, kind, price, composer, show_id, show))| {
            let id = u32::try_from(i).unwrap_or_default() + 1;
            let mut arrangement = Arrangement::new(id, *title, *show_id);
            arrangement.arrangement_type = Some(kind.to_string());
            arrangement.price = Some(*price);
            arrangement.composer = Some(composer.to_string());
            arrangement.show = Some(show.to_string());
            arrangement
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,showcase=debug")),
        )
        .init();

    let config = match ListConfig::from_yaml_file("demos/catalog_api/lists.yaml") {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Using default list configuration");
            ListConfig::default()
        }
    };

    let shows = seed_shows();
    let arrangements = seed_arrangements();
    tracing::info!(
        shows = shows.len(),
        arrangements = arrangements.len(),
        "Seeded catalogue"
    );

    ServerBuilder::new()
        .with_config(config)
        .register_resource(InMemoryStore::seeded(shows), show::schema(), show::presets())?
        .register_resource(
            InMemoryStore::seeded(arrangements),
            arrangement::schema(),
            arrangement::presets(),
        )?
        .serve("127.0.0.1:3000")
        .await
}
