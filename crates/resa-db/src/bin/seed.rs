//! # Seed Data Generator
//!
//! Populates a SQLite database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Default database file
//! cargo run -p resa-db --bin seed
//!
//! # Specify database path
//! cargo run -p resa-db --bin seed -- --db ./data/resa.db
//!
//! # More logging
//! RUST_LOG=resa_db=debug cargo run -p resa-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Two areas with a handful of rooms each
//! - Accounts `admin` (admin), `alice` and `bob` (users); password = name
//! - Bookings over the next two weeks, then a digicode for each

use std::env;

use anyhow::Context;
use chrono::{DateTime, Duration, Timelike, Utc};
use resa_core::password::hash_password;
use resa_core::{BookingStatus, NewBooking, UserLevel};
use resa_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// Areas and their rooms: (area, [(room, capacity)])
const AREAS: &[(&str, &[(&str, i64)])] = &[
    (
        "Batiment A",
        &[("A001", 8), ("A101", 20), ("A102", 20), ("Amphi", 120)],
    ),
    ("Annexe", &[("Salle 1", 12), ("Salle 2", 12), ("Atelier", 6)]),
];

const USERS: &[(&str, UserLevel)] = &[
    ("admin", UserLevel::Admin),
    ("alice", UserLevel::User),
    ("bob", UserLevel::User),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resa_db=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./resa_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Reservation Store Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./resa_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    println!("Reservation Store Seed Data Generator");
    println!("=====================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::sqlite(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.bookings().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} bookings", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let summary = seed(&db, Utc::now()).await?;
    println!("✓ Created {} rooms", summary.rooms);
    println!("✓ Created {} users", summary.users);
    println!("✓ Created {} bookings", summary.bookings);
    println!("✓ Generated {} digicodes", summary.digicodes);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Row counts written by [`seed`].
#[derive(Debug, PartialEq, Eq)]
struct SeedSummary {
    rooms: usize,
    users: usize,
    bookings: usize,
    digicodes: u64,
}

/// Writes the demo areas, rooms, users and bookings, then backfills digicodes.
async fn seed(db: &Database, now: DateTime<Utc>) -> anyhow::Result<SeedSummary> {
    // Rooms are managed by MRBS; plain inserts with fixed IDs are enough here
    let mut room_ids = Vec::new();
    for (area_idx, (area, rooms)) in AREAS.iter().enumerate() {
        let area_id = area_idx as i64 + 1;
        sqlx::query("INSERT INTO mrbs_area (id, area_name) VALUES (?, ?)")
            .bind(area_id)
            .bind(*area)
            .execute(db.pool())
            .await
            .with_context(|| format!("inserting area {area}"))?;

        for (room, capacity) in rooms.iter() {
            let room_id = room_ids.len() as i64 + 1;
            sqlx::query(
                "INSERT INTO mrbs_room (id, area_id, room_name, capacity) VALUES (?, ?, ?, ?)",
            )
            .bind(room_id)
            .bind(area_id)
            .bind(*room)
            .bind(*capacity)
            .execute(db.pool())
            .await
            .with_context(|| format!("inserting room {room}"))?;
            room_ids.push(room_id);
        }
    }
    anyhow::ensure!(!room_ids.is_empty(), "no rooms to book");

    for (name, level) in USERS {
        let hash = hash_password(name)?;
        db.users()
            .insert(*level, name, &hash, &format!("{name}@m2l.local"))
            .await
            .with_context(|| format!("inserting user {name}"))?;
    }

    // Bookings on the hour, spread over the next 14 days
    let base = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    let mut bookings = 0;
    for day in 0..14_usize {
        for (slot, (user, _)) in USERS.iter().enumerate().skip(1) {
            let start = base + Duration::days(day as i64) + Duration::hours(9 + 2 * slot as i64);
            let room_id = room_ids[(day + slot) % room_ids.len()];
            let status = if day % 3 == 0 {
                BookingStatus::Confirmed
            } else {
                BookingStatus::Pending
            };

            let booking = NewBooking::new(
                room_id,
                start.timestamp(),
                (start + Duration::hours(1)).timestamp(),
                *user,
            )
            .status(status);

            db.bookings()
                .insert(&booking, now.timestamp())
                .await
                .with_context(|| format!("inserting booking for {user}"))?;
            bookings += 1;
        }
    }

    let digicodes = db.digicodes().backfill().await?;

    Ok(SeedSummary {
        rooms: room_ids.len(),
        users: USERS.len(),
        bookings,
        digicodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_populates_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        let summary = seed(&db, now).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                rooms: 7,
                users: 3,
                bookings: 28,
                digicodes: 28,
            }
        );

        assert_eq!(db.rooms().list().await.unwrap().len(), 7);
        assert_eq!(db.bookings().count().await.unwrap(), 28);
        assert!(db.digicodes().missing_ids().await.unwrap().is_empty());

        let alice = db
            .bookings()
            .upcoming("alice", now.timestamp())
            .await
            .unwrap();
        assert_eq!(alice.len(), 14);
        assert!(alice.windows(2).all(|w| w[0].start_time <= w[1].start_time));
        assert!(db.users().get_credentials("admin").await.unwrap().is_some());
    }
}
