//! Discovery ranking benchmarks.
//!
//! Measures the haversine primitive on its own, then both discovery modes
//! over a seeded in-memory database.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use mapmoments_core::discovery::DiscoveryService;
use mapmoments_core::geo;
use mapmoments_core::storage::Database;

/// Pins seeded for the service-level benchmarks
const PIN_COUNT: usize = 1_000;

fn seeded_database(rt: &tokio::runtime::Runtime) -> Arc<Database> {
    let database = Arc::new(rt.block_on(Database::open(None)).expect("open database"));

    database
        .insert_user("viewer", "viewer", "viewer@example.com", "hash")
        .expect("insert user");

    // Scatter pins across a ~4 degree box around San Francisco with a
    // spread of engagement levels.
    for i in 0..PIN_COUNT {
        let id = format!("pin-{}", i);
        let lat = 36.0 + (i % 40) as f64 * 0.1;
        let lng = -124.0 + (i % 37) as f64 * 0.1;
        database
            .insert_pin(&id, "viewer", &id, "seeded", lat, lng, "public")
            .expect("insert pin");

        for like in 0..(i % 5) {
            database
                .add_like(&id, &format!("liker-{}", like))
                .expect("insert like");
        }
        if i % 7 == 0 {
            database
                .insert_comment(&format!("c-{}", i), &id, "viewer", "viewer", "!")
                .expect("insert comment");
        }
    }

    database
}

fn bench_haversine(c: &mut Criterion) {
    c.bench_function("haversine_km", |b| {
        b.iter(|| {
            geo::haversine_km(
                black_box(37.7749),
                black_box(-122.4194),
                black_box(40.7128),
                black_box(-74.0060),
            )
        })
    });
}

fn bench_trending(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let discovery = DiscoveryService::new(seeded_database(&rt));

    c.bench_function("trending_1k_pins", |b| {
        b.iter(|| discovery.trending(black_box("viewer")).expect("trending"))
    });
}

fn bench_nearby(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let discovery = DiscoveryService::new(seeded_database(&rt));

    c.bench_function("nearby_1k_pins", |b| {
        b.iter(|| {
            discovery
                .nearby(black_box("viewer"), 37.7749, -122.4194, 100.0)
                .expect("nearby")
        })
    });
}

criterion_group!(benches, bench_haversine, bench_trending, bench_nearby);
criterion_main!(benches);
