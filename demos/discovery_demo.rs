//! # Discovery Module Demo
//!
//! This example demonstrates both discovery modes over a small city map:
//! 1. Seed pins around San Francisco (plus one far away in Los Angeles)
//! 2. Rank them by trending score (engagement decayed by age)
//! 3. Rank them by distance from a downtown origin
//! 4. Show the write-time and query-time coordinate guards
//!
//! ## Run
//!
//! ```bash
//! cargo run --example discovery_demo
//! ```

use mapmoments_core::{CoreConfig, MapMomentsCore, Privacy};

#[tokio::main]
async fn main() {
    println!("=================================================");
    println!("        MAPMOMENTS DISCOVERY MODULE DEMO");
    println!("=================================================\n");

    // =========================================================================
    // STEP 1: Open a core and seed users
    // =========================================================================
    println!("1. Registering users...\n");

    let core = MapMomentsCore::open(CoreConfig::default())
        .await
        .expect("Failed to open core");

    let alice = core
        .users()
        .register("alice", "alice@example.com", "correct horse")
        .expect("Failed to register Alice");
    let bob = core
        .users()
        .register("bob", "bob@example.com", "battery staple")
        .expect("Failed to register Bob");

    println!("   Alice (posts pins): {}", alice.id);
    println!("   Bob (browses):      {}", bob.id);
    println!();

    // =========================================================================
    // STEP 2: Seed public pins around the Bay Area
    // =========================================================================
    println!("2. Seeding pins...\n");

    let spots = [
        ("Ferry Building", "Saturday farmers market", 37.7956, -122.3935),
        ("Golden Gate Overlook", "Fog rolling in at sunset", 37.8324, -122.4795),
        ("Mission Murals", "New piece on Clarion Alley", 37.7625, -122.4216),
        ("Griffith Observatory", "LA skyline at dusk", 34.1184, -118.3004),
    ];

    let mut pin_ids = Vec::new();
    for (title, description, lat, lng) in spots {
        let pin = core
            .pins()
            .create_pin(&alice.id, lat, lng, title, description, Privacy::Public)
            .expect("Failed to create pin");
        println!("   Dropped \"{}\" at ({}, {})", title, lat, lng);
        pin_ids.push(pin.id);
    }
    println!();

    // =========================================================================
    // STEP 3: Engagement drives the trending ranking
    // =========================================================================
    println!("3. Bob engages, then asks for trending pins...\n");

    // Likes count double, comments triple
    core.pins()
        .like_pin(&pin_ids[1], &bob.id)
        .expect("Failed to like");
    core.pins()
        .comment_on_pin(&pin_ids[2], &bob.id, "Adding this to my walk tomorrow")
        .expect("Failed to comment");

    let trending = core
        .discovery()
        .trending(&bob.id)
        .expect("Failed to rank trending");

    println!("   Rank | Pin                    | Likes | Comments");
    println!("   -----+------------------------+-------+---------");
    for (rank, pin) in trending.iter().enumerate() {
        println!(
            "   {:>4} | {:<22} | {:>5} | {:>8}",
            rank + 1,
            pin.title,
            pin.like_count,
            pin.comment_count
        );
    }
    println!();
    println!("   (A comment outweighs a like, so the murals lead.)");
    println!();

    // =========================================================================
    // STEP 4: Nearby ranks by haversine distance
    // =========================================================================
    println!("4. Nearby pins within 15 km of downtown SF...\n");

    let origin = (37.7749, -122.4194);
    let nearby = core
        .discovery()
        .nearby(&bob.id, origin.0, origin.1, 15.0)
        .expect("Failed to rank nearby");

    for result in &nearby {
        println!("   {:>6.2} km  {}", result.distance_km, result.pin.title);
    }
    println!();
    println!("   (Griffith Observatory is ~560 km away and never appears.)");
    println!();

    // =========================================================================
    // STEP 5: A result as the service layer would serialize it
    // =========================================================================
    println!("5. A nearby result as JSON...\n");

    let json = serde_json::to_string_pretty(&nearby[0]).expect("Failed to serialize");
    for line in json.lines() {
        println!("   {}", line);
    }
    println!();

    // =========================================================================
    // STEP 6: Coordinate guards
    // =========================================================================
    println!("6. Demonstrating coordinate guards...\n");

    match core
        .pins()
        .create_pin(&alice.id, 123.0, 0.0, "Nowhere", "Off the map", Privacy::Public)
    {
        Ok(_) => println!("   [FAIL] Out-of-range latitude was accepted!"),
        Err(e) => println!("   [OK] Write rejected: {}", e),
    }

    match core.discovery().nearby(&bob.id, origin.0, origin.1, -5.0) {
        Ok(_) => println!("   [FAIL] Negative radius was accepted!"),
        Err(e) => println!("   [OK] Negative radius rejected: {}", e),
    }
    println!();

    // =========================================================================
    // Summary
    // =========================================================================
    println!("=================================================");
    println!("                    SUMMARY");
    println!("=================================================\n");
    println!("  Trending:");
    println!("  - score = (likes * 2 + comments * 3) / (1 + age_hours / 24)");
    println!("  - ties go to the newer pin; the score is never exposed");
    println!();
    println!("  Nearby:");
    println!("  - haversine distance on a 6371 km sphere");
    println!("  - closest first, distance attached, rounded to 2 decimals");
    println!();
    println!("  Both modes:");
    println!("  - only rank pins the viewer may see");
    println!("  - cap at 50 results");
    println!("  - skip stored rows with malformed coordinates");
    println!();
}
