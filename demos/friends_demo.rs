//! # Friends Module Demo
//!
//! This example demonstrates the friendship flow end to end:
//! 1. Alice sends Bob a friend request
//! 2. Bob accepts it, creating a symmetric friendship
//! 3. Alice posts a friends-only pin that Bob can see and Carol cannot
//! 4. Bob and Alice exchange direct messages
//!
//! ## Run
//!
//! ```bash
//! cargo run --example friends_demo
//! ```

use mapmoments_core::{CoreConfig, MapMomentsCore, Privacy};

#[tokio::main]
async fn main() {
    println!("=================================================");
    println!("         MAPMOMENTS FRIENDS MODULE DEMO");
    println!("=================================================\n");

    // =========================================================================
    // STEP 1: Open an in-memory core and register three users
    // =========================================================================
    println!("1. Registering Alice, Bob, and Carol...\n");

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
    let carol = core
        .users()
        .register("carol", "carol@example.com", "tr0ub4dor")
        .expect("Failed to register Carol");

    println!("   Alice: {}", alice.id);
    println!("   Bob:   {}", bob.id);
    println!("   Carol: {}", carol.id);
    println!();

    // =========================================================================
    // STEP 2: Alice sends Bob a friend request
    // =========================================================================
    println!("2. Alice sends Bob a friend request...\n");

    let request = core
        .friends()
        .send_request(&alice.id, &bob.id)
        .expect("Failed to send request");

    println!("   Request ID: {}", request.id);
    println!("   Status:     {:?}", request.status);

    let incoming = core
        .friends()
        .list_pending_incoming(&bob.id)
        .expect("Failed to list incoming");
    println!("   Bob's incoming requests: {}", incoming.len());
    println!();

    // =========================================================================
    // STEP 3: The graph rejects bad requests
    // =========================================================================
    println!("3. Demonstrating request protections...\n");

    match core.friends().send_request(&alice.id, &alice.id) {
        Ok(_) => println!("   [FAIL] Self-request was allowed!"),
        Err(e) => println!("   [OK] Self-request rejected: {}", e),
    }

    match core.friends().send_request(&alice.id, &bob.id) {
        Ok(_) => println!("   [FAIL] Duplicate request was allowed!"),
        Err(e) => println!("   [OK] Duplicate request rejected: {}", e),
    }

    // A pending request blocks the reverse direction too
    match core.friends().send_request(&bob.id, &alice.id) {
        Ok(_) => println!("   [FAIL] Reverse duplicate was allowed!"),
        Err(e) => println!("   [OK] Reverse duplicate rejected: {}", e),
    }
    println!();

    // =========================================================================
    // STEP 4: Bob accepts, and the friendship is symmetric
    // =========================================================================
    println!("4. Bob accepts the request...\n");

    core.friends()
        .accept_request(&bob.id, &alice.id)
        .expect("Failed to accept request");

    let a_to_b = core
        .friends()
        .are_friends(&alice.id, &bob.id)
        .expect("Failed to check friendship");
    let b_to_a = core
        .friends()
        .are_friends(&bob.id, &alice.id)
        .expect("Failed to check friendship");

    println!("   Alice -> Bob friends: {}", a_to_b);
    println!("   Bob -> Alice friends: {}", b_to_a);
    if a_to_b && b_to_a {
        println!("   [OK] Friendship holds in both directions");
    }
    println!();

    // =========================================================================
    // STEP 5: A friends-only pin reaches friends and nobody else
    // =========================================================================
    println!("5. Alice posts a friends-only pin...\n");

    let pin = core
        .pins()
        .create_pin(
            &alice.id,
            37.8651,
            -119.5383,
            "Yosemite trailhead",
            "Saturday sunrise hike, meet here",
            Privacy::Friends,
        )
        .expect("Failed to create pin");

    let bob_sees = core
        .pins()
        .list_visible(&bob.id)
        .expect("Failed to list pins")
        .iter()
        .any(|p| p.id == pin.id);
    let carol_sees = core
        .pins()
        .list_visible(&carol.id)
        .expect("Failed to list pins")
        .iter()
        .any(|p| p.id == pin.id);

    println!("   Bob sees the pin:   {}", bob_sees);
    println!("   Carol sees the pin: {}", carol_sees);
    if bob_sees && !carol_sees {
        println!("   [OK] Visibility follows the friendship graph");
    }
    println!();

    // =========================================================================
    // STEP 6: Messaging is friends-only
    // =========================================================================
    println!("6. Bob messages Alice about the pin...\n");

    let message = core
        .messaging()
        .send(&bob.id, &alice.id, "Saw your trailhead pin, count me in!")
        .expect("Failed to send message");
    println!("   Sent: \"{}\"", message.content);

    match core.messaging().send(&carol.id, &alice.id, "Can I come too?") {
        Ok(_) => println!("   [FAIL] A stranger's message went through!"),
        Err(e) => println!("   [OK] Stranger's message rejected: {}", e),
    }

    let conversations = core
        .messaging()
        .conversations(&alice.id)
        .expect("Failed to list conversations");
    println!(
        "   Alice's conversations: {} (latest from {})",
        conversations.len(),
        conversations[0].partner.username
    );
    println!();

    // =========================================================================
    // Summary
    // =========================================================================
    println!("=================================================");
    println!("                    SUMMARY");
    println!("=================================================\n");
    println!("  Friendship Graph:");
    println!("  - Requests move none -> pending -> accepted, nothing else");
    println!("  - Acceptance writes both directed edges in one transaction");
    println!("  - No self-requests, no duplicates in either direction");
    println!();
    println!("  What friendship unlocks:");
    println!("  - friends-tier pins and events become visible");
    println!("  - direct messaging opens up");
    println!();
}
