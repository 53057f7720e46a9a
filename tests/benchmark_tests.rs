//! Performance benchmarks for the per-frame client paths

use client::trail::Trail;
use client::view::zoom_for_part_count;
use client::world::{UnknownPlayerPolicy, WorldState};
use shared::{decode_frame, Coord, Rgb};
use std::time::Instant;

/// Benchmarks trail propagation for a long snake
#[test]
fn benchmark_trail_propagation() {
    let mut trail = Trail::new();
    for _ in 0..99 {
        trail.grow();
    }

    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        trail.propagate(Coord::new(i as f32, i as f32));
    }

    let duration = start.elapsed();
    println!(
        "Trail propagation (100 segments): {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(trail.len(), 100);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks frame decoding for the hottest message kind
#[test]
fn benchmark_position_frame_decoding() {
    let frame = r#"{"message_type":"pos","player_id":"player-42","x":1234.5,"y":678.25,"t":1.57}"#;

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let event = decode_frame(frame).unwrap();
        assert!(event.is_some());
    }

    let duration = start.elapsed();
    println!(
        "Position frame decoding: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Stress test: many players moving every tick
#[test]
fn stress_test_many_players() {
    let mut world = WorldState::new(UnknownPlayerPolicy::Drop);
    let ids: Vec<String> = (0..200).map(|i| format!("p{}", i)).collect();
    for id in &ids {
        world.add_player(id, Rgb::default());
        for _ in 0..10 {
            world.add_player_part(id);
        }
    }

    let ticks = 100;
    let start = Instant::now();

    for tick in 0..ticks {
        for id in &ids {
            world.set_player_position(id, tick as f32, tick as f32, 0.0);
        }
    }

    let duration = start.elapsed();
    println!(
        "Position updates: {} players x {} ticks in {:?}",
        ids.len(),
        ticks,
        duration
    );

    assert_eq!(world.player_count(), 200);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks the zoom policy lookup
#[test]
fn benchmark_zoom_policy() {
    let iterations = 100_000;
    let start = Instant::now();

    let mut applied = 0;
    for i in 0..iterations {
        if zoom_for_part_count(i % 64).is_some() {
            applied += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Zoom policy: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(applied > 0);
    assert!(duration.as_millis() < 500);
}
