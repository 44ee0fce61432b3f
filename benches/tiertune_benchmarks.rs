//! # tiertune Performance Benchmarks
//!
//! Benchmarks for the hot paths: the authorization decision, favorites
//! generation over a large catalog and playlist traversal through the
//! engine's locks.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run a specific benchmark group
//! cargo bench authorization
//! cargo bench favorites
//! cargo bench traversal
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;
use tiertune::catalog::{Catalog, Track, TrackKind};
use tiertune::engine::Engine;
use tiertune::plan::{self, RewardSchedule, Tier};
use tiertune::playlist::{NewPlaylist, Playlist, PlaylistVariant, Visibility};
use tiertune::recommend::{self, FavoritesMode, RecommendConfig};
use tiertune::traversal::ScriptedControl;
use tiertune::user::{self, User};

const GENRES: [&str; 8] = ["Jazz", "Rock", "Soul", "Pop", "Metal", "Blues", "Folk", "Funk"];

/// Helper function to create a catalog with realistic spread
fn create_catalog(size: usize) -> Catalog {
    let mut catalog = Catalog::new();
    for i in 0..size {
        let kind = if i % 5 == 0 { TrackKind::Explicit } else { TrackKind::Standard };
        let track = Track::new(
            format!("M{i:05}"),
            format!("Track {i}"),
            format!("Artist {}", i % 97),
            GENRES[i % GENRES.len()],
            120 + (i % 240) as u32,
        )
        .with_kind(kind);
        let _ = catalog.add_track(track);
    }
    catalog
}

fn create_listener(catalog: &mut Catalog, plays: usize) -> User {
    let mut listener = User::new("bench", "Bench");
    let schedule = RewardSchedule::default();
    let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let ids: Vec<String> = catalog.tracks().map(|t| t.id.clone()).take(plays).collect();
    for id in ids {
        let _ = user::listen(&mut listener, catalog, &id, &schedule, day);
    }
    listener
}

/// Benchmark the authorization table
fn benchmark_authorization(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorization");

    let playlists = [
        Playlist::new("r", vec![], Visibility::Public, "system", PlaylistVariant::Random),
        Playlist::new("p", vec![], Visibility::Private, "u1", PlaylistVariant::Personalized),
        Playlist::new(
            "f",
            vec![],
            Visibility::Private,
            "system",
            PlaylistVariant::Favorites { owner: "u2".into() },
        ),
    ];

    for tier in Tier::ALL {
        group.bench_with_input(BenchmarkId::new("decide", tier), &tier, |b, tier| {
            b.iter(|| {
                for playlist in &playlists {
                    let _ = black_box(plan::decide(*tier, black_box("u1"), playlist));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark favorites generation
fn benchmark_favorites(c: &mut Criterion) {
    let mut group = c.benchmark_group("favorites");
    let config = RecommendConfig::default();

    for size in [100, 1_000, 10_000] {
        let mut catalog = create_catalog(size);
        let listener = create_listener(&mut catalog, 50);

        group.bench_with_input(BenchmarkId::new("plain", size), &catalog, |b, catalog| {
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| {
                let mode = FavoritesMode::Plain;
                recommend::recommend(black_box(&listener), catalog, mode, &config, &mut rng)
            })
        });

        group.bench_with_input(BenchmarkId::new("duration_capped", size), &catalog, |b, catalog| {
            let mut rng = StdRng::seed_from_u64(7);
            let mode = FavoritesMode::DurationCapped { max_secs: 3_600 };
            b.iter(|| recommend::recommend(black_box(&listener), catalog, mode, &config, &mut rng))
        });
    }

    group.finish();
}

/// Benchmark playback through the engine
fn benchmark_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");

    let catalog = create_catalog(500);
    let track_ids: Vec<String> = catalog.tracks().map(|t| t.id.clone()).take(100).collect();

    group.bench_function("random_100_tracks", |b| {
        b.iter_batched(
            || {
                let engine = Engine::default();
                for track in catalog.tracks() {
                    let _ = engine.add_track(track.clone());
                }
                let _ = engine.add_user(User::new("u1", "Bench"));
                let _ = engine.create_playlist(NewPlaylist::random("Mix", track_ids.clone()));
                engine
            },
            |engine| {
                let mut rng = StdRng::seed_from_u64(3);
                engine.play_with_rng("u1", "Mix", &mut ScriptedControl::default(), &mut rng)
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// Group all benchmarks
criterion_group!(benches, benchmark_authorization, benchmark_favorites, benchmark_traversal);

criterion_main!(benches);
