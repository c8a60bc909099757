#![allow(missing_docs)]

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sendero::metrics::CounterMetrics;
use sendero::{
    EuclideanSpace, IndexKind, IndexOptions, Roadmap, RoadmapOptions, SenderoError, VertexId,
};

fn roadmap(kind: IndexKind, options: RoadmapOptions) -> Roadmap {
    let options = options.index(IndexOptions {
        kind,
        ..IndexOptions::default()
    });
    Roadmap::new(Arc::new(EuclideanSpace::new(2)), &options).expect("roadmap")
}

fn scatter(map: &mut Roadmap, count: usize, seed: u64) -> Vec<[f64; 2]> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let points: Vec<[f64; 2]> = (0..count)
        .map(|_| [rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)])
        .collect();
    for p in &points {
        map.add_configuration(p).expect("add");
    }
    points
}

#[test]
fn zero_k_is_always_empty() {
    for kind in [IndexKind::Linear, IndexKind::Navigable] {
        let mut map = roadmap(kind, RoadmapOptions::default());
        assert!(map.k_nearest(&[0.0, 0.0], 0).expect("query").is_empty());
        scatter(&mut map, 20, 1);
        assert!(map.k_nearest(&[0.0, 0.0], 0).expect("query").is_empty());
    }
}

#[test]
fn oversized_k_is_rejected() {
    let mut map = roadmap(IndexKind::Linear, RoadmapOptions::default().max_query_width(8));
    scatter(&mut map, 20, 2);
    let err = map.k_nearest(&[0.0, 0.0], 9).expect_err("too wide");
    assert!(matches!(
        err,
        SenderoError::QueryWidthExceeded {
            requested: 9,
            max: 8
        }
    ));
    assert_eq!(map.k_nearest(&[0.0, 0.0], 8).expect("query").len(), 8);
}

#[test]
fn empty_index_single_query_fails_fast() {
    for kind in [IndexKind::Linear, IndexKind::Navigable] {
        let map = roadmap(kind, RoadmapOptions::default());
        assert!(matches!(
            map.nearest(&[0.0, 0.0]),
            Err(SenderoError::EmptyIndex)
        ));
    }
}

#[test]
fn fallback_matches_single_query() {
    for kind in [IndexKind::Linear, IndexKind::Navigable] {
        let mut map = roadmap(kind, RoadmapOptions::default());
        scatter(&mut map, 60, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..25 {
            let q = [rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0)];
            let r = rng.gen_range(0.0..0.3);
            let result = map.within_or_closest(&q, r).expect("query");
            if result.within.is_empty() {
                let fallback = result.closest.expect("fallback");
                assert_eq!(fallback, map.nearest(&q).expect("nearest"));
            } else {
                assert!(result.closest.is_none());
                assert!(result.within.iter().all(|n| n.distance <= r));
            }
        }
    }
}

#[test]
fn radius_results_are_never_truncated() {
    let mut map = roadmap(IndexKind::Navigable, RoadmapOptions::default().max_query_width(4));
    scatter(&mut map, 300, 5);
    let all = map.within(&[0.0, 0.0], 100.0).expect("radius");
    assert_eq!(all.len(), 300);
    assert!(all.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn index_kinds_agree_on_radius_queries() {
    let mut linear = roadmap(IndexKind::Linear, RoadmapOptions::default());
    let mut navigable = roadmap(IndexKind::Navigable, RoadmapOptions::default());
    scatter(&mut linear, 150, 6);
    scatter(&mut navigable, 150, 6);
    for q in [[0.0, 0.0], [2.5, -1.0], [-4.0, 4.0]] {
        let a: Vec<VertexId> = linear
            .within(&q, 1.5)
            .expect("radius")
            .into_iter()
            .map(|n| n.vertex)
            .collect();
        let b: Vec<VertexId> = navigable
            .within(&q, 1.5)
            .expect("radius")
            .into_iter()
            .map(|n| n.vertex)
            .collect();
        assert_eq!(a, b);
    }
}

#[test]
fn removal_and_reinsertion_keep_counts_aligned() {
    let counters = Arc::new(CounterMetrics::default());
    let mut map = roadmap(
        IndexKind::Linear,
        RoadmapOptions::default().metrics(counters.clone()),
    );
    let points = scatter(&mut map, 80, 7);
    let ids: Vec<_> = map.graph().vertex_ids().collect();
    for &v in ids.iter().take(10) {
        let next = map
            .k_nearest(&points[v.index()], 3)
            .expect("knn")
            .into_iter()
            .map(|n| n.vertex)
            .filter(|u| *u != v)
            .collect::<Vec<_>>();
        for u in next {
            if !map.graph().has_edge(v, u) {
                map.connect(v, u).expect("connect");
            }
        }
    }

    for _ in 0..30 {
        map.remove_configuration(VertexId(0)).expect("remove");
        assert_eq!(map.metric().len(), map.vertex_count());
    }
    assert_eq!(map.vertex_count(), 50);
    assert_eq!(map.space().live_points(), 50);

    for v in map.graph().vertex_ids() {
        let coords = map.graph().coords(v).expect("coords");
        let hit = map.nearest(&coords).expect("nearest");
        assert_eq!(hit.vertex, v);
        assert_eq!(hit.distance, 0.0);
    }

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.vertices_added, 80);
    assert_eq!(snapshot.vertices_removed, 30);
    assert_eq!(snapshot.edges_added, snapshot.edges_removed + map.edge_count() as u64);
}
