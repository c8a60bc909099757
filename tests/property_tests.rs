#![allow(missing_docs)]

use std::io::Cursor;
use std::sync::Arc;

use proptest::prelude::*;
use sendero::metric::DistanceMetric;
use sendero::proximity::LinearIndex;
use sendero::{
    EuclideanSpace, Graph, GraphDirection, IndexKind, IndexOptions, PointSpace, Roadmap,
    RoadmapOptions, VertexId,
};

fn arb_point() -> impl Strategy<Value = (f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0)
}

fn arb_graph() -> impl Strategy<Value = (Vec<(f64, f64)>, Vec<(usize, usize, f64)>)> {
    prop::collection::vec(arb_point(), 1..30).prop_flat_map(|points| {
        let n = points.len();
        let edges = prop::collection::vec((0..n, 0..n, 0.0f64..50.0), 0..60);
        (Just(points), edges)
    })
}

fn linear_roadmap() -> Roadmap {
    let options = RoadmapOptions::default().index(IndexOptions {
        kind: IndexKind::Linear,
        ..IndexOptions::default()
    });
    Roadmap::new(Arc::new(EuclideanSpace::new(2)), &options).expect("roadmap")
}

proptest! {
    #[test]
    fn prop_text_format_roundtrips((points, edges) in arb_graph()) {
        let space: Arc<dyn PointSpace> = Arc::new(EuclideanSpace::new(2));
        let mut graph: Graph = Graph::with_space(GraphDirection::Undirected, space);
        for &(x, y) in &points {
            let v = graph.add_vertex();
            graph.alloc_point(v, &[x, y]).unwrap();
        }
        for &(a, b, w) in &edges {
            graph.add_edge_weighted(VertexId(a as u32), VertexId(b as u32), w).unwrap();
        }

        let mut first = Vec::new();
        sendero::codec::serialize(&graph, &mut first).unwrap();
        let mut copy: Graph =
            Graph::with_space(GraphDirection::Undirected, Arc::new(EuclideanSpace::new(2)));
        let report = sendero::codec::deserialize(&mut copy, &mut Cursor::new(first.clone())).unwrap();
        prop_assert_eq!(report.vertices, points.len());
        prop_assert_eq!(report.edges, edges.len());

        let mut second = Vec::new();
        sendero::codec::serialize(&copy, &mut second).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_bulk_and_incremental_adds_agree(
        points in prop::collection::vec(arb_point(), 1..40),
        query in arb_point(),
        k in 0usize..10,
    ) {
        let mut incremental = linear_roadmap();
        for &(x, y) in &points {
            incremental.add_configuration(&[x, y]).unwrap();
        }
        let coords: Vec<[f64; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
        let mut bulk = linear_roadmap();
        bulk.add_configurations(coords.iter().map(|c| &c[..])).unwrap();

        let q = [query.0, query.1];
        prop_assert_eq!(incremental.k_nearest(&q, k).unwrap(), bulk.k_nearest(&q, k).unwrap());
        prop_assert_eq!(incremental.nearest(&q).unwrap(), bulk.nearest(&q).unwrap());
    }

    #[test]
    fn prop_add_then_remove_restores_count(
        points in prop::collection::vec(arb_point(), 1..40),
        extra in arb_point(),
    ) {
        let space: Arc<dyn PointSpace> = Arc::new(EuclideanSpace::new(2));
        let mut graph: Graph = Graph::with_space(GraphDirection::Undirected, Arc::clone(&space));
        let mut metric = DistanceMetric::with_space(LinearIndex::new(), space);
        for &(x, y) in &points {
            let v = graph.add_vertex();
            graph.alloc_point(v, &[x, y]).unwrap();
            metric.add_point(graph.vertex_mut(v).unwrap()).unwrap();
        }
        let before = metric.len();

        let v = graph.add_vertex();
        graph.alloc_point(v, &[extra.0, extra.1]).unwrap();
        let node = graph.vertex_mut(v).unwrap();
        metric.add_point(node).unwrap();
        prop_assert_eq!(metric.len(), before + 1);
        prop_assert!(metric.remove_point(node));
        prop_assert_eq!(metric.len(), before);
        prop_assert!(!metric.remove_point(node));
    }

    #[test]
    fn prop_radius_hits_lie_within(
        points in prop::collection::vec(arb_point(), 1..40),
        query in arb_point(),
        radius in 0.0f64..80.0,
    ) {
        let mut map = linear_roadmap();
        for &(x, y) in &points {
            map.add_configuration(&[x, y]).unwrap();
        }
        let q = [query.0, query.1];
        let result = map.within_or_closest(&q, radius).unwrap();
        prop_assert!(result.within.iter().all(|n| n.distance <= radius));
        let expected = points
            .iter()
            .filter(|&&(x, y)| sendero::space::euclidean(&[x, y], &q) <= radius)
            .count();
        prop_assert_eq!(result.within.len(), expected);
        prop_assert_eq!(result.closest.is_some(), expected == 0);
    }
}
