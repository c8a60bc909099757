#![allow(missing_docs)]

use std::io::Cursor;
use std::sync::Arc;

use sendero::codec::{deserialize, serialize};
use sendero::{
    EuclideanSpace, Graph, GraphDirection, PathSegment, PointSpace, Roadmap, RoadmapOptions,
    SenderoError, VertexId,
};
use tempfile::TempDir;

fn space(dimension: usize) -> Arc<dyn PointSpace> {
    Arc::new(EuclideanSpace::new(dimension))
}

/// Three collinear configurations joined in a chain.
fn chain(offset: f64) -> Roadmap {
    let mut map: Roadmap = Roadmap::new(space(2), &RoadmapOptions::default()).expect("roadmap");
    let ids = map
        .add_configurations([
            &[offset, 0.0][..],
            &[offset + 1.0, 0.0][..],
            &[offset + 2.0, 0.0][..],
        ])
        .expect("add");
    map.connect(ids[0], ids[1]).expect("connect");
    map.connect(ids[1], ids[2]).expect("connect");
    map
}

#[test]
fn save_and_load_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("chain.roadmap");
    let original = chain(0.0);
    original.save_to_path(&path).expect("save");

    let mut loaded: Roadmap = Roadmap::new(space(2), &RoadmapOptions::default()).expect("roadmap");
    let report = loaded.load_from_path(&path).expect("load");
    assert_eq!(report.vertices, 3);
    assert_eq!(report.edges, 2);
    assert_eq!(report.components, 1);
    assert_eq!(loaded.vertex_count(), original.vertex_count());
    assert_eq!(loaded.edge_count(), original.edge_count());
    for (a, b) in original.graph().edges().zip(loaded.graph().edges()) {
        assert_eq!(a.source(), b.source());
        assert_eq!(a.target(), b.target());
        let wa = original.graph().get_weight(a.edge_id()).expect("weight");
        let wb = loaded.graph().get_weight(b.edge_id()).expect("weight");
        assert!((wa - wb).abs() < 1e-12);
    }
    assert_eq!(loaded.nearest(&[1.1, 0.0]).expect("nearest").vertex, VertexId(1));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let mut map: Roadmap = Roadmap::new(space(2), &RoadmapOptions::default()).expect("roadmap");
    let err = map
        .load_from_path(dir.path().join("absent.roadmap"))
        .expect_err("must fail");
    assert!(matches!(err, SenderoError::Io(_)));
    assert!(map.is_empty());
}

#[test]
fn sequential_loads_merge_without_collisions() {
    let dir = TempDir::new().expect("tempdir");
    let first = dir.path().join("a.roadmap");
    let second = dir.path().join("b.roadmap");
    chain(0.0).save_to_path(&first).expect("save");
    chain(10.0).save_to_path(&second).expect("save");

    let mut merged: Roadmap = Roadmap::new(space(2), &RoadmapOptions::default()).expect("roadmap");
    assert_eq!(merged.load_from_path(&first).expect("load").offset, 0);
    assert_eq!(merged.load_from_path(&second).expect("load").offset, 3);
    assert_eq!(merged.vertex_count(), 6);
    assert_eq!(merged.edge_count(), 4);

    let graph = merged.graph();
    let late: Vec<_> = graph.edges().skip(2).collect();
    for link in late {
        assert!(link.source().0 >= 3 && link.target().0 >= 3);
    }
    assert!(!graph.same_component(VertexId(0), VertexId(3)));
    assert!(graph.same_component(VertexId(3), VertexId(5)));
    assert_eq!(merged.nearest(&[12.0, 0.0]).expect("nearest").vertex, VertexId(5));
}

#[test]
fn directed_graph_keeps_orientation() {
    let sp = space(1);
    let mut g: Graph = Graph::with_space(GraphDirection::Directed, Arc::clone(&sp));
    let a = g.add_vertex();
    let b = g.add_vertex();
    g.alloc_point(a, &[0.0]).expect("point");
    g.alloc_point(b, &[1.0]).expect("point");
    g.add_edge_weighted(b, a, 0.75).expect("edge");

    let mut buf = Vec::new();
    serialize(&g, &mut buf).expect("serialize");
    let mut copy: Graph = Graph::with_space(GraphDirection::Directed, space(1));
    deserialize(&mut copy, &mut Cursor::new(buf)).expect("deserialize");
    assert!(copy.has_edge(b, a));
    assert!(!copy.has_edge(a, b));
}

#[test]
fn path_segments_survive_a_roundtrip() {
    let mut map: Roadmap<(), PathSegment> =
        Roadmap::new(space(2), &RoadmapOptions::default()).expect("roadmap");
    let a = map.add_configuration(&[0.0, 0.0]).expect("add");
    let b = map.add_configuration(&[2.0, 0.0]).expect("add");
    let mut segment = PathSegment::new(2);
    for x in [0.0, 0.5, 1.0, 1.5, 2.0] {
        segment.push(&[x, 0.1 * x]).expect("waypoint");
    }
    let weight = segment.length(sendero::space::euclidean);
    map.connect_with(a, b, weight, segment.clone()).expect("connect");

    let mut buf = Vec::new();
    map.save(&mut buf).expect("save");
    let mut copy: Roadmap<(), PathSegment> =
        Roadmap::new(space(2), &RoadmapOptions::default()).expect("roadmap");
    copy.load(&mut Cursor::new(buf)).expect("load");
    let link = copy.graph().edge_between(a, b).expect("edge");
    assert_eq!(link.payload, segment);
    assert_eq!(copy.graph().get_weight(link.edge_id()), Some(weight));
}
