use std::sync::Arc;

use super::*;
use crate::model::PathSegment;
use crate::space::EuclideanSpace;

fn space2() -> Arc<dyn PointSpace> {
    Arc::new(EuclideanSpace::new(2))
}

#[test]
fn add_vertices_and_edges() {
    let mut g: Graph = Graph::undirected();
    let a = g.add_vertex();
    let b = g.add_vertex();
    let c = g.add_vertex();
    assert_eq!((a, b, c), (VertexId(0), VertexId(1), VertexId(2)));

    let ab = g.add_edge(a, b).unwrap();
    let bc = g.add_edge_weighted(b, c, 2.5).unwrap();
    assert_eq!(g.vertex_count(), 3);
    assert_eq!(g.edge_count(), 2);
    assert_eq!(g.get_weight(ab), Some(DEFAULT_EDGE_WEIGHT));
    assert_eq!(g.get_weight(bc), Some(2.5));
    assert!(g.has_edge(b, a));
    assert_eq!(g.degree(b), 2);
    assert_eq!(g.color(a), Some(Color::White));
    assert_eq!(g.distance(a), Some(f64::INFINITY));
    assert_eq!(g.predecessor(a), None);
}

#[test]
fn rejects_bad_weights_and_missing_endpoints() {
    let mut g: Graph = Graph::undirected();
    let a = g.add_vertex();
    assert!(g.add_edge_weighted(a, a, -1.0).is_err());
    assert!(g.add_edge_weighted(a, a, f64::NAN).is_err());
    assert!(matches!(
        g.add_edge(a, VertexId(7)),
        Err(SenderoError::NotFound("vertex"))
    ));
    assert!(Graph::<(), ()>::undirected().with_default_weight(-0.5).is_err());
}

#[test]
fn directed_neighbors_follow_out_edges() {
    let mut g: Graph = Graph::directed();
    let a = g.add_vertex();
    let b = g.add_vertex();
    g.add_edge(a, b).unwrap();
    assert_eq!(g.neighbors(a).map(|(v, _)| v).collect::<Vec<_>>(), vec![b]);
    assert_eq!(g.degree(b), 0);
    assert!(g.has_edge(a, b));
    assert!(!g.has_edge(b, a));
}

#[test]
fn remove_vertex_requires_no_edges() {
    let mut g: Graph = Graph::undirected();
    let a = g.add_vertex();
    let b = g.add_vertex();
    g.add_edge(a, b).unwrap();
    assert!(matches!(
        g.remove_vertex(a),
        Err(SenderoError::InvalidArgument(_))
    ));
    let removed = g.clear_and_remove_vertex(a).unwrap();
    assert_eq!(removed.node.node_id(), a);
    assert_eq!(
        removed.relocated,
        Some(Relocation {
            from: VertexId(1),
            to: VertexId(0)
        })
    );
    assert_eq!(g.vertex_count(), 1);
    assert_eq!(g.edge_count(), 0);
    assert_eq!(g.vertex(VertexId(0)).unwrap().node_id(), VertexId(0));
}

#[test]
fn swap_removal_rewrites_edges_of_moved_vertex() {
    let mut g: Graph = Graph::undirected();
    let v: Vec<_> = (0..4).map(|_| g.add_vertex()).collect();
    g.add_edge_weighted(v[2], v[3], 1.0).unwrap();
    g.add_edge_weighted(v[3], v[3], 0.5).unwrap();
    g.set_color(v[3], Color::Black).unwrap();

    let removed = g.remove_vertex(v[0]).unwrap();
    assert_eq!(
        removed.relocated,
        Some(Relocation {
            from: VertexId(3),
            to: VertexId(0)
        })
    );
    assert!(g.has_edge(VertexId(2), VertexId(0)));
    assert!(g.has_edge(VertexId(0), VertexId(0)));
    assert_eq!(g.color(VertexId(0)), Some(Color::Black));
    assert!(!g.contains_vertex(VertexId(3)));
}

#[test]
fn removing_last_vertex_moves_nothing() {
    let mut g: Graph = Graph::undirected();
    g.add_vertex();
    let last = g.add_vertex();
    assert_eq!(g.remove_vertex(last).unwrap().relocated, None);
}

#[test]
fn bulk_removal_compacts_in_order() {
    let mut g: Graph = Graph::undirected();
    let v: Vec<_> = (0..5).map(|_| g.add_vertex()).collect();
    g.add_edge(v[3], v[4]).unwrap();

    g.begin_bulk();
    assert!(g.remove_vertex(v[0]).unwrap().relocated.is_none());
    assert!(g.remove_vertex(v[2]).unwrap().relocated.is_none());
    assert_eq!(g.vertex_count(), 3);
    assert_eq!(g.vertex_bound(), 5);

    let moved = g.end_bulk();
    assert_eq!(
        moved,
        vec![
            Relocation { from: VertexId(1), to: VertexId(0) },
            Relocation { from: VertexId(3), to: VertexId(1) },
            Relocation { from: VertexId(4), to: VertexId(2) },
        ]
    );
    assert_eq!(g.vertex_bound(), 3);
    assert!(g.has_edge(VertexId(1), VertexId(2)));
    let ids: Vec<_> = g.vertices().map(|n| n.node_id()).collect();
    assert_eq!(ids, vec![VertexId(0), VertexId(1), VertexId(2)]);
}

#[test]
fn edge_ids_compact_on_request() {
    let mut g: Graph = Graph::undirected();
    let a = g.add_vertex();
    let b = g.add_vertex();
    let c = g.add_vertex();
    let e0 = g.add_edge_weighted(a, b, 1.0).unwrap();
    g.add_edge_weighted(b, c, 2.0).unwrap();
    g.remove_edge(e0).unwrap();
    assert!(g.remove_edge(e0).is_none());
    assert_eq!(g.edge_ids().collect::<Vec<_>>(), vec![EdgeId(1)]);

    g.update_edge_ids();
    assert_eq!(g.edge_ids().collect::<Vec<_>>(), vec![EdgeId(0)]);
    assert_eq!(g.get_weight(EdgeId(0)), Some(2.0));
    assert_eq!(g.find_edge(c, b), Some(EdgeId(0)));
    assert_eq!(g.edge(EdgeId(0)).unwrap().edge_id(), EdgeId(0));
}

#[test]
fn components_split_and_label() {
    let mut g: Graph = Graph::undirected();
    let a = g.add_vertex();
    let b = g.add_vertex();
    let c = g.add_vertex();
    let d = g.add_vertex();
    g.add_edge(a, b).unwrap();
    g.add_edge(c, d).unwrap();
    assert_eq!(g.update_components(), 2);
    assert!(g.same_component(a, b));
    assert!(g.same_component(c, d));
    assert!(!g.same_component(a, c));
    assert_eq!(g.component(a), Some(0));
    assert_eq!(g.component(c), Some(1));

    g.add_edge(b, c).unwrap();
    assert_eq!(g.update_components(), 1);
    assert!(g.same_component(a, d));
}

#[test]
fn points_are_released_on_removal_and_clear() {
    let space = space2();
    let mut g: Graph = Graph::with_space(GraphDirection::Undirected, Arc::clone(&space));
    let a = g.add_vertex();
    let b = g.add_vertex();
    g.alloc_point(a, &[0.0, 1.0]).unwrap();
    g.alloc_point(b, &[2.0, 3.0]).unwrap();
    g.alloc_point(b, &[4.0, 5.0]).unwrap();
    assert_eq!(space.live_points(), 2);
    assert_eq!(g.coords(b).unwrap().as_slice(), &[4.0, 5.0]);

    g.remove_vertex(a).unwrap();
    assert_eq!(space.live_points(), 1);
    g.clear();
    assert_eq!(space.live_points(), 0);
    assert!(g.is_empty());
    assert_eq!(g.edge_count(), 0);
}

#[test]
fn link_space_refused_once_populated() {
    let mut g: Graph = Graph::undirected();
    g.add_vertex();
    assert!(g.link_space(space2()));
    assert!(!g.link_space(space2()));
    g.clear();
    assert!(g.link_space(space2()));
}

#[test]
fn alloc_point_without_space() {
    let mut g: Graph = Graph::undirected();
    let a = g.add_vertex();
    assert!(matches!(
        g.alloc_point(a, &[0.0, 0.0]),
        Err(SenderoError::SpaceNotLinked)
    ));
}

#[test]
fn typed_edge_payload() {
    let mut g: Graph<(), PathSegment> = Graph::undirected();
    let a = g.add_vertex();
    let b = g.add_vertex();
    let mut seg = PathSegment::new(2);
    seg.push(&[0.0, 0.0]).unwrap();
    seg.push(&[1.0, 1.0]).unwrap();
    g.add_edge_with(a, b, 1.0, seg.clone()).unwrap();
    assert_eq!(g.edge_between(b, a).unwrap().payload, seg);
    g.edge_between(a, b).unwrap();
    let e = g.find_edge(a, b).unwrap();
    g.edge_mut(e).unwrap().payload = PathSegment::new(2);
    assert!(g.edge(e).unwrap().payload.is_empty());
}
