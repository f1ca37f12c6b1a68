// src/district/graph.rs
use crate::district::{District, DistrictId};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

/// Граф смежности районов: вес узла равен индексу района, каждое ребро ровно одно.
#[must_use]
pub fn build_district_graph(districts: &[District]) -> UnGraph<usize, ()> {
    let mut graph = UnGraph::with_capacity(districts.len(), districts.len() * 3);
    let id_to_node: HashMap<DistrictId, NodeIndex> = districts
        .iter()
        .map(|district| (district.id, graph.add_node(district.id.0)))
        .collect();

    for district in districts {
        for neighbour in district.adjacent().iter().filter(|&&n| n > district.id) {
            if let Some(&other) = id_to_node.get(neighbour) {
                graph.add_edge(id_to_node[&district.id], other, ());
            }
        }
    }
    graph
}
