//! In-memory graph model of a single function.
//!
//! Bricks live in an arena (`Vec`) in the order their rows were supplied, which
//! is their creation order. Connections refer to bricks by arena index, so the
//! graph holds no back-references and can be dropped as a unit after a run.

use crate::error::GraphError;
use crate::model::{BrickId, BrickRow, ConnectionRow, FunctionRow};
use crate::registry::{BrickType, BrickTypeRegistry};
use ahash::AHashMap;
use std::sync::Arc;

pub mod validator;

pub use validator::{check_connection, validate};

/// Position of a brick in the graph arena. Lower means created earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrickIndex(pub usize);

/// A brick row together with its resolved brick type.
#[derive(Debug, Clone)]
pub struct GraphBrick {
    pub row: BrickRow,
    pub brick_type: Arc<BrickType>,
}

impl GraphBrick {
    pub fn id(&self) -> BrickId {
        self.row.id
    }
}

/// A connection row with both endpoints resolved to arena indices.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub row: ConnectionRow,
    pub from: BrickIndex,
    pub to: BrickIndex,
}

#[derive(Debug, Clone, Default)]
struct Adjacency {
    /// Edge indices in connection order.
    out_edges: Vec<usize>,
    in_edges: Vec<usize>,
    outgoing_by_output: AHashMap<String, Vec<usize>>,
    incoming_by_input: AHashMap<String, Vec<usize>>,
}

/// An execution-ready view of one function's bricks and connections.
#[derive(Debug, Clone)]
pub struct FunctionGraph {
    function: FunctionRow,
    bricks: Vec<GraphBrick>,
    index: AHashMap<BrickId, BrickIndex>,
    edges: Vec<GraphEdge>,
    adjacency: Vec<Adjacency>,
}

impl FunctionGraph {
    /// Builds the graph from stored rows.
    ///
    /// Bricks keep the order of `bricks`. Fails with `MalformedGraph` when a
    /// connection names a brick outside the set, and with `UnknownBrickType`
    /// when a brick's type is not registered.
    pub fn build(
        function: FunctionRow,
        bricks: Vec<BrickRow>,
        connections: Vec<ConnectionRow>,
        registry: &BrickTypeRegistry,
    ) -> Result<Self, GraphError> {
        let mut index = AHashMap::with_capacity(bricks.len());
        let mut graph_bricks = Vec::with_capacity(bricks.len());

        for row in bricks {
            let brick_type = registry
                .get(&row.brick_type)
                .cloned()
                .ok_or_else(|| GraphError::UnknownBrickType {
                    brick: row.id,
                    type_name: row.brick_type.clone(),
                })?;
            index.insert(row.id, BrickIndex(graph_bricks.len()));
            graph_bricks.push(GraphBrick { row, brick_type });
        }

        let mut adjacency = vec![Adjacency::default(); graph_bricks.len()];
        let mut edges = Vec::with_capacity(connections.len());

        for row in connections {
            let resolve = |id: BrickId| {
                index
                    .get(&id)
                    .copied()
                    .ok_or(GraphError::MalformedGraph {
                        function: function.id,
                        connection: row.id,
                        missing_brick: id,
                    })
            };
            let from = resolve(row.from_brick_id)?;
            let to = resolve(row.to_brick_id)?;

            let edge_idx = edges.len();
            let source = &mut adjacency[from.0];
            source.out_edges.push(edge_idx);
            source
                .outgoing_by_output
                .entry(row.from_output_name.clone())
                .or_default()
                .push(edge_idx);
            let target = &mut adjacency[to.0];
            target.in_edges.push(edge_idx);
            target
                .incoming_by_input
                .entry(row.to_input_name.clone())
                .or_default()
                .push(edge_idx);

            edges.push(GraphEdge { row, from, to });
        }

        tracing::debug!(
            function = %function.id,
            bricks = graph_bricks.len(),
            connections = edges.len(),
            "built function graph"
        );

        Ok(Self {
            function,
            bricks: graph_bricks,
            index,
            edges,
            adjacency,
        })
    }

    pub fn function(&self) -> &FunctionRow {
        &self.function
    }

    pub fn len(&self) -> usize {
        self.bricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bricks.is_empty()
    }

    pub fn bricks(&self) -> &[GraphBrick] {
        &self.bricks
    }

    pub fn brick(&self, idx: BrickIndex) -> &GraphBrick {
        &self.bricks[idx.0]
    }

    pub fn index_of(&self, id: BrickId) -> Option<BrickIndex> {
        self.index.get(&id).copied()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn edge(&self, edge_idx: usize) -> &GraphEdge {
        &self.edges[edge_idx]
    }

    /// Outgoing edge indices of a brick, in connection order.
    pub fn out_edges(&self, idx: BrickIndex) -> &[usize] {
        &self.adjacency[idx.0].out_edges
    }

    /// Incoming edge indices of a brick, in connection order.
    pub fn in_edges(&self, idx: BrickIndex) -> &[usize] {
        &self.adjacency[idx.0].in_edges
    }

    /// Edges leaving `output` of the brick at `idx`.
    pub fn outgoing(&self, idx: BrickIndex, output: &str) -> &[usize] {
        self.adjacency[idx.0]
            .outgoing_by_output
            .get(output)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Edges feeding `input` of the brick at `idx`. More than one means the
    /// graph breaks the single-input rule.
    pub fn incoming(&self, idx: BrickIndex, input: &str) -> &[usize] {
        self.adjacency[idx.0]
            .incoming_by_input
            .get(input)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Consumer bricks directly downstream of `idx`, one entry per edge.
    pub fn successors(&self, idx: BrickIndex) -> impl Iterator<Item = BrickIndex> + '_ {
        self.out_edges(idx).iter().map(|&e| self.edges[e].to)
    }
}
