use super::{BrickIndex, FunctionGraph, GraphEdge};
use crate::error::{ConnectError, ValidationError};
use crate::model::BrickId;
use crate::registry::{PortDirection, PortSpec};
use ahash::AHashSet;
use std::collections::VecDeque;

/// Checks that a graph can be executed.
///
/// Checks run in a fixed order and the first failure is returned:
/// type matching, single input per port, acyclicity, completeness of
/// required inputs, and finally that the function has any bricks at all.
/// Every check is linear in bricks plus connections.
pub fn validate(graph: &FunctionGraph) -> Result<(), ValidationError> {
    check_types(graph)?;
    check_single_inputs(graph)?;
    check_acyclic(graph)?;
    check_completeness(graph)?;
    if graph.is_empty() {
        return Err(ValidationError::EmptyFunction);
    }
    Ok(())
}

fn check_types(graph: &FunctionGraph) -> Result<(), ValidationError> {
    for edge in graph.edges() {
        let output = edge_port(graph, edge, PortDirection::Output)?;
        let input = edge_port(graph, edge, PortDirection::Input)?;

        if output.data_type != input.data_type {
            return Err(ValidationError::TypeMismatch {
                connection: edge.row.id,
                output_type: output.data_type,
                input_type: input.data_type,
            });
        }
    }
    Ok(())
}

/// The port an edge attaches to on the given side.
fn edge_port<'g>(
    graph: &'g FunctionGraph,
    edge: &GraphEdge,
    direction: PortDirection,
) -> Result<&'g PortSpec, ValidationError> {
    let (idx, name) = match direction {
        PortDirection::Output => (edge.from, &edge.row.from_output_name),
        PortDirection::Input => (edge.to, &edge.row.to_input_name),
    };
    let brick = graph.brick(idx);
    brick
        .brick_type
        .port(name, direction)
        .ok_or_else(|| ValidationError::UnknownPort {
            connection: edge.row.id,
            brick: brick.id(),
            port: name.clone(),
            direction,
        })
}

fn check_single_inputs(graph: &FunctionGraph) -> Result<(), ValidationError> {
    let mut bound: AHashSet<(BrickIndex, &str)> = AHashSet::with_capacity(graph.edges().len());
    for edge in graph.edges() {
        if !bound.insert((edge.to, edge.row.to_input_name.as_str())) {
            return Err(ValidationError::DuplicateInputBinding {
                brick: graph.brick(edge.to).id(),
                input: edge.row.to_input_name.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Depth-first search with white/gray/black marks. Reaching a gray brick
/// means the current path has looped back on itself.
fn check_acyclic(graph: &FunctionGraph) -> Result<(), ValidationError> {
    let mut marks = vec![Mark::White; graph.len()];
    // Each frame is (brick, position of the next outgoing edge to follow).
    let mut stack: Vec<(BrickIndex, usize)> = Vec::new();

    for root in 0..graph.len() {
        if marks[root] != Mark::White {
            continue;
        }
        marks[root] = Mark::Gray;
        stack.push((BrickIndex(root), 0));

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            let out_edges = graph.out_edges(node);
            if cursor == out_edges.len() {
                marks[node.0] = Mark::Black;
                stack.pop();
                continue;
            }
            frame.1 += 1;

            let next = graph.edge(out_edges[cursor]).to;
            match marks[next.0] {
                Mark::White => {
                    marks[next.0] = Mark::Gray;
                    stack.push((next, 0));
                }
                Mark::Gray => {
                    let start = stack
                        .iter()
                        .position(|(brick, _)| *brick == next)
                        .unwrap_or(0);
                    let path = stack[start..]
                        .iter()
                        .map(|(brick, _)| graph.brick(*brick).id())
                        .chain(std::iter::once(graph.brick(next).id()))
                        .collect();
                    return Err(ValidationError::CircularDependency { path });
                }
                Mark::Black => {}
            }
        }
    }
    Ok(())
}

fn check_completeness(graph: &FunctionGraph) -> Result<(), ValidationError> {
    for (i, brick) in graph.bricks().iter().enumerate() {
        for spec in brick.brick_type.inputs.iter().filter(|spec| spec.required) {
            if !graph.incoming(BrickIndex(i), &spec.name).is_empty() {
                continue;
            }
            if !spec.data_type.is_configurable() {
                return Err(ValidationError::MissingConnection {
                    brick: brick.id(),
                    input: spec.name.clone(),
                });
            }
            if !brick.row.configuration.contains_key(&spec.name) {
                return Err(ValidationError::UnconfiguredInput {
                    brick: brick.id(),
                    input: spec.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Checks a proposed connection against the current graph before it is stored.
///
/// Re-checks port types and the single-input rule, then looks for an existing
/// path from `to` back to `from`, which the new edge would close into a cycle.
pub fn check_connection(
    graph: &FunctionGraph,
    from: BrickId,
    from_output: &str,
    to: BrickId,
    to_input: &str,
) -> Result<(), ConnectError> {
    let from_idx = graph
        .index_of(from)
        .ok_or(ConnectError::BrickNotFound(from))?;
    let to_idx = graph.index_of(to).ok_or(ConnectError::BrickNotFound(to))?;

    let output = brick_port(graph, from_idx, from_output, PortDirection::Output)?;
    let input = brick_port(graph, to_idx, to_input, PortDirection::Input)?;

    if output.data_type != input.data_type {
        return Err(ConnectError::TypeMismatch {
            output_type: output.data_type,
            input_type: input.data_type,
        });
    }

    if !graph.incoming(to_idx, to_input).is_empty() {
        return Err(ConnectError::InputAlreadyConnected {
            brick: to,
            input: to_input.to_string(),
        });
    }

    if from_idx == to_idx {
        return Err(ConnectError::CircularDependency {
            path: vec![from, from],
        });
    }
    if let Some(path) = find_path(graph, to_idx, from_idx) {
        let path = std::iter::once(from)
            .chain(path.into_iter().map(|idx| graph.brick(idx).id()))
            .collect();
        return Err(ConnectError::CircularDependency { path });
    }
    Ok(())
}

fn brick_port<'g>(
    graph: &'g FunctionGraph,
    idx: BrickIndex,
    name: &str,
    direction: PortDirection,
) -> Result<&'g PortSpec, ConnectError> {
    let brick = graph.brick(idx);
    brick
        .brick_type
        .port(name, direction)
        .ok_or_else(|| ConnectError::UnknownPort {
            brick: brick.id(),
            port: name.to_string(),
            direction,
        })
}

/// Breadth-first search from `start` to `goal`, returning the bricks on the
/// path including both ends.
pub fn find_path(
    graph: &FunctionGraph,
    start: BrickIndex,
    goal: BrickIndex,
) -> Option<Vec<BrickIndex>> {
    let mut parent: Vec<Option<BrickIndex>> = vec![None; graph.len()];
    let mut seen = vec![false; graph.len()];
    let mut queue = VecDeque::from([start]);
    seen[start.0] = true;

    while let Some(current) = queue.pop_front() {
        if current == goal {
            let mut path = vec![current];
            let mut cursor = current;
            while let Some(prev) = parent[cursor.0] {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }
        for next in graph.successors(current) {
            if !seen[next.0] {
                seen[next.0] = true;
                parent[next.0] = Some(current);
                queue.push_back(next);
            }
        }
    }
    None
}
