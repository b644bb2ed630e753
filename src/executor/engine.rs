use super::{ExecutionContext, ExecutionResult};
use crate::error::{BrickFailure, ExecutionError};
use crate::graph::{BrickIndex, FunctionGraph, GraphBrick};
use crate::registry::{BoundInputs, BrickOutput};
use crate::value::Value;
use ahash::AHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Runs a validated graph with Kahn's algorithm.
///
/// Bricks that become ready at the same time run in ascending arena order,
/// which is their creation order, so repeated runs of the same graph produce
/// identical console output.
pub struct Executor<'a> {
    graph: &'a FunctionGraph,
    context: &'a ExecutionContext,
}

/// Convenience wrapper around `Executor::new(graph, context).run()`.
pub fn execute(
    graph: &FunctionGraph,
    context: &ExecutionContext,
) -> Result<ExecutionResult, ExecutionError> {
    Executor::new(graph, context).run()
}

impl<'a> Executor<'a> {
    pub fn new(graph: &'a FunctionGraph, context: &'a ExecutionContext) -> Self {
        Self { graph, context }
    }

    pub fn run(self) -> Result<ExecutionResult, ExecutionError> {
        let total = self.graph.len();
        let mut in_degree: Vec<usize> = (0..total)
            .map(|i| self.graph.in_edges(BrickIndex(i)).len())
            .collect();
        let mut ready: BinaryHeap<Reverse<BrickIndex>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(BrickIndex(i)))
            .collect();

        let mut produced: Vec<Option<AHashMap<String, Value>>> = vec![None; total];
        let mut console = Vec::new();
        let mut evaluated = 0;

        while let Some(Reverse(idx)) = ready.pop() {
            let brick = self.graph.brick(idx);
            let output = self
                .evaluate(idx, brick, &produced)
                .map_err(|cause| ExecutionError::ExecutionFailed {
                    brick: brick.id(),
                    brick_type: brick.brick_type.name.clone(),
                    cause,
                })?;

            console.extend(output.console);
            produced[idx.0] = Some(output.values);
            evaluated += 1;

            for next in self.graph.successors(idx) {
                in_degree[next.0] -= 1;
                if in_degree[next.0] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if evaluated != total {
            tracing::error!(
                target: "brickflow::internal",
                function = %self.graph.function().id,
                evaluated,
                total,
                "executor stopped before evaluating every brick"
            );
            return Err(ExecutionError::ExecutorInvariantBroken { evaluated, total });
        }

        tracing::info!(
            function = %self.graph.function().id,
            bricks = total,
            lines = console.len(),
            "execution finished"
        );
        Ok(ExecutionResult::succeeded(console))
    }

    fn evaluate(
        &self,
        idx: BrickIndex,
        brick: &GraphBrick,
        produced: &[Option<AHashMap<String, Value>>],
    ) -> Result<BrickOutput, BrickFailure> {
        let inputs = self.bind_inputs(idx, brick, produced)?;
        tracing::debug!(
            brick = %brick.id(),
            brick_type = %brick.brick_type.name,
            "evaluating brick"
        );
        let output = brick.brick_type.evaluate(&inputs, self.context)?;

        for spec in &brick.brick_type.outputs {
            match output.values.get(&spec.name) {
                None => return Err(BrickFailure::MissingOutput(spec.name.clone())),
                Some(value) if value.data_type() != spec.data_type => {
                    return Err(BrickFailure::OutputTypeMismatch {
                        output: spec.name.clone(),
                        expected: spec.data_type,
                        found: value.data_type(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(output)
    }

    /// Binds each declared input from its incoming connection, falling back
    /// to the configuration literal of the same name.
    fn bind_inputs(
        &self,
        idx: BrickIndex,
        brick: &GraphBrick,
        produced: &[Option<AHashMap<String, Value>>],
    ) -> Result<BoundInputs, BrickFailure> {
        let mut inputs = BoundInputs::new();
        for spec in &brick.brick_type.inputs {
            if let Some(&edge_idx) = self.graph.incoming(idx, &spec.name).first() {
                let edge = self.graph.edge(edge_idx);
                let value = produced[edge.from.0]
                    .as_ref()
                    .and_then(|values| values.get(&edge.row.from_output_name))
                    .ok_or_else(|| BrickFailure::InputUnavailable(spec.name.clone()))?;
                inputs.insert(&spec.name, value.clone());
            } else if let Some(literal) = brick.row.configuration.get(&spec.name) {
                let value = literal.to_value(spec.data_type).ok_or_else(|| {
                    BrickFailure::InvalidConfiguration {
                        input: spec.name.clone(),
                        expected: spec.data_type,
                        found: literal.kind(),
                    }
                })?;
                inputs.insert(&spec.name, value);
            } else if spec.required {
                return Err(BrickFailure::InputUnavailable(spec.name.clone()));
            }
        }
        Ok(inputs)
    }
}
