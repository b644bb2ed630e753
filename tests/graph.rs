//! Graph construction and validation tests
mod common;
use brickflow::error::ErrorCategory;
use brickflow::graph::{BrickIndex, check_connection};
use brickflow::prelude::*;
use brickflow::registry::PortDirection;
use common::*;
use std::time::{Duration, Instant};

#[cfg(test)]
mod build_tests {
    use super::*;

    #[test]
    fn test_build_keeps_row_order_and_adjacency() {
        let graph = build_graph(
            vec![concat_row(7), concat_row(3), brick_row(5, "LogText", Configuration::new())],
            vec![wire(20, 7, "text", 3, "left"), wire(21, 3, "text", 5, "message")],
        )
        .expect("Graph should build");

        assert_eq!(graph.len(), 3);
        let ids: Vec<_> = graph.bricks().iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec![BrickId(7), BrickId(3), BrickId(5)]);

        let middle = graph.index_of(BrickId(3)).unwrap();
        assert_eq!(middle, BrickIndex(1));
        assert_eq!(graph.incoming(middle, "left").len(), 1);
        assert!(graph.incoming(middle, "right").is_empty());
        assert_eq!(graph.outgoing(middle, "text").len(), 1);
        assert_eq!(graph.successors(middle).collect::<Vec<_>>(), vec![BrickIndex(2)]);
        assert_eq!(graph.in_edges(BrickIndex(0)).len(), 0);
    }

    #[test]
    fn test_build_rejects_connection_outside_function() {
        let result = build_graph(vec![concat_row(1)], vec![wire(9, 1, "text", 42, "left")]);
        assert_eq!(
            result.unwrap_err(),
            GraphError::MalformedGraph {
                function: FunctionId(1),
                connection: ConnectionId(9),
                missing_brick: BrickId(42),
            }
        );
    }

    #[test]
    fn test_build_rejects_unknown_brick_type() {
        let result = build_graph(vec![brick_row(1, "Teleport", Configuration::new())], vec![]);
        assert_eq!(
            result.unwrap_err(),
            GraphError::UnknownBrickType {
                brick: BrickId(1),
                type_name: "Teleport".to_string(),
            }
        );
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn validate_rows(
        bricks: Vec<BrickRow>,
        connections: Vec<ConnectionRow>,
    ) -> Result<(), ValidationError> {
        validate(&build_graph(bricks, connections).expect("Graph should build"))
    }

    #[test]
    fn test_valid_graph_passes() {
        let result = validate_rows(
            vec![concat_row(1), brick_row(2, "LogText", Configuration::new())],
            vec![wire(3, 1, "text", 2, "message")],
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_type_mismatch() {
        let err = validate_rows(
            vec![concat_row(1), brick_row(2, "LogNumber", Configuration::new())],
            vec![wire(3, 1, "text", 2, "value")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                connection: ConnectionId(3),
                output_type: DataType::Text,
                input_type: DataType::Number,
            }
        );
        assert_eq!(err.category(), ErrorCategory::Structural);
    }

    #[test]
    fn test_unknown_port() {
        let err = validate_rows(
            vec![concat_row(1), concat_row(2)],
            vec![wire(3, 1, "text", 2, "middle")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownPort {
                connection: ConnectionId(3),
                brick: BrickId(2),
                port: "middle".to_string(),
                direction: PortDirection::Input,
            }
        );
    }

    #[test]
    fn test_duplicate_input_binding() {
        let err = validate_rows(
            vec![concat_row(1), concat_row(2), concat_row(3)],
            vec![wire(4, 1, "text", 3, "left"), wire(5, 2, "text", 3, "left")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateInputBinding {
                brick: BrickId(3),
                input: "left".to_string(),
            }
        );
        assert_eq!(err.category(), ErrorCategory::Structural);
    }

    #[test]
    fn test_cycle_reports_path() {
        let err = validate_rows(
            vec![concat_row(1), concat_row(2), concat_row(3)],
            vec![
                wire(4, 1, "text", 2, "left"),
                wire(5, 2, "text", 3, "left"),
                wire(6, 3, "text", 1, "left"),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::CircularDependency {
                path: vec![BrickId(1), BrickId(2), BrickId(3), BrickId(1)],
            }
        );
        assert_eq!(err.to_string(), "Circular dependency: 1 -> 2 -> 3 -> 1");
    }

    #[test]
    fn test_unconfigured_scalar_input() {
        let err = validate_rows(vec![brick_row(1, "LogText", Configuration::new())], vec![])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnconfiguredInput {
                brick: BrickId(1),
                input: "message".to_string(),
            }
        );
        assert_eq!(err.category(), ErrorCategory::Completeness);
    }

    #[test]
    fn test_instance_input_requires_connection() {
        // A configured literal cannot stand in for an instance input.
        let bricks = vec![brick_row(1, "LogInstance", config(&[("instance", text("Ada"))]))];
        let err = validate_rows(bricks, vec![]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingConnection {
                brick: BrickId(1),
                input: "instance".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_function() {
        let err = validate_rows(vec![], vec![]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyFunction);
        assert_eq!(err.category(), ErrorCategory::Completeness);
    }

    #[test]
    fn test_structural_checks_run_before_completeness() {
        // Brick 3 is unconfigured and the edge into brick 2 has mismatched types.
        let err = validate_rows(
            vec![
                concat_row(1),
                brick_row(2, "LogNumber", Configuration::new()),
                brick_row(3, "LogText", Configuration::new()),
            ],
            vec![wire(4, 1, "text", 2, "value")],
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { .. }));
    }

    #[test]
    fn test_duplicate_binding_reported_before_cycle() {
        let err = validate_rows(
            vec![concat_row(1), concat_row(2)],
            vec![
                wire(3, 1, "text", 2, "left"),
                wire(4, 2, "text", 1, "left"),
                wire(5, 1, "text", 2, "left"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateInputBinding { .. }));
    }

    #[test]
    fn test_validation_of_largest_function_is_fast() {
        let bricks: Vec<_> = (1..=100).map(concat_row).collect();
        let connections: Vec<_> = (1..100)
            .map(|i| wire(1000 + i, i, "text", i + 1, "left"))
            .collect();
        let graph = build_graph(bricks, connections).unwrap();

        let start = Instant::now();
        assert_eq!(validate(&graph), Ok(()));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}

#[cfg(test)]
mod connection_check_tests {
    use super::*;

    fn chain() -> FunctionGraph {
        build_graph(
            vec![concat_row(1), concat_row(2), concat_row(3)],
            vec![wire(4, 1, "text", 2, "left"), wire(5, 2, "text", 3, "left")],
        )
        .unwrap()
    }

    #[test]
    fn test_accepts_forward_edge() {
        let graph = chain();
        assert_eq!(check_connection(&graph, BrickId(1), "text", BrickId(3), "right"), Ok(()));
    }

    #[test]
    fn test_rejects_edge_closing_a_cycle() {
        let graph = chain();
        let err = check_connection(&graph, BrickId(3), "text", BrickId(1), "right").unwrap_err();
        assert_eq!(
            err,
            ConnectError::CircularDependency {
                path: vec![BrickId(3), BrickId(1), BrickId(2), BrickId(3)],
            }
        );
    }

    #[test]
    fn test_rejects_self_loop() {
        let graph = chain();
        let err = check_connection(&graph, BrickId(2), "text", BrickId(2), "right").unwrap_err();
        assert_eq!(
            err,
            ConnectError::CircularDependency {
                path: vec![BrickId(2), BrickId(2)],
            }
        );
    }

    #[test]
    fn test_rejects_bound_input_and_bad_ports() {
        let graph = chain();
        assert_eq!(
            check_connection(&graph, BrickId(1), "text", BrickId(2), "left"),
            Err(ConnectError::InputAlreadyConnected {
                brick: BrickId(2),
                input: "left".to_string(),
            })
        );
        assert_eq!(
            check_connection(&graph, BrickId(1), "count", BrickId(3), "right"),
            Err(ConnectError::UnknownPort {
                brick: BrickId(1),
                port: "count".to_string(),
                direction: PortDirection::Output,
            })
        );
        assert_eq!(
            check_connection(&graph, BrickId(1), "text", BrickId(99), "right"),
            Err(ConnectError::BrickNotFound(BrickId(99)))
        );
    }
}
