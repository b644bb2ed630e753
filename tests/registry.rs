//! Brick type registry and built-in catalog tests
mod common;
use brickflow::prelude::*;
use common::*;

fn customers_context() -> ExecutionContext {
    let instances = vec![
        Instance {
            id: InstanceId(10),
            database: "Customers".to_string(),
            values: customer("Ada", 31.0),
        },
        Instance {
            id: InstanceId(11),
            database: "Customers".to_string(),
            values: customer("Grace", 45.0),
        },
    ];
    ExecutionContext::new().with_database("Customers", instances)
}

fn evaluate(
    brick_type: &str,
    inputs: &[(&str, Value)],
    context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let registry = BrickTypeRegistry::new();
    let mut bound = BoundInputs::new();
    for (name, value) in inputs {
        bound.insert(name, value.clone());
    }
    registry
        .get(brick_type)
        .expect("Brick type should be registered")
        .evaluate(&bound, context)
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn test_default_catalog_contents() {
        let registry = BrickTypeRegistry::new();
        assert_eq!(registry.len(), 11);

        let names: Vec<_> = registry.iter().map(|t| t.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted, "iteration should be sorted by name");
        assert!(registry.contains("ListInstancesByDBName"));
        assert!(registry.contains("LogListOfInstances"));
        assert!(!registry.contains("listinstancesbydbname"));
    }

    #[test]
    fn test_port_declarations() {
        let registry = BrickTypeRegistry::new();
        let list = registry.get("ListInstancesByDBName").unwrap();

        let input = list.input("database_name").unwrap();
        assert_eq!(input.data_type, DataType::Text);
        assert!(input.required);
        assert_eq!(list.output("instances").unwrap().data_type, DataType::InstanceList);
        assert!(list.output("database_name").is_none());

        let log = registry.get("LogInstance").unwrap();
        assert!(log.outputs.is_empty());
        assert_eq!(log.inputs[0].data_type, DataType::Instance);
    }

    #[test]
    fn test_register_custom_brick_type() {
        fn double(inputs: &BoundInputs, _: &ExecutionContext) -> Result<BrickOutput, BrickFailure> {
            Ok(BrickOutput::new().with_value("value", Value::Number(inputs.number("value")? * 2.0)))
        }
        let double_type = || {
            BrickType::new(
                "Double",
                vec![PortSpec::required("value", DataType::Number)],
                vec![PortSpec::required("value", DataType::Number)],
                double,
            )
        };

        let mut registry = BrickTypeRegistry::empty().with_brick_type(double_type());
        assert_eq!(registry.len(), 1);
        assert!(registry.register(double_type()).is_some(), "re-registering replaces");
        assert_eq!(registry.len(), 1);

        let mut inputs = BoundInputs::new();
        inputs.insert("value", Value::Number(21.0));
        let output = registry
            .get("Double")
            .unwrap()
            .evaluate(&inputs, &ExecutionContext::new())
            .unwrap();
        assert_eq!(output.values.get("value"), Some(&Value::Number(42.0)));
    }

    #[test]
    fn test_list_instances_reads_context() {
        let context = customers_context();
        let output = evaluate(
            "ListInstancesByDBName",
            &[("database_name", Value::Text("Customers".to_string()))],
            &context,
        )
        .unwrap();
        match output.values.get("instances") {
            Some(Value::InstanceList(list)) => assert_eq!(list.len(), 2),
            other => panic!("Expected an instance list, got {:?}", other),
        }

        let missing = evaluate(
            "ListInstancesByDBName",
            &[("database_name", Value::Text("Orders".to_string()))],
            &context,
        );
        assert_eq!(
            missing.unwrap_err(),
            BrickFailure::DatabaseNotFound("Orders".to_string())
        );
    }

    #[test]
    fn test_get_first_instance_on_empty_list() {
        let result = evaluate(
            "GetFirstInstance",
            &[("instances", Value::InstanceList(vec![]))],
            &ExecutionContext::new(),
        );
        assert_eq!(result.unwrap_err(), BrickFailure::EmptyInstanceList);
    }

    #[test]
    fn test_filter_compares_rendered_values() {
        let context = customers_context();
        let all = context.instances("Customers").unwrap().to_vec();
        let output = evaluate(
            "FilterInstancesByAttribute",
            &[
                ("instances", Value::InstanceList(all)),
                ("attribute", Value::Text("age".to_string())),
                ("value", Value::Text("45".to_string())),
            ],
            &context,
        )
        .unwrap();
        match output.values.get("instances") {
            Some(Value::InstanceList(list)) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].id, InstanceId(11));
            }
            other => panic!("Expected an instance list, got {:?}", other),
        }
    }

    #[test]
    fn test_get_attribute_value_missing_attribute() {
        let context = customers_context();
        let ada = context.instances("Customers").unwrap()[0].clone();
        let result = evaluate(
            "GetAttributeValue",
            &[
                ("instance", Value::Instance(ada)),
                ("attribute", Value::Text("email".to_string())),
            ],
            &context,
        );
        assert_eq!(
            result.unwrap_err(),
            BrickFailure::MissingAttribute("email".to_string())
        );
    }

    #[test]
    fn test_text_bricks() {
        let context = ExecutionContext::new();
        let concat = evaluate(
            "ConcatText",
            &[
                ("left", Value::Text("foo".to_string())),
                ("right", Value::Text("bar".to_string())),
            ],
            &context,
        )
        .unwrap();
        assert_eq!(concat.values.get("text"), Some(&Value::Text("foobar".to_string())));

        let number = evaluate("NumberToText", &[("value", Value::Number(3.0))], &context).unwrap();
        assert_eq!(number.values.get("text"), Some(&Value::Text("3".to_string())));

        let fraction =
            evaluate("NumberToText", &[("value", Value::Number(2.5))], &context).unwrap();
        assert_eq!(fraction.values.get("text"), Some(&Value::Text("2.5".to_string())));
    }

    #[test]
    fn test_large_numbers_render_exactly() {
        let context = ExecutionContext::new();
        let render = |n: f64| {
            evaluate("NumberToText", &[("value", Value::Number(n))], &context)
                .unwrap()
                .values
                .get("text")
                .cloned()
        };

        let rendered = |s: &str| Some(Value::Text(s.to_string()));
        assert_eq!(render(1e20), rendered("100000000000000000000"));
        assert_eq!(render(-2e19), rendered("-20000000000000000000"));
        assert_eq!(render(9007199254740991.0), rendered("9007199254740991"));
        assert_eq!(render(-0.0), rendered("0"));

        let logged = evaluate("LogNumber", &[("value", Value::Number(1e20))], &context).unwrap();
        assert_eq!(logged.console, vec!["100000000000000000000".to_string()]);
    }

    #[test]
    fn test_filter_does_not_match_saturated_numbers() {
        let context = ExecutionContext::new();
        let huge = Instance {
            id: InstanceId(1),
            database: "Stars".to_string(),
            values: [("mass".to_string(), ConfigValue::Number(1e20))].into_iter().collect(),
        };
        let filter = |value: &str| {
            let output = evaluate(
                "FilterInstancesByAttribute",
                &[
                    ("instances", Value::InstanceList(vec![huge.clone()])),
                    ("attribute", Value::Text("mass".to_string())),
                    ("value", Value::Text(value.to_string())),
                ],
                &context,
            )
            .unwrap();
            match output.values.get("instances") {
                Some(Value::InstanceList(list)) => list.len(),
                other => panic!("Expected an instance list, got {:?}", other),
            }
        };

        assert_eq!(filter("9223372036854775807"), 0);
        assert_eq!(filter("100000000000000000000"), 1);
    }

    #[test]
    fn test_log_bricks_write_console_lines() {
        let context = customers_context();
        let all = context.instances("Customers").unwrap().to_vec();

        let listed = evaluate(
            "LogListOfInstances",
            &[("instances", Value::InstanceList(all))],
            &context,
        )
        .unwrap();
        assert_eq!(
            listed.console,
            vec![
                "Customers#10 {age: 31, name: \"Ada\"}".to_string(),
                "Customers#11 {age: 45, name: \"Grace\"}".to_string(),
            ]
        );
        assert!(listed.values.is_empty());

        let text =
            evaluate("LogText", &[("message", Value::Text("hi".to_string()))], &context).unwrap();
        assert_eq!(text.console, vec!["hi".to_string()]);
    }

    #[test]
    fn test_bound_inputs_reject_wrong_type() {
        let mut inputs = BoundInputs::new();
        inputs.insert("value", Value::Text("not a number".to_string()));
        assert_eq!(
            inputs.number("value").unwrap_err(),
            BrickFailure::InputUnavailable("value".to_string())
        );
        assert_eq!(
            inputs.text("other").unwrap_err(),
            BrickFailure::InputUnavailable("other".to_string())
        );
        assert_eq!(inputs.text("value").unwrap(), "not a number");
    }
}
