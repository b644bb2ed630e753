use super::{BoundInputs, BrickOutput, BrickType, BrickTypeRegistry, PortSpec};
use crate::console::ConsoleFormatter;
use crate::error::BrickFailure;
use crate::executor::ExecutionContext;
use crate::value::{DataType, Value};

/// Declares the built-in brick types and the function registering them.
macro_rules! define_brick_types {
    ( $( (
        $name:expr,
        inputs: [ $( ($in_name:expr, $in_type:ident) ),* ],
        outputs: [ $( ($out_name:expr, $out_type:ident) ),* ],
        $eval:path
    ) ),* $(,)? ) => {
        /// Registers the built-in catalog into `registry`.
        pub fn register_default_brick_types(registry: &mut BrickTypeRegistry) {
            $(
                registry.register(BrickType::new(
                    $name,
                    vec![ $( PortSpec::required($in_name, DataType::$in_type) ),* ],
                    vec![ $( PortSpec::required($out_name, DataType::$out_type) ),* ],
                    $eval,
                ));
            )*
        }
    };
}

define_brick_types! {
    ("ListInstancesByDBName",
        inputs: [("database_name", Text)],
        outputs: [("instances", InstanceList)],
        list_instances_by_db_name),
    ("GetFirstInstance",
        inputs: [("instances", InstanceList)],
        outputs: [("instance", Instance)],
        get_first_instance),
    ("CountInstances",
        inputs: [("instances", InstanceList)],
        outputs: [("count", Number)],
        count_instances),
    ("FilterInstancesByAttribute",
        inputs: [("instances", InstanceList), ("attribute", Text), ("value", Text)],
        outputs: [("instances", InstanceList)],
        filter_instances_by_attribute),
    ("GetAttributeValue",
        inputs: [("instance", Instance), ("attribute", Text)],
        outputs: [("value", Text)],
        get_attribute_value),
    ("ConcatText",
        inputs: [("left", Text), ("right", Text)],
        outputs: [("text", Text)],
        concat_text),
    ("NumberToText",
        inputs: [("value", Number)],
        outputs: [("text", Text)],
        number_to_text),
    ("LogListOfInstances",
        inputs: [("instances", InstanceList)],
        outputs: [],
        log_list_of_instances),
    ("LogInstance",
        inputs: [("instance", Instance)],
        outputs: [],
        log_instance),
    ("LogText",
        inputs: [("message", Text)],
        outputs: [],
        log_text),
    ("LogNumber",
        inputs: [("value", Number)],
        outputs: [],
        log_number),
}

fn list_instances_by_db_name(
    inputs: &BoundInputs,
    context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let name = inputs.text("database_name")?;
    let instances = context
        .instances(name)
        .ok_or_else(|| BrickFailure::DatabaseNotFound(name.to_string()))?;
    Ok(BrickOutput::new().with_value("instances", Value::InstanceList(instances.to_vec())))
}

fn get_first_instance(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let first = inputs
        .instances("instances")?
        .first()
        .ok_or(BrickFailure::EmptyInstanceList)?;
    Ok(BrickOutput::new().with_value("instance", Value::Instance(first.clone())))
}

fn count_instances(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let count = inputs.instances("instances")?.len();
    Ok(BrickOutput::new().with_value("count", Value::Number(count as f64)))
}

fn filter_instances_by_attribute(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let attribute = inputs.text("attribute")?;
    let expected = inputs.text("value")?;
    let matching = inputs
        .instances("instances")?
        .iter()
        .filter(|instance| {
            instance
                .values
                .get(attribute)
                .is_some_and(|v| v.to_string() == expected)
        })
        .cloned()
        .collect();
    Ok(BrickOutput::new().with_value("instances", Value::InstanceList(matching)))
}

fn get_attribute_value(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let attribute = inputs.text("attribute")?;
    let value = inputs
        .instance("instance")?
        .values
        .get(attribute)
        .ok_or_else(|| BrickFailure::MissingAttribute(attribute.to_string()))?;
    Ok(BrickOutput::new().with_value("value", Value::Text(value.to_string())))
}

fn concat_text(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let text = format!("{}{}", inputs.text("left")?, inputs.text("right")?);
    Ok(BrickOutput::new().with_value("text", Value::Text(text)))
}

fn number_to_text(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let value = Value::Number(inputs.number("value")?);
    Ok(BrickOutput::new().with_value("text", Value::Text(value.to_string())))
}

fn log_list_of_instances(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let instances = inputs.instances("instances")?;
    let output = instances
        .iter()
        .fold(BrickOutput::new(), |output, instance| {
            output.with_line(ConsoleFormatter::format_instance(instance))
        });
    Ok(output)
}

fn log_instance(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let instance = inputs.instance("instance")?;
    Ok(BrickOutput::new().with_line(ConsoleFormatter::format_instance(instance)))
}

fn log_text(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    Ok(BrickOutput::new().with_line(inputs.text("message")?))
}

fn log_number(
    inputs: &BoundInputs,
    _context: &ExecutionContext,
) -> Result<BrickOutput, BrickFailure> {
    let value = Value::Number(inputs.number("value")?);
    Ok(BrickOutput::new().with_line(ConsoleFormatter::format_value(&value)))
}
