use crate::executor::ExecutionResult;
use crate::value::{ConfigValue, Instance, Value};
use itertools::Itertools;

/// Formats values and instances into console lines.
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// One line per instance: `Customers#3 {age: 31, name: "Ada"}`.
    pub fn format_instance(instance: &Instance) -> String {
        let attributes = instance
            .values
            .iter()
            .map(|(name, value)| format!("{}: {}", name, Self::format_literal(value)))
            .join(", ");
        format!("{}#{} {{{}}}", instance.database, instance.id, attributes)
    }

    pub fn format_value(value: &Value) -> String {
        match value {
            Value::Instance(instance) => Self::format_instance(instance),
            Value::InstanceList(list) => {
                format!("[{}]", list.iter().map(Self::format_instance).join(", "))
            }
            other => other.to_string(),
        }
    }

    /// Text literals are quoted so that `"1"` and `1` stay distinguishable.
    fn format_literal(value: &ConfigValue) -> String {
        match value {
            ConfigValue::Text(s) => format!("{:?}", s),
            ConfigValue::Object(map) => format!(
                "{{{}}}",
                map.iter()
                    .map(|(k, v)| format!("{}: {}", k, Self::format_literal(v)))
                    .join(", ")
            ),
            other => other.to_string(),
        }
    }

    /// Renders a whole execution result, numbering each console line.
    pub fn format_result(result: &ExecutionResult) -> String {
        if !result.success {
            return "(execution failed, no console output)".to_string();
        }
        if result.console_output.is_empty() {
            return "(no console output)".to_string();
        }
        result
            .console_output
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>3} | {}", i + 1, line))
            .join("\n")
    }
}
