use aidbox_core::Node;
use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", pretty(value)),
        OutputFormat::Table => {
            let rt = value
                .get("resourceType")
                .and_then(Value::as_str)
                .unwrap_or("Resource");
            let id = value.get("id").and_then(Value::as_str).unwrap_or("-");
            println!("{} {}/{}", "Resource:".cyan(), rt.cyan(), id.cyan());
            println!("{}", pretty(value));
        }
    }
}

pub fn print_resource(resource: &Node, format: OutputFormat) {
    print_value(&resource.to_json(), format);
}

pub fn print_resources(resources: &[Node], total: Option<u64>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let items: Vec<Value> = resources.iter().map(Node::to_json).collect();
            println!("{}", pretty(&Value::Array(items)));
        }
        OutputFormat::Table => {
            if resources.is_empty() {
                println!("No resources found.");
                return;
            }
            let mut builder = Builder::default();
            builder.push_record(["ID", "ResourceType", "LastUpdated"]);
            for row in resources.iter().map(summary_row) {
                builder.push_record(row);
            }
            let table = builder.build().with(Style::rounded()).to_string();
            println!("{table}");
            if let Some(total) = total {
                println!("Total: {total}");
            }
        }
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn summary_row(resource: &Node) -> [String; 3] {
    let last_updated = resource
        .get("meta")
        .and_then(|meta| meta.get("lastUpdated"))
        .and_then(|value| value.as_str())
        .unwrap_or("-");
    [
        resource.id().unwrap_or("-").to_string(),
        resource.resource_type().unwrap_or("-").to_string(),
        last_updated.to_string(),
    ]
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_row() {
        let patient = Node::from_json(json!({
            "resourceType": "Patient",
            "id": "p1",
            "meta": {"lastUpdated": "2024-01-01T00:00:00Z"}
        }))
        .unwrap();
        assert_eq!(
            summary_row(&patient),
            ["p1", "Patient", "2024-01-01T00:00:00Z"].map(String::from)
        );

        let blank = Node::new();
        assert_eq!(summary_row(&blank), ["-", "-", "-"].map(String::from));
    }
}
