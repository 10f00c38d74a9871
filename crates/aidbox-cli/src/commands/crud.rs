use std::fs;
use std::io::{self, Read};

use aidbox_core::{Node, Reference, ReferenceTarget};
use aidbox_http::HttpClient;
use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::output::{print_resource, print_success};

/// Splits a local `Type/id` reference.
pub(crate) fn parse_reference(reference: &str) -> Result<(String, String)> {
    let parsed = Reference::parse(reference)?;
    match parsed.target() {
        Some(ReferenceTarget::Local { resource_type, id }) => {
            Ok((resource_type.to_string(), id.to_string()))
        }
        _ => anyhow::bail!("Invalid reference \"{reference}\". Expected format: ResourceType/id"),
    }
}

fn read_body(file: &Option<String>) -> Result<serde_json::Value> {
    let content = match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    serde_json::from_str(&content).context("Invalid JSON")
}

/// Builds the node to write, forcing its type (and id, for updates).
fn resource_from_body(
    body: serde_json::Value,
    resource_type: &str,
    id: Option<&str>,
) -> Result<Node> {
    let mut node = Node::from_json(body).context("Resource body must be a JSON object")?;
    if let Some(existing) = node.resource_type()
        && existing != resource_type
    {
        anyhow::bail!("Body is a {existing}, expected {resource_type}");
    }
    node.insert("resourceType", resource_type);
    match id {
        Some(id) => node.set_id(id),
        None => {
            node.remove("id");
        }
    }
    Ok(node)
}

pub async fn get(client: &HttpClient, reference: &str, format: OutputFormat) -> Result<()> {
    let (rt, id) = parse_reference(reference)?;
    let resource = client.read(&rt, &id).await?;
    print_resource(&resource, format);
    Ok(())
}

pub async fn create(
    client: &HttpClient,
    resource_type: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let mut resource = resource_from_body(read_body(file)?, resource_type, None)?;
    client.save(&mut resource).await?;
    let id = resource.id().unwrap_or("?");
    print_success(&format!("Created {}/{}", resource_type.cyan(), id.cyan()));
    print_resource(&resource, format);
    Ok(())
}

pub async fn update(
    client: &HttpClient,
    reference: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let (rt, id) = parse_reference(reference)?;
    let mut resource = resource_from_body(read_body(file)?, &rt, Some(&id))?;
    client.save(&mut resource).await?;
    print_success(&format!("Updated {}/{}", rt.cyan(), id.cyan()));
    print_resource(&resource, format);
    Ok(())
}

pub async fn delete(client: &HttpClient, reference: &str) -> Result<()> {
    let (rt, id) = parse_reference(reference)?;
    let resource = Node::resource(&rt)?.with("id", id.as_str());
    client.delete(&resource).await?;
    print_success(&format!("Deleted {}/{}", rt.cyan(), id.cyan()));
    Ok(())
}
