use aidbox_core::{Reference, ReferenceTarget};
use anyhow::Result;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::output::print_value;

pub fn describe(reference: &str, display: Option<&str>, format: OutputFormat) -> Result<()> {
    let mut parsed = Reference::parse(reference)?;
    if let Some(display) = display {
        parsed = parsed.with_display(display);
    }

    if matches!(format, OutputFormat::Table) {
        match parsed.target() {
            Some(ReferenceTarget::Local { resource_type, id }) => {
                println!("{}: local", "Kind".cyan());
                println!("{}: {}", "Type".cyan(), resource_type);
                println!("{}: {}", "Id".cyan(), id);
            }
            Some(ReferenceTarget::External { url }) => {
                println!("{}: external", "Kind".cyan());
                println!("{}: {}", "Url".cyan(), url);
            }
            None => {}
        }
        if let Some(display) = parsed.display() {
            println!("{}: {}", "Display".cyan(), display);
        }
        return Ok(());
    }

    print_value(&parsed.to_json(), format);
    Ok(())
}
