use anyhow::Result;
use kiln_core::configs::config_schema;

pub fn execute() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&config_schema())?);
    Ok(())
}
