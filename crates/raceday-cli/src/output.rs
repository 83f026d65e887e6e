use raceday_core::responses::ActionResult;
use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// Print an action envelope; a failed action also fails the command.
pub fn report(result: &ActionResult, format: OutputFormat) -> anyhow::Result<()> {
    output(result, format)?;
    if result.success {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            result.error.clone().unwrap_or_else(|| "action failed".to_string())
        ))
    }
}
