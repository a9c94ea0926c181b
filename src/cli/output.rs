// Output formatting for CLI

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::cli::config::OutputFormat;

/// Format and output reports
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Output any serializable report
    pub fn output<T: Serialize>(&self, report: &T, writer: &mut impl Write) -> Result<()> {
        let value = serde_json::to_value(report)?;
        match self.format {
            OutputFormat::Pretty => {
                writeln!(writer, "{}", serde_json::to_string_pretty(&value)?)?;
            }
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(&value)?)?;
            }
            OutputFormat::Table => {
                self.output_table(&value, writer)?;
            }
        }
        Ok(())
    }

    /// Output as table, one row per element of an array
    fn output_table(&self, value: &serde_json::Value, writer: &mut impl Write) -> Result<()> {
        let rows: Vec<&serde_json::Map<String, serde_json::Value>> = match value {
            serde_json::Value::Array(items) => items.iter().filter_map(|v| v.as_object()).collect(),
            serde_json::Value::Object(obj) => vec![obj],
            other => {
                writeln!(writer, "{}", self.format_value(other))?;
                return Ok(());
            }
        };
        let Some(first) = rows.first() else {
            return Ok(());
        };

        let columns: Vec<&String> = first.keys().collect();
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(*c).map(|v| self.format_value(v)).unwrap_or_default())
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| cells.iter().map(|r| r[i].len()).chain([c.len()]).max().unwrap_or(0))
            .collect();

        let header: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = w))
            .collect();
        writeln!(writer, "{}", header.join("  ").trim_end())?;
        writeln!(writer, "{}", "=".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)))?;
        for row in cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:<width$}", v, width = w))
                .collect();
            writeln!(writer, "{}", line.join("  ").trim_end())?;
        }
        Ok(())
    }

    /// Format a JSON value for display
    fn format_value(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => "-".to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Array(arr) => format!("[{} items]", arr.len()),
            serde_json::Value::Object(_) => "{...}".to_string(),
        }
    }

    /// Print a problem with one file, unless quiet
    pub fn print_error(&self, msg: &str) {
        if !self.quiet {
            eprintln!("✗ {}", msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        sid: String,
        size: usize,
        eos: bool,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { sid: "0x00000001".into(), size: 30, eos: false },
            Row { sid: "0x00000001".into(), size: 4000, eos: true },
        ]
    }

    #[test]
    fn test_compact_json() {
        let mut out = Vec::new();
        OutputFormatter::new(OutputFormat::Json, false)
            .output(&rows()[0], &mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"eos\":false,\"sid\":\"0x00000001\",\"size\":30}\n"
        );
    }

    #[test]
    fn test_table() {
        let mut out = Vec::new();
        OutputFormatter::new(OutputFormat::Table, false)
            .output(&rows(), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "eos    sid         size");
        assert_eq!(lines[2], "false  0x00000001  30");
        assert_eq!(lines[3], "true   0x00000001  4000");
    }
}
