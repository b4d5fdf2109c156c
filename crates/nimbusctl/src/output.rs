//! Response rendering for the terminal.

use clap::ValueEnum;
use serde::Serialize;

/// Output format selected with `--output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Render a serializable value as a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(out)
}

/// Render a value and print it to stdout.
pub fn write_out<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(value, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        id: String,
        name: String,
    }

    #[test]
    fn test_render_json() {
        let row = Row {
            id: "p1".to_string(),
            name: "main-db".to_string(),
        };
        let out = render(&row, OutputFormat::Json).unwrap();
        assert!(out.contains("\"id\": \"p1\""));
        assert!(out.contains("\"name\": \"main-db\""));
    }

    #[test]
    fn test_render_yaml() {
        let row = Row {
            id: "p1".to_string(),
            name: "main-db".to_string(),
        };
        let out = render(&row, OutputFormat::Yaml).unwrap();
        assert!(out.contains("id: p1"));
        assert!(out.contains("name: main-db"));
    }

    #[test]
    fn test_render_list() {
        let rows = vec![
            Row {
                id: "a".to_string(),
                name: "one".to_string(),
            },
            Row {
                id: "b".to_string(),
                name: "two".to_string(),
            },
        ];
        let out = render(&rows, OutputFormat::Json).unwrap();
        assert!(out.starts_with('['));
        assert!(out.contains("two"));
    }
}
