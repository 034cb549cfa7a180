//! Terminal output for query results and errors.

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use fleetql_core::{Error, PageResult, SqlQuery};
use serde_json::Value;

/// Output format of the `query` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table with one column per document property.
    #[default]
    Table,
    /// Pretty printed page object.
    Json,
}

/// Print a page in the requested format.
pub fn print_page(page: &PageResult<Value>, offset: usize, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(page)?),
        OutputFormat::Table => {
            if page.content.is_empty() {
                println!("{}", "No results.".dimmed());
            } else {
                println!("{}", render_table(&page.content));
            }
            println!(
                "{}",
                format!(
                    "{} of {} matching (offset {})",
                    page.size, page.total, offset
                )
                .dimmed()
            );
        }
    }
    Ok(())
}

/// Render documents as a table, `id` first and other columns sorted.
#[must_use]
pub fn render_table(rows: &[Value]) -> Table {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        if let Some(object) = row.as_object() {
            for key in object.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }
    columns.sort_unstable();
    if let Some(pos) = columns.iter().position(|c| *c == "id") {
        columns.remove(pos);
        columns.insert(0, "id");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(columns.iter().map(|c| Cell::new(c).fg(Color::Cyan)));

    for row in rows {
        table.add_row(columns.iter().map(|col| {
            let value = match row.get(*col) {
                None | Some(Value::Null) => "-".to_string(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            Cell::new(value)
        }));
    }
    table
}

/// Print rendered SQL followed by its numbered parameters.
pub fn print_sql(sql: &SqlQuery) {
    println!("{}", sql.sql);
    for (i, param) in sql.params.iter().enumerate() {
        let value = serde_json::to_string(param).unwrap_or_default();
        println!("  {} {}", format!("${}", i + 1).cyan(), value);
    }
}

/// Explain a malformed query on stderr, pointing at the offending position.
pub fn explain_error(query: &str, err: &Error) {
    if let Error::MalformedQuery(parse) = err {
        let position = parse.position.min(query.len());
        eprintln!("  {query}");
        eprintln!("  {}{}", " ".repeat(position), "^".red().bold());
        if !parse.fragment.is_empty() {
            eprintln!("  {} {}", "near".dimmed(), parse.fragment.yellow());
        }
    }
}
