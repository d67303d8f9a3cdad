//! Table output for list-style commands
//!
//! One table value renders to every row-oriented output format. JSON is
//! produced by the commands themselves from their serde types.

use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;

/// Rows of string cells under fixed headers
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Render for `format`; `Json` falls back to TSV
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Auto => self.build(|cell| cell.to_string()).with(Style::rounded()).to_string(),
            OutputFormat::Md => self
                .build(|cell| cell.replace('|', "\\|"))
                .with(Style::markdown())
                .to_string(),
            OutputFormat::Csv => self.render_csv(),
            OutputFormat::Tsv | OutputFormat::Json => self.render_tsv(),
        }
    }

    fn build(&self, cell: impl Fn(&str) -> String) -> tabled::Table {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|h| cell(h)));
        for row in &self.rows {
            builder.push_record(row.iter().map(|c| cell(c)));
        }
        builder.build()
    }

    fn render_tsv(&self) -> String {
        let mut out = self.headers.join("\t");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }

    fn render_csv(&self) -> String {
        let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
        // Writing into a Vec<u8> cannot fail
        let _ = wtr.write_record(&self.headers);
        for row in &self.rows {
            let _ = wtr.write_record(row);
        }
        wtr.into_inner()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

/// Print a table followed by an optional summary line on stderr
pub fn print_table(table: &Table, format: OutputFormat, noun: &str, quiet: bool) {
    let rendered = table.render(format);
    print!("{}", rendered);
    if !rendered.ends_with('\n') {
        println!();
    }

    if format == OutputFormat::Auto && !quiet {
        eprintln!(
            "{}",
            style(format!("{} {}(s)", table.len(), noun)).dim()
        );
    }
}
