//! Review sink: where the annotator sees tables and answers prompts

use std::io::{self, BufRead, Write};

use hostrel_common::Result;

/// A table to show: headers, then rows of already-formatted cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSpec {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableSpec {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<S: ToString>(&mut self, cells: impl IntoIterator<Item = S>) {
        self.rows.push(cells.into_iter().map(|c| c.to_string()).collect());
    }

    /// Render as left-aligned fixed-width columns with a rule under the header
    pub fn render(&self) -> String {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; columns];
        for line in std::iter::once(&self.headers).chain(&self.rows) {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let format_line = |cells: &[String]| {
            let mut out = String::new();
            for (i, width) in widths.iter().enumerate() {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                if i + 1 == columns {
                    out.push_str(cell);
                } else {
                    out.push_str(&format!("{:<width$}  ", cell, width = width));
                }
            }
            out.trim_end().to_string()
        };

        let mut text = format_line(&self.headers);
        text.push('\n');
        text.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
        text.push('\n');
        for row in &self.rows {
            text.push_str(&format_line(row));
            text.push('\n');
        }
        text
    }
}

/// Output and input channel to the annotator
pub trait ReviewSink {
    fn show_table(&mut self, table: &TableSpec) -> Result<()>;

    fn show_line(&mut self, line: &str) -> Result<()>;

    /// Ask a question; `None` when the input is closed
    fn prompt(&mut self, question: &str) -> Result<Option<String>>;
}

/// Console sink over any reader/writer pair
pub struct ConsoleSink<R, W> {
    input: R,
    output: W,
}

impl ConsoleSink<io::StdinLock<'static>, io::Stdout> {
    /// Sink bound to the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleSink<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> ReviewSink for ConsoleSink<R, W> {
    fn show_table(&mut self, table: &TableSpec) -> Result<()> {
        self.output.write_all(table.render().as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    fn show_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(None);
        }
        Ok(Some(answer.trim_end_matches(['\r', '\n']).to_string()))
    }
}
