use std::io::{self, Write};

use serde::Serialize;

use crate::app::{BatchResult, ProgressEvent, ProgressSink, RowAction};
use crate::search::SearchExport;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_batch(result: &BatchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_search(result: &[SearchExport]) -> io::Result<()> {
        Self::print_json(&result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Progress lines on stderr for interactive use.
pub struct TextProgress;

impl ProgressSink for TextProgress {
    fn event(&self, event: ProgressEvent) {
        let mut stderr = io::stderr();
        let _ = match event.elapsed {
            Some(elapsed) => writeln!(
                stderr,
                "  {} ({} ms)",
                event.message,
                elapsed.as_millis()
            ),
            None => writeln!(stderr, "  {}", event.message),
        };
    }
}

pub fn print_batch_summary(result: &BatchResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    let summary = &result.summary;
    println!("{cyan}pathogen-rdf summary ({}){reset}", result.output_dir);
    println!("{green}written: {}{reset}", summary.written);
    if summary.overwritten > 0 {
        println!("{yellow}overwritten: {}{reset}", summary.overwritten);
    }
    if result.dry_run {
        println!("{cyan}planned (dry run): {}{reset}", summary.planned);
    }
    let failed_color = if summary.failed > 0 { red } else { green };
    println!("{failed_color}failed: {}{reset}", summary.failed);

    for taxon in &result.taxa {
        println!(
            "{cyan}taxon {} {} ({}){reset}",
            taxon.taxon_id, taxon.pathogen_name, taxon.pathogen_class
        );
        for row in &taxon.rows {
            let accession = row.run_accession.as_deref().unwrap_or("-");
            match row.action {
                RowAction::Failed => println!(
                    "{red}  x {accession}: {}{reset}",
                    row.error.as_deref().unwrap_or("unknown error")
                ),
                RowAction::Overwritten => println!(
                    "{yellow}  ~ {accession} -> {}{reset}",
                    row.path.as_deref().unwrap_or("")
                ),
                RowAction::Written | RowAction::Planned => println!(
                    "{green}  + {accession} -> {} ({} triples){reset}",
                    row.path.as_deref().unwrap_or(""),
                    row.triples
                ),
            }
        }
    }
}

pub fn print_search_summary(exports: &[SearchExport]) {
    for export in exports {
        println!(
            "{} -> {} ({} rows, {} failed categories)",
            export.query,
            export.path.display(),
            export.rows,
            export.failed_categories.len()
        );
    }
}
