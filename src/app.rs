use std::collections::HashSet;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{info, warn};

use crate::classify::PathogenClassifier;
use crate::domain::{RunRecord, TaxonContext, TaxonId};
use crate::ena::EnaClient;
use crate::error::PathogenError;
use crate::rdf::Converter;
use crate::sink::OutputSink;
use crate::template::{SchemaTemplate, populate};
use crate::uniprot::TaxonomyClient;
use crate::validity::{is_valid_text, valid_value};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub row_limit: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Written,
    Overwritten,
    Planned,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowResult {
    pub index: usize,
    pub run_accession: Option<String>,
    pub action: RowAction,
    pub path: Option<String>,
    pub triples: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaxonResult {
    pub taxon_id: String,
    pub pathogen_name: String,
    pub pathogen_class: String,
    pub rows: Vec<RowResult>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub taxa: usize,
    pub rows: usize,
    pub written: usize,
    pub overwritten: usize,
    pub planned: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub started_at: String,
    pub output_dir: String,
    pub dry_run: bool,
    pub taxa: Vec<TaxonResult>,
    pub summary: BatchSummary,
}

impl BatchResult {
    fn new(output: &OutputSink, dry_run: bool) -> Self {
        Self {
            started_at: chrono::Utc::now().to_rfc3339(),
            output_dir: output.root().to_string(),
            dry_run,
            taxa: Vec::new(),
            summary: BatchSummary::default(),
        }
    }

    fn push(&mut self, taxon: TaxonResult) {
        self.summary.taxa += 1;
        for row in &taxon.rows {
            self.summary.rows += 1;
            match row.action {
                RowAction::Written => self.summary.written += 1,
                RowAction::Overwritten => self.summary.overwritten += 1,
                RowAction::Planned => self.summary.planned += 1,
                RowAction::Failed => self.summary.failed += 1,
            }
        }
        self.taxa.push(taxon);
    }

    pub fn failures(&self) -> impl Iterator<Item = (&TaxonResult, &RowResult)> {
        self.taxa.iter().flat_map(|taxon| {
            taxon
                .rows
                .iter()
                .filter(|row| row.action == RowAction::Failed)
                .map(move |row| (taxon, row))
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

fn emit(sink: &dyn ProgressSink, message: String, elapsed: Option<Duration>) {
    sink.event(ProgressEvent { message, elapsed });
}

/// Rows to files: populate, convert, write. Needs no upstream service.
#[derive(Debug, Clone)]
pub struct RowPipeline {
    template: SchemaTemplate,
    converter: Converter,
}

impl RowPipeline {
    pub fn new(template: SchemaTemplate, converter: Converter) -> Self {
        Self {
            template,
            converter,
        }
    }

    pub fn template(&self) -> &SchemaTemplate {
        &self.template
    }

    /// Canonical N-Triples for one row. Skolem IRIs are scoped by
    /// `run_accession`.
    pub fn render(
        &self,
        context: &TaxonContext,
        row: &RunRecord,
        run_accession: &str,
    ) -> Result<String, PathogenError> {
        let document = populate(&self.template, context, row).to_json()?;
        self.converter.convert(&document, run_accession)
    }

    /// Converts `rows` of one taxon. Row failures are recorded, not returned.
    pub fn process_rows(
        &self,
        context: &TaxonContext,
        rows: &[RunRecord],
        options: &BatchOptions,
        output: &OutputSink,
        sink: &dyn ProgressSink,
    ) -> TaxonResult {
        let mut written = HashSet::new();
        self.process_rows_tracked(context, rows, options, output, sink, &mut written)
    }

    fn process_rows_tracked(
        &self,
        context: &TaxonContext,
        rows: &[RunRecord],
        options: &BatchOptions,
        output: &OutputSink,
        sink: &dyn ProgressSink,
        written: &mut HashSet<Utf8PathBuf>,
    ) -> TaxonResult {
        let mut results = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let result = match self.process_row(context, index, row, options, output, written) {
                Ok(result) => result,
                Err(err) => {
                    warn!(taxon = %context.taxon_id, index, error = %err, "row.failed");
                    emit(
                        sink,
                        format!("row.failed taxon={} index={index}: {err}", context.taxon_id),
                        None,
                    );
                    RowResult {
                        index,
                        run_accession: row.run_accession.clone(),
                        action: RowAction::Failed,
                        path: None,
                        triples: 0,
                        error: Some(err.to_string()),
                    }
                }
            };
            results.push(result);
        }
        TaxonResult {
            taxon_id: context.taxon_id.to_string(),
            pathogen_name: context.pathogen_name.clone(),
            pathogen_class: context.pathogen_class.to_string(),
            rows: results,
        }
    }

    fn process_row(
        &self,
        context: &TaxonContext,
        index: usize,
        row: &RunRecord,
        options: &BatchOptions,
        output: &OutputSink,
        written: &mut HashSet<Utf8PathBuf>,
    ) -> Result<RowResult, PathogenError> {
        let run_accession = valid_value(row.run_accession.as_deref())
            .map(str::trim)
            .ok_or_else(|| PathogenError::MissingRunAccession {
                taxon: context.taxon_id.to_string(),
                index,
            })?;
        let path = output.path_for(run_accession)?;
        let triples = self.render(context, row, run_accession)?;
        let count = triples.lines().count();

        if !written.insert(path.clone()) {
            warn!(run_accession, path = %path, "row.duplicate_accession");
        }

        let action = if options.dry_run {
            RowAction::Planned
        } else {
            let existed = output.exists(&path);
            output.write_atomic(&path, triples.as_bytes())?;
            if existed {
                warn!(run_accession, path = %path, "row.overwrite");
                RowAction::Overwritten
            } else {
                RowAction::Written
            }
        };
        info!(run_accession, triples = count, path = %path, "row.converted");

        Ok(RowResult {
            index,
            run_accession: Some(run_accession.to_string()),
            action,
            path: Some(path.to_string()),
            triples: count,
            error: None,
        })
    }
}

#[derive(Clone)]
pub struct App<E: EnaClient, T: TaxonomyClient, C: PathogenClassifier> {
    ena: E,
    taxonomy: T,
    classifier: C,
    pipeline: RowPipeline,
}

impl<E: EnaClient, T: TaxonomyClient, C: PathogenClassifier> App<E, T, C> {
    pub fn new(ena: E, taxonomy: T, classifier: C, pipeline: RowPipeline) -> Self {
        Self {
            ena,
            taxonomy,
            classifier,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &RowPipeline {
        &self.pipeline
    }

    /// Scientific name, then class. An unusable name is replaced by
    /// `taxon:<id>` for classification only.
    pub fn resolve_taxon(
        &self,
        taxon: &TaxonId,
        sink: &dyn ProgressSink,
    ) -> Result<TaxonContext, PathogenError> {
        emit(sink, format!("phase=Resolve; taxon {taxon}"), None);
        let start = Instant::now();
        let pathogen_name = self.taxonomy.scientific_name(taxon)?;
        let query = if is_valid_text(&pathogen_name) {
            pathogen_name.clone()
        } else {
            warn!(%taxon, "taxon.no_scientific_name");
            format!("taxon:{taxon}")
        };
        let pathogen_class = self.classifier.classify(&query)?;
        info!(%taxon, name = %pathogen_name, class = %pathogen_class, "taxon.resolved");
        emit(
            sink,
            format!("taxon.resolved {taxon} name={pathogen_name:?} class={pathogen_class}"),
            Some(start.elapsed()),
        );
        Ok(TaxonContext::new(taxon.clone(), pathogen_name, pathogen_class))
    }

    /// Processes taxa in order. Transport errors abort the batch; row errors
    /// are collected in the result.
    pub fn run_batch(
        &self,
        taxa: &[TaxonId],
        options: &BatchOptions,
        output: &OutputSink,
        sink: &dyn ProgressSink,
    ) -> Result<BatchResult, PathogenError> {
        let mut result = BatchResult::new(output, options.dry_run);
        if !options.dry_run {
            output.ensure_root()?;
        }
        let mut written = HashSet::new();

        for taxon in taxa {
            let context = self.resolve_taxon(taxon, sink)?;

            emit(sink, format!("phase=Fetch; ena read_run {taxon}"), None);
            let start = Instant::now();
            let rows = self.ena.fetch_runs(taxon, options.row_limit)?;
            info!(%taxon, rows = rows.len(), "ena.rows");
            emit(
                sink,
                format!("ena.response rows={}", rows.len()),
                Some(start.elapsed()),
            );

            emit(sink, format!("phase=Convert; {} rows", rows.len()), None);
            let taxon_result = self.pipeline.process_rows_tracked(
                &context,
                &rows,
                options,
                output,
                sink,
                &mut written,
            );
            result.push(taxon_result);
        }

        Ok(result)
    }
}

/// Offline conversion of already-fetched rows for a known taxon.
pub fn convert_rows(
    pipeline: &RowPipeline,
    context: &TaxonContext,
    rows: &[RunRecord],
    options: &BatchOptions,
    output: &OutputSink,
    sink: &dyn ProgressSink,
) -> Result<BatchResult, PathogenError> {
    let mut result = BatchResult::new(output, options.dry_run);
    if !options.dry_run {
        output.ensure_root()?;
    }
    emit(sink, format!("phase=Convert; {} rows", rows.len()), None);
    result.push(pipeline.process_rows(context, rows, options, output, sink));
    Ok(result)
}
