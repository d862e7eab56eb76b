// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document splitter — runs the page pipeline over every page of a source on a
// bounded pool of blocking workers and assembles the sections, in page order,
// into one output PDF.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use spaltwerk_core::error::{Result, SpaltwerkError};
use spaltwerk_core::{SplitConfig, SplitCount, SplitReport};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::pdf::{PageRenderer, PdfAssembler, open_source};
use crate::pipeline::PagePipeline;

/// Splits whole documents.
#[derive(Debug, Clone)]
pub struct DocumentSplitter {
    pipeline: Arc<PagePipeline>,
}

impl DocumentSplitter {
    pub fn new(config: SplitConfig) -> Result<Self> {
        Ok(Self {
            pipeline: Arc::new(PagePipeline::from_config(config)?),
        })
    }

    pub fn config(&self) -> &SplitConfig {
        self.pipeline.config()
    }

    /// Split the document at `input` and write the result to `output`.
    ///
    /// The output is written only if every page succeeds.
    #[instrument(skip(self, input, output), fields(
        input = %input.as_ref().display(),
        output = %output.as_ref().display()
    ))]
    pub async fn split(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        splits: SplitCount,
        batch_size: usize,
    ) -> Result<SplitReport> {
        let input = input.as_ref().to_path_buf();
        let max_page_pixels = self.config().max_page_pixels;
        let renderer = tokio::task::spawn_blocking(move || open_source(&input, max_page_pixels))
            .await
            .map_err(worker_error)??;

        let (report, mut assembler) = self
            .assemble(Arc::from(renderer), splits, batch_size)
            .await?;

        let output = output.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || assembler.save(&output))
            .await
            .map_err(worker_error)??;
        Ok(report)
    }

    /// Split the pages served by `renderer` and return the assembled PDF bytes.
    pub async fn split_with_renderer(
        &self,
        renderer: Arc<dyn PageRenderer>,
        splits: SplitCount,
        batch_size: usize,
    ) -> Result<(SplitReport, Vec<u8>)> {
        let (report, mut assembler) = self.assemble(renderer, splits, batch_size).await?;
        let bytes = assembler.to_bytes()?;
        Ok((report, bytes))
    }

    /// Process every page and append the sections in page order.
    ///
    /// At most `workers` pages are in flight. Handles are awaited oldest first,
    /// so a page's sections are appended only after every earlier page's.
    async fn assemble(
        &self,
        renderer: Arc<dyn PageRenderer>,
        splits: SplitCount,
        batch_size: usize,
    ) -> Result<(SplitReport, PdfAssembler)> {
        let page_count = renderer.page_count();
        let workers = worker_count(batch_size);
        info!(pages = page_count, workers, %splits, "Splitting document");

        let mut assembler = PdfAssembler::new();
        let mut in_flight: VecDeque<JoinHandle<Result<Vec<Vec<u8>>>>> =
            VecDeque::with_capacity(workers);
        let mut next_page = 0;

        while next_page < page_count || !in_flight.is_empty() {
            while next_page < page_count && in_flight.len() < workers {
                let pipeline = Arc::clone(&self.pipeline);
                let renderer = Arc::clone(&renderer);
                let page_index = next_page;
                in_flight.push_back(tokio::task::spawn_blocking(move || {
                    pipeline.process_page(renderer.as_ref(), page_index, splits)
                }));
                next_page += 1;
            }

            let Some(handle) = in_flight.pop_front() else {
                break;
            };
            // On error the remaining handles are dropped; their pages still run
            // to completion but nothing is appended or saved.
            let sections = handle.await.map_err(worker_error)??;
            for section in &sections {
                assembler.append_page(section)?;
            }
            debug!(appended = assembler.page_count(), "Page sections appended");
        }

        let report = SplitReport {
            input_pages: page_count,
            output_pages: assembler.page_count(),
            workers,
            splits,
        };
        info!(
            input_pages = report.input_pages,
            output_pages = report.output_pages,
            "Document split"
        );
        Ok((report, assembler))
    }
}

/// Pool size: `batch_size` capped at the available parallelism, at least 1.
pub fn worker_count(batch_size: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    batch_size.min(cores).max(1)
}

/// Split `input` into `output` from synchronous code.
pub fn split_document_blocking(
    config: SplitConfig,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    splits: SplitCount,
    batch_size: usize,
) -> Result<SplitReport> {
    let splitter = DocumentSplitter::new(config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(splitter.split(input, output, splits, batch_size))
}

fn worker_error(err: tokio::task::JoinError) -> SpaltwerkError {
    if err.is_panic() {
        SpaltwerkError::Worker(format!("page worker panicked: {err}"))
    } else {
        SpaltwerkError::Worker(format!("page worker cancelled: {err}"))
    }
}
