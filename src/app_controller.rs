use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::app_config::Config;
use crate::chunker::Chunker;
use crate::dispatcher::{Dispatcher, JobProgress, ProgressSink};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::deepseek::DeepSeek;
use crate::reassembler::Reassembler;
use crate::tokenizer::{TokenCodec, estimate_tokens};
use crate::translator::{Translator, TranslatorOptions};
use std::time::Duration;

// @module: Application controller for document translation

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

/// Progress sink that drives an indicatif bar from chunk completions
struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    fn new(total_chunks: usize) -> Self {
        let bar = ProgressBar::new(total_chunks as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message("translating");
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

impl ProgressSink for ProgressBarSink {
    fn publish(&self, _job_id: &str, progress: &JobProgress) -> Result<()> {
        // Completions arrive out of order; the position only ever grows.
        self.bar.set_position(progress.completed_chunks as u64);
        Ok(())
    }
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    /// Run the main workflow: read the input document, translate it, and
    /// write the reassembled result
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_file: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<()> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_file.unwrap_or_else(|| {
            FileManager::generate_output_path(&input_file, &self.config.target_language)
        });
        if FileManager::file_exists(&output_path) && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(());
        }

        // Missing credentials abort here, before any chunk is dispatched.
        let api_key = self.config.resolve_api_key()?;

        let text = FileManager::read_to_string(&input_file)?;
        if text.trim().is_empty() {
            return Err(anyhow::anyhow!("Input file is empty: {:?}", input_file));
        }

        let source_lang = self.display_language(&self.config.source_language);
        let target_lang = self.display_language(&self.config.target_language);
        info!(
            "Translating {:?} ({} -> {})",
            input_file.file_name().unwrap_or_default(),
            source_lang,
            target_lang
        );

        let token_count = match TokenCodec::cl100k() {
            Some(codec) => codec.count(&text),
            None => estimate_tokens(&text),
        };

        let chunker = Chunker::new(self.config.chunking.chunk_size, self.config.chunking.context_size)
            .context("Invalid chunking configuration")?;
        let chunks = chunker.chunk(&text);
        info!("Split {} tokens into {} chunks", token_count, chunks.len());

        let provider = DeepSeek::new(
            api_key,
            self.config.translation.provider.endpoint.clone(),
            self.config.translation.provider.model.clone(),
            self.config.translation.provider.timeout_secs,
        );
        let translator = Translator::with_options(
            Arc::new(provider),
            TranslatorOptions {
                temperature: self.config.translation.common.temperature,
                max_tokens: self.config.translation.common.max_tokens,
                max_retries: self.config.translation.common.retry_count,
                retry_delay: Duration::from_secs(self.config.translation.common.retry_delay_secs),
            },
        );
        let dispatcher =
            Dispatcher::with_max_parallel(translator, self.config.translation.common.max_parallel);

        let progress_sink = Arc::new(ProgressBarSink::new(chunks.len()));
        let results = dispatcher
            .dispatch_all(
                &chunks,
                &source_lang,
                &target_lang,
                self.config.translation.common.instructions.as_deref(),
                progress_sink.clone(),
            )
            .await;
        progress_sink.finish();

        let failed: Vec<usize> = results.iter().filter(|r| r.failed).map(|r| r.id).collect();
        if !failed.is_empty() {
            warn!(
                "{} of {} chunks failed to translate; output will contain error markers",
                failed.len(),
                results.len()
            );
            let log_path = output_path.with_extension("log");
            let entry = format!(
                "{:?}: {} failed chunks (ids: {:?})",
                input_file.file_name().unwrap_or_default(),
                failed.len(),
                failed
            );
            if let Err(e) = FileManager::append_to_log_file(&log_path, &entry) {
                warn!("Could not write job log {:?}: {}", log_path, e);
            }
        }

        let final_text = Reassembler::default().join(&results);
        FileManager::write_to_file(&output_path, &final_text)?;

        info!(
            "Wrote translation to {:?} in {:.1}s",
            output_path,
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// English language name for prompts and logs, falling back to the code
    fn display_language(&self, code: &str) -> String {
        language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string())
    }
}
