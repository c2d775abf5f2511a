//! High-level application orchestration layer.
//!
//! This module provides the CLI-facing `App` façade. It layers the
//! configuration, reads the message, runs the extraction pipeline through
//! `CredentialExtractor` and then renders either a structured report
//! (JSON/YAML), CSV, export artifacts on disk, or the styled summary.
//!
//! Major steps in `App::run`:
//!   1. Schema generation early-exit
//!   2. Config load (file, environment, CLI) and validation
//!   3. Input read (file or stdin)
//!   4. Pipeline execution (remote first when enabled)
//!   5. Rendering to stdout or writing artifacts to `--output-dir`
//!
//! Input and export failures are reported on stderr and turn into exit
//! code 1; everything else the pipeline recovers from on its own.

use std::fs;
use std::io;
use std::path::Path;

use crate::analysis::AnalysisOptions;
use crate::candidate::ClientContext;
use crate::cli::{Cli, Layout, OutputFormat};
use crate::config::Config;
use crate::errors::{CredSiftError, IoResultExt, Result};
use crate::export::{self, CsvExporter, JsonExporter, JsonLayout, RecordExporter};
use crate::facade::{CredentialAnalysis, CredentialExtractor};
use crate::format::RecordType;
use crate::structured_output::{ExtractionReport, InputSource};
use crate::styled_output::StyledFormatter;

/// Application façade.
pub struct App;

impl App {
    /// Execute the end-to-end extraction workflow.
    ///
    /// Returns: intended process exit code (0 = success, 1 = input/export error).
    pub async fn run(cli: &Cli) -> Result<i32> {
        if Self::maybe_print_schema(cli)? {
            return Ok(0);
        }

        let config = match Self::load_config(cli) {
            Ok(config) => config,
            Err(e) => return Ok(Self::fail(&e)),
        };

        let (text, source) = match Self::read_input(cli) {
            Ok(input) => input,
            Err(e) => return Ok(Self::fail(&e)),
        };

        let client = Self::client_context(cli);
        let opts = AnalysisOptions::with_threshold(cli.confidence_threshold)
            .include_context(cli.include_context);
        let extractor = CredentialExtractor::new(&config)?;

        let analysis = match extractor.analyze(&text, client.as_ref(), &opts).await {
            Ok(analysis) => analysis,
            Err(e) if e.is_blocking() => return Ok(Self::fail(&e)),
            Err(e) => return Err(e),
        };

        let rendered = match &cli.output_dir {
            Some(dir) => Self::write_artifacts(cli, &config, &analysis, Path::new(dir)),
            None => Self::render_stdout(cli, &config, &analysis, source),
        };
        match rendered {
            Ok(()) => Ok(0),
            Err(e) if e.is_blocking() => Ok(Self::fail(&e)),
            Err(e) => Err(e),
        }
    }

    fn fail(error: &CredSiftError) -> i32 {
        tracing::debug!(category = %error.category(), "run aborted");
        eprintln!("Error: {error}");
        1
    }
}

/// Helpers: schema, configuration, input
impl App {
    fn maybe_print_schema(cli: &Cli) -> Result<bool> {
        if cli.generate_schema {
            match ExtractionReport::generate_json_schema() {
                Ok(schema) => {
                    println!("{schema}");
                }
                Err(e) => {
                    eprintln!("Error generating JSON schema: {e}");
                }
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = match &cli.config {
            Some(path) => Config::from_file(path)?,
            None => Config::new(),
        };
        config.apply_env();
        config.merge_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn read_input(cli: &Cli) -> Result<(String, InputSource)> {
        match cli.input_path() {
            Some(path) => {
                let text = fs::read_to_string(path).with_path(path, "read")?;
                Ok((
                    text,
                    InputSource::File {
                        path: path.to_string(),
                    },
                ))
            }
            None => {
                let text = io::read_to_string(io::stdin()).with_path("<stdin>", "read")?;
                Ok((text, InputSource::Stdin))
            }
        }
    }

    fn client_context(cli: &Cli) -> Option<ClientContext> {
        let client = ClientContext::new(
            cli.client_name.clone(),
            cli.client_id.clone(),
            cli.ticket_id.clone(),
        );
        (!client.is_empty()).then_some(client)
    }

    fn json_layout(layout: Layout) -> JsonLayout {
        match layout {
            Layout::Flat => JsonLayout::Flat,
            Layout::Grouped => JsonLayout::Grouped,
            Layout::Categorized => JsonLayout::Categorized,
        }
    }
}

/// Rendering
impl App {
    fn render_stdout(
        cli: &Cli,
        config: &Config,
        analysis: &CredentialAnalysis,
        source: InputSource,
    ) -> Result<()> {
        match cli.format {
            OutputFormat::Text => StyledFormatter::new()
                .print_analysis(analysis)
                .with_path("<stdout>", "write"),
            OutputFormat::Json => {
                let report = ExtractionReport::from_analysis(analysis, source);
                let json = report
                    .to_json(config.output.pretty_json)
                    .map_err(|e| CredSiftError::internal(e.to_string()))?;
                println!("{json}");
                Ok(())
            }
            OutputFormat::Yaml => {
                let report = ExtractionReport::from_analysis(analysis, source);
                let yaml = report
                    .to_yaml()
                    .map_err(|e| CredSiftError::internal(e.to_string()))?;
                print!("{yaml}");
                Ok(())
            }
            OutputFormat::Csv => {
                let categories: Vec<RecordType> = match cli.category {
                    Some(category) => vec![category],
                    None => present_categories(analysis),
                };
                if categories.is_empty() {
                    return Err(CredSiftError::empty_export("csv"));
                }
                let blocks = categories
                    .into_iter()
                    .map(|category| CsvExporter::new(category).export(&analysis.records))
                    .collect::<Result<Vec<String>>>()?;
                print!("{}", blocks.join("\n"));
                Ok(())
            }
        }
    }

    fn write_artifacts(
        cli: &Cli,
        config: &Config,
        analysis: &CredentialAnalysis,
        dir: &Path,
    ) -> Result<()> {
        let written = match (cli.format, cli.category) {
            (OutputFormat::Csv, Some(category)) => vec![export::write_artifact(
                dir,
                &format!("credentials-{category}"),
                &CsvExporter::new(category),
                &analysis.records,
            )?],
            (OutputFormat::Csv, None) => export::write_csv_per_category(dir, &analysis.records)?,
            _ => {
                let exporter = JsonExporter::new(Self::json_layout(cli.layout))
                    .pretty(config.output.pretty_json)
                    .default_client_name(config.output.default_client_name.clone());
                vec![export::write_artifact(
                    dir,
                    "credentials",
                    &exporter,
                    &analysis.records,
                )?]
            }
        };
        for path in written {
            println!("{}", path.display());
        }
        Ok(())
    }
}

fn present_categories(analysis: &CredentialAnalysis) -> Vec<RecordType> {
    RecordType::ALL
        .into_iter()
        .filter(|t| analysis.records.iter().any(|r| r.record_type() == *t))
        .collect()
}
