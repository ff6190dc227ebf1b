mod cli;
mod generate;
mod optional;
mod paths;
mod report;
mod xsd;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{info, warn};
use thiserror::Error;

use cli::{Cli, Command, CoverageArgs, GenerateArgs, OptionalArgs, PairwiseArgs, SmtArgs};
use generate::smt::{extract_constraints, SmtEncoder};
use generate::{
    generate_candidates, select_snippets, BuilderConfig, CandidateBuilder, CandidateConfig,
    OptionalMode, OutputWriter, PairwiseConfig, PairwiseGenerator, SetCoverConfig,
};
use optional::{extract_optional_items, ExtractOptions};
use paths::enumerate_paths;
use report::{analyze_corpus, CoverageReport, DEFAULT_EXTERNAL_MARKERS};
use xsd::{load_schema, SchemaLoadError, SchemaModel};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Schema(#[from] SchemaLoadError),
    #[error("no XML files given")]
    EmptyCorpus,
    #[error("{count} XML file(s) could not be analyzed")]
    CorpusUnreadable { count: usize },
    #[error("schema declares no global element to use as a document root")]
    NoRootElement,
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Coverage(args) => run_coverage(args),
        Command::Generate(args) => run_generate(args),
        Command::Pairwise(args) => run_pairwise(args),
        Command::Optional(args) => run_optional(args),
        Command::Smt(args) => run_smt(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_coverage(args: CoverageArgs) -> Result<(), CliError> {
    if args.xml_files.is_empty() {
        return Err(CliError::EmptyCorpus);
    }
    let model = load_schema(&args.schema)?;
    let defined = enumerate_paths(&model, args.max_depth);
    info!(
        "schema defines {} element paths and {} attribute paths",
        defined.elements.len(),
        defined.attributes.len()
    );

    let used = analyze_corpus(&args.xml_files);
    info!(
        "corpus uses {} element paths and {} attribute paths across {} file(s)",
        used.elements.len(),
        used.attributes.len(),
        used.files_analyzed
    );

    let report = CoverageReport::new(&defined, &used, DEFAULT_EXTERNAL_MARKERS);
    let text = report.render();
    print!("{text}");

    if let Some(report_file) = &args.report_file {
        fs::write(report_file, &text).map_err(|e| CliError::Io {
            path: report_file.clone(),
            source: e,
        })?;
        info!("report written to {}", report_file.display());
    }

    if used.files_failed > 0 {
        return Err(CliError::CorpusUnreadable {
            count: used.files_failed,
        });
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let model = load_schema(&args.schema)?;
    let defined = enumerate_paths(&model, args.max_depth);
    info!(
        "schema defines {} coverage items",
        defined.elements.len() + defined.attributes.len()
    );

    let config = builder_config(&model, &args.schema, args.max_depth, args.namespace.clone());
    let builder = CandidateBuilder::new(&model, config);
    let candidates = generate_candidates(
        &model,
        &builder,
        &CandidateConfig {
            max_snippets: args.max_snippets,
            max_gen_depth: args.max_gen_depth,
        },
    );

    let universe = defined.all();
    let selection = select_snippets(
        &universe,
        &candidates,
        &SetCoverConfig {
            target_coverage: args.target_coverage,
            max_files: args.max_files,
            depth_penalty: args.depth_penalty,
        },
    );

    let writer = OutputWriter::new(&args.output, &args.prefix, true);
    let mut written = 0usize;
    for (number, index) in selection.chosen.iter().enumerate() {
        match writer.write_snippet(number + 1, &candidates[*index]) {
            Ok(_) => written += 1,
            Err(e) => warn!("skipping candidate {index}: {e}"),
        }
    }

    println!(
        "generated {written} file(s), {:.2}% path coverage ({}/{} items)",
        selection.coverage() * 100.0,
        selection.covered,
        selection.universe
    );
    Ok(())
}

fn run_pairwise(args: PairwiseArgs) -> Result<(), CliError> {
    let model = load_schema(&args.schema)?;
    if model.root_elements().is_empty() {
        return Err(CliError::NoRootElement);
    }

    let options = ExtractOptions {
        max_depth: args.max_depth,
        ..Default::default()
    };
    let optional = extract_optional_items(&model, &options);
    info!(
        "{} optional items ({} elements, {} attributes, {} choice groups)",
        optional.len(),
        optional.elements().len(),
        optional.attributes().len(),
        optional.choice_groups().len()
    );

    let generator = PairwiseGenerator::new(PairwiseConfig {
        max_patterns: args.max_patterns,
        candidates: args.candidates,
        random_seed: args.random_seed,
        max_parameters: args.max_parameters,
        ..Default::default()
    });
    let array = generator.generate(&optional);

    let config = builder_config(&model, &args.schema, args.max_depth, args.namespace.clone());
    let builder = CandidateBuilder::new(&model, config);
    let root = &model.root_elements()[0];
    let universe: HashSet<String> = array.parameters.iter().cloned().collect();
    let writer = OutputWriter::new(&args.output, &args.prefix, false);

    let mut written = 0usize;
    for pattern in &array.patterns {
        let included = pattern.included_paths();
        let mode = OptionalMode::Assignment {
            included: &included,
            universe: &universe,
        };
        let Some(snippet) = builder.build(root, args.max_depth, &mode, 0) else {
            warn!("skipping pattern {}: root is unbuildable", pattern.id);
            continue;
        };
        match writer.write_snippet(pattern.id, &snippet) {
            Ok(_) => written += 1,
            Err(e) => warn!("skipping pattern {}: {e}", pattern.id),
        }
    }

    println!(
        "generated {written} file(s), {:.2}% pair coverage over {} parameters",
        array.coverage * 100.0,
        array.parameters.len()
    );
    Ok(())
}

fn run_optional(args: OptionalArgs) -> Result<(), CliError> {
    let model = load_schema(&args.schema)?;
    let options = ExtractOptions {
        max_depth: args.max_depth,
        ..Default::default()
    };
    let optional = extract_optional_items(&model, &options);

    let rule = "=".repeat(80);
    println!("{rule}");
    println!("Optional item summary");
    println!("{rule}");
    println!("optional elements:   {}", optional.elements().len());
    println!("optional attributes: {}", optional.attributes().len());
    println!("choice groups:       {}", optional.choice_groups().len());
    println!("total items:         {}", optional.len());

    let groups = optional.choice_groups();
    if !groups.is_empty() {
        println!();
        println!("Choice groups");
        for (id, paths) in &groups {
            println!("  group {id}: {} alternative(s)", paths.len());
            for path in paths {
                println!("    - {path}");
            }
        }
    }

    print_top_items("Top optional elements", &optional.elements());
    print_top_items("Top optional attributes", &optional.attributes());
    Ok(())
}

fn print_top_items(title: &str, items: &[&optional::OptionalItem]) {
    if items.is_empty() {
        return;
    }
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.path.cmp(&b.path)));
    println!();
    println!("{title}");
    for item in sorted.iter().take(10) {
        println!("  [{}] {}", item.priority, item.path);
    }
}

fn run_smt(args: SmtArgs) -> Result<(), CliError> {
    let model = load_schema(&args.schema)?;
    let constraints = extract_constraints(&model, args.max_depth);
    let text = SmtEncoder::new(&constraints).to_smtlib();
    fs::write(&args.output, text).map_err(|e| CliError::Io {
        path: args.output.clone(),
        source: e,
    })?;
    println!(
        "wrote {} ({} path variables, {} choice groups)",
        args.output.display(),
        constraints.paths.len(),
        constraints.choice_groups.len()
    );
    Ok(())
}

/// Shared builder setup: the effective namespace is the explicit override or
/// the schema's target namespace, and the schema's file name becomes the
/// `xsi:schemaLocation` hint.
fn builder_config(
    model: &SchemaModel,
    schema_path: &Path,
    max_depth: u32,
    namespace: Option<String>,
) -> BuilderConfig {
    let namespace = namespace.or_else(|| model.target_namespace.clone());
    let schema_location = schema_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    BuilderConfig {
        max_depth,
        namespace,
        schema_location,
    }
}
