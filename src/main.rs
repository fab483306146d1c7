use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, Command};
use shipi18n::content::{ContentNode, count_keys, count_translatable_leaves};
use shipi18n::mt::{
    ClientConfig, LanguageOutput, MockMode, MockTranslator, TranslateOptions, TranslationInput,
    TranslationPipeline, TranslationResult,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("shipi18n")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate JSON / i18next resources and plain text into many languages")
        .arg(
            Arg::new("input")
                .help("Source JSON file, or the strings to translate with --text")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .short('t')
                .help("Target language codes, comma separated (e.g. es,fr,de)")
                .required(true)
                .value_delimiter(','),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .short('s')
                .help("Source language code")
                .default_value("en"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Directory for <locale>.json files")
                .default_value("locales"),
        )
        .arg(
            Arg::new("skip-key")
                .long("skip-key")
                .help("Exact key path to leave untranslated (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("skip-path")
                .long("skip-path")
                .help("Glob key path to leave untranslated, e.g. states.* (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock translator instead of the hosted service")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-placeholders")
                .long("no-placeholders")
                .help("Send interpolation tokens to the backend unprotected")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-plurals")
                .long("no-plurals")
                .help("Treat <key>_<category> keys as ordinary keys")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("i18next")
                .long("i18next")
                .help("Report i18next namespaces")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("text")
                .long("text")
                .help("Translate the positional arguments as plain strings")
                .action(ArgAction::SetTrue),
        )
}

fn strings(matches: &clap::ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn build_pipeline(use_mock: bool) -> Result<TranslationPipeline> {
    if use_mock {
        return Ok(TranslationPipeline::new(Arc::new(MockTranslator::new(
            MockMode::Suffix,
        ))));
    }
    let config = ClientConfig::from_env()
        .context("Hosted translation is not configured (or pass --mock)")?;
    TranslationPipeline::from_config(config).context("Failed to create translation client")
}

fn write_outputs(result: &TranslationResult, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    for (locale, output) in &result.languages {
        let LanguageOutput::Tree(tree) = output else {
            continue;
        };
        let path = output_dir.join(format!("{}.json", locale));
        let json = serde_json::to_string_pretty(tree)?;
        fs::write(&path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("✅ {} → {}", locale, path.display());
    }
    Ok(())
}

fn print_report(result: &TranslationResult) {
    for (locale, output) in &result.languages {
        if let LanguageOutput::Text(pairs) = output {
            println!("🌍 {}", locale);
            for pair in pairs {
                println!("   \"{}\" → \"{}\"", pair.original, pair.translated);
            }
        }
    }

    if result.skipped.count > 0 {
        println!("⏭️  Skipped {} key(s):", result.skipped.count);
        for key in &result.skipped.keys {
            println!("   {}", key);
        }
    }

    if !result.warnings.is_empty() {
        println!("⚠️  {} warning(s):", result.warnings.len());
        for warning in &result.warnings {
            let location = match (&warning.locale, &warning.key_path) {
                (Some(locale), Some(path)) => format!("[{}] {}: ", locale, path),
                (None, Some(path)) => format!("{}: ", path),
                _ => String::new(),
            };
            println!("   {}{}", location, warning.message);
        }
    }

    if let Some(info) = &result.namespace_info {
        if info.detected {
            println!("📦 Namespaces:");
            for namespace in &info.namespaces {
                println!("   {} ({} keys)", namespace.name, namespace.key_count);
            }
        } else {
            println!("📦 No namespaces detected");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    let inputs = strings(&matches, "input");
    let targets = strings(&matches, "target");
    let source = matches
        .get_one::<String>("source")
        .map(String::as_str)
        .unwrap_or("en");
    let output_dir = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("locales"));

    let options = TranslateOptions {
        preserve_placeholders: !matches.get_flag("no-placeholders"),
        enable_pluralization: !matches.get_flag("no-plurals"),
        skip_keys: strings(&matches, "skip-key"),
        skip_paths: strings(&matches, "skip-path"),
        detect_namespaces: matches.get_flag("i18next"),
    };

    let pipeline = build_pipeline(matches.get_flag("mock"))?;
    info!("Using {}", pipeline.provider_name());

    let result = if matches.get_flag("text") {
        pipeline
            .translate(&TranslationInput::Texts(inputs), source, &targets, &options)
            .await?
    } else {
        let [input] = inputs.as_slice() else {
            bail!("Expected exactly one input file (use --text for plain strings)");
        };
        let raw = fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?;
        let content = ContentNode::from_json_str(&raw)
            .with_context(|| format!("{} is not valid JSON", input))?;
        info!(
            "Loaded {}: {} keys, {} translatable strings",
            input,
            count_keys(&content),
            count_translatable_leaves(&content)
        );

        let result = pipeline
            .translate_json(&content, source, &targets, &options)
            .await?;
        write_outputs(&result, &output_dir)?;
        result
    };

    print_report(&result);
    Ok(())
}
