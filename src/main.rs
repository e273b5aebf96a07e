use cfn_resolve::{process_json, process_yaml, Format, ProcessorOptions, PseudoParameters};
use clap::{ArgAction, Parser, ValueEnum};
use console::style;
use log::{debug, info};
use serde_json::Value;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Resolves CloudFormation intrinsic functions in a template
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Template file (.json, .template, .yaml or .yml)
    template: PathBuf,

    /// Output format, defaults to the format of the template
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Value for AWS::Region
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Value for AWS::AccountId
    #[arg(long)]
    account_id: Option<String>,

    /// Value for AWS::StackName
    #[arg(long)]
    stack_name: Option<String>,

    /// Value for AWS::StackId
    #[arg(long)]
    stack_id: Option<String>,

    /// Override a parameter default, as KEY=VALUE. Values for Number
    /// parameters are passed as numbers
    #[arg(short, long = "parameter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    parameters: Vec<(String, String)>,

    /// Evaluate Conditions so that Fn::If picks a branch
    #[arg(long)]
    evaluate_conditions: bool,

    /// Print the template without resolving anything
    #[arg(long)]
    no_process: bool,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Yaml => OutputFormat::Yaml,
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(args) {
        eprintln!("{} {}", style("✘").red(), style(err).red());
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let input_format = detect_format(&args.template)?;
    let options = processor_options(&args);
    debug!("{:?}", options);

    let data = std::fs::read(&args.template)
        .map_err(|e| format!("Failed to read {}: {}", args.template.display(), e))?;
    info!("Resolving {} as {:?}", args.template.display(), input_format);

    let processed = match input_format {
        Format::Json => process_json(&data, Some(&options))?,
        Format::Yaml => process_yaml(&data, Some(&options))?,
    };
    let document: Value = serde_json::from_slice(&processed)?;

    let output = match args.format.unwrap_or_else(|| input_format.into()) {
        OutputFormat::Json if args.compact => serde_json::to_string(&document)?,
        OutputFormat::Json => serde_json::to_string_pretty(&document)?,
        OutputFormat::Yaml => serde_yml::to_string(&document)?,
    };
    println!("{}", output.trim_end());

    Ok(())
}

fn detect_format(path: &Path) -> cfn_resolve::Result<Format> {
    Format::from_path(path).ok_or_else(|| cfn_resolve::Error::UnknownFormat(path.to_path_buf()))
}

fn processor_options(args: &Args) -> ProcessorOptions {
    let mut pseudo = PseudoParameters::default();
    if let Some(region) = &args.region {
        pseudo = pseudo.with_region(region);
    }
    if let Some(account_id) = &args.account_id {
        pseudo = pseudo.with_account_id(account_id);
    }
    if let Some(stack_name) = &args.stack_name {
        pseudo = pseudo.with_stack_name(stack_name);
    }
    if let Some(stack_id) = &args.stack_id {
        pseudo = pseudo.with_stack_id(stack_id);
    }

    args.parameters.iter().fold(
        ProcessorOptions::new()
            .with_pseudo_parameters(pseudo)
            .evaluate_conditions(args.evaluate_conditions)
            .no_process(args.no_process),
        |options, (key, value)| options.with_parameter(key, value.as_str()),
    )
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, found {:?}", s))
}
