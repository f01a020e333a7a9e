//! Sheet Merger command line
//!
//! Usage:
//!   sheet-merger template set report.xlsx
//!   sheet-merger fill --source data.csv --map "Name=full_name" --map "Amount=total"
//!   sheet-merger merge --source data.xlsx --mapping monthly --join outer

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use sheet_merger::loader;
use sheet_merger::ColumnMapping;
use sheet_merger::Config;
use sheet_merger::JoinMode;
use sheet_merger::Session;
use sheet_merger::Source;
use sheet_merger::Table;
use sheet_merger::Workspace;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sheet-merger")]
#[command(about = "Fill a spreadsheet template from another file, or merge the two on key columns")]
#[command(version)]
struct Cli {
    /// Workspace directory holding data/ and mappings/
    #[arg(long, env = sheet_merger::config::ENV_HOME, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the persisted template
    #[command(subcommand)]
    Template(TemplateCommand),

    /// List the sheets of a workbook
    Sheets {
        /// Workbook path or file:// url
        file: String,
    },

    /// Manage saved column mappings
    #[command(subcommand)]
    Mapping(MappingCommand),

    /// Show sample values for each mapped column pair
    Preview(RunArgs),

    /// Fill the template from a source file by row position
    Fill(RunArgs),

    /// Join the template with a source file on the merge keys
    Merge {
        #[command(flatten)]
        run: RunArgs,

        /// inner, left, right or outer [env: SHEET_MERGER_JOIN]
        #[arg(long)]
        join: Option<JoinMode>,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    /// Install a workbook as the template
    Set { file: String },
    /// Remove the template
    Clear,
    /// Show where the template is and which sheets it has
    Status,
}

#[derive(Subcommand, Debug)]
enum MappingCommand {
    /// List saved mappings
    List,
    /// Print a saved mapping
    Show { name: String },
    /// Save a mapping
    Save {
        name: String,
        #[command(flatten)]
        columns: MappingArgs,
    },
}

#[derive(Args, Debug)]
struct MappingArgs {
    /// Template column mapped to a source column, as TEMPLATE=SOURCE
    #[arg(long = "map", value_parser = parse_pair)]
    pairs: Vec<(String, String)>,

    /// Template column used as a merge key
    #[arg(long = "key")]
    keys: Vec<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Source file (.csv, .xlsx or .xlsm)
    #[arg(long)]
    source: String,

    /// Sheet of the source workbook, defaults to the first one
    #[arg(long)]
    source_sheet: Option<String>,

    /// Sheet of the template, defaults to the first one
    #[arg(long)]
    template_sheet: Option<String>,

    /// Saved mapping to use instead of --map/--key
    #[arg(long, conflicts_with_all = ["pairs", "keys"])]
    mapping: Option<String>,

    #[command(flatten)]
    columns: MappingArgs,

    /// Keep the template's first column instead of renumbering it [env: SHEET_MERGER_RENUMBER]
    #[arg(long)]
    no_renumber: bool,

    /// Output workbook, defaults to the configured output file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((template, source)) if !template.trim().is_empty() && !source.trim().is_empty() => {
            Ok((template.trim().to_owned(), source.trim().to_owned()))
        }
        _ => Err(format!("expected TEMPLATE=SOURCE, got '{raw}'")),
    }
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(home) = cli.home {
        config.home = home;
    }
    run(Workspace::new(config), cli.command)
}

fn run(workspace: Workspace, command: Command) -> Result<()> {
    let mut session = Session::new();
    match command {
        Command::Template(TemplateCommand::Set { file }) => {
            let source = Source::parse(&file)?;
            let bytes = source.read_all().with_context(|| format!("reading {file}"))?;
            let path = workspace.install_template(&bytes, &mut session)?;
            println!("Template saved to {}", path.display());
        }
        Command::Template(TemplateCommand::Clear) => {
            if workspace.remove_template(&mut session)? {
                println!("Template removed");
            } else {
                println!("No template to remove");
            }
        }
        Command::Template(TemplateCommand::Status) => {
            let source = workspace.template_source()?;
            println!("Template: {}", source.name());
            for name in loader::sheet_names(&source)? {
                println!("  {name}");
            }
        }
        Command::Sheets { file } => {
            for name in loader::sheet_names(&Source::parse(&file)?)? {
                println!("{name}");
            }
        }
        Command::Mapping(MappingCommand::List) => {
            for name in workspace.mappings().list()? {
                println!("{name}");
            }
        }
        Command::Mapping(MappingCommand::Show { name }) => {
            let saved = workspace.mappings().load(&name)?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        Command::Mapping(MappingCommand::Save { name, columns }) => {
            session.confirm(columns.mapping(), columns.keys)?;
            let path = session.save(workspace.mappings(), &name)?;
            println!("Mapping saved to {}", path.display());
        }
        Command::Preview(args) => {
            let (template, source) = load_tables(&workspace, &args)?;
            let mapping = resolve_mapping(&workspace, &args, &mut session)?;
            let preview = sheet_merger::preview(&template, &source, &mapping);
            println!("Template rows: {}, source rows: {}", preview.template_rows, preview.source_rows);
            for sample in preview.samples {
                println!(
                    "{} -> {}: '{}' -> '{}'",
                    sample.template_column, sample.source_column, sample.template_value, sample.source_value
                );
            }
        }
        Command::Fill(args) => {
            let (template, source) = load_tables(&workspace, &args)?;
            resolve_mapping(&workspace, &args, &mut session)?;
            let mut options = workspace.config().fill_options();
            if args.no_renumber {
                options.renumber_first_column = false;
            }
            let filled = session.fill(&template, &source, options)?;
            let path = workspace.write_filled(&filled, args.output.as_deref())?;
            println!("Filled {} rows into {}", filled.row_count(), path.display());
        }
        Command::Merge { run, join } => {
            let (template, source) = load_tables(&workspace, &run)?;
            resolve_mapping(&workspace, &run, &mut session)?;
            let mode = join.unwrap_or(workspace.config().join_mode);
            let merged = session.merge(&template, &source, mode)?;
            let path = workspace.write_merged(&merged, run.output.as_deref())?;
            println!("Merged {} rows ({mode} join) into {}", merged.row_count(), path.display());
        }
    }
    Ok(())
}

impl MappingArgs {
    fn mapping(&self) -> ColumnMapping {
        self.pairs.iter().cloned().collect()
    }
}

/// Loads the template and source tables named by the run arguments.
fn load_tables(workspace: &Workspace, args: &RunArgs) -> Result<(Table, Table)> {
    let template_source = workspace.template_source()?;
    let template_sheet = pick_sheet(&template_source, args.template_sheet.as_deref())?;
    let template = loader::load(&template_source, template_sheet.as_deref()).context("loading template")?;

    let source = Source::parse(&args.source)?;
    let source_sheet = pick_sheet(&source, args.source_sheet.as_deref())?;
    let table = loader::load(&source, source_sheet.as_deref()).with_context(|| format!("loading {}", args.source))?;
    Ok((template, table))
}

/// Uses the requested sheet, or the first sheet of a workbook.
fn pick_sheet(source: &Source, requested: Option<&str>) -> Result<Option<String>> {
    if let Some(sheet) = requested {
        return Ok(Some(sheet.to_owned()));
    }
    Ok(loader::sheet_names(source)?.into_iter().next())
}

/// Confirms the mapping given on the command line, or applies a saved one.
fn resolve_mapping(workspace: &Workspace, args: &RunArgs, session: &mut Session) -> Result<ColumnMapping> {
    match &args.mapping {
        Some(name) => session.apply(workspace.mappings().load(name)?),
        None if args.columns.pairs.is_empty() => bail!("pass --mapping NAME or at least one --map TEMPLATE=SOURCE"),
        None => session.confirm(args.columns.mapping(), args.columns.keys.to_owned())?,
    }
    Ok(session.column_mapping().to_owned())
}
