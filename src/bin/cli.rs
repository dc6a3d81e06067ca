use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, Args, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use turnover::export::exporter_for;
use turnover::prelude::*;

#[derive(Parser)]
#[command(name = "turnover")]
#[command(about = "Turnover CLI - Analyze employee terminations by tenure, age, reason and month", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter directive (e.g. info, debug, turnover=trace)
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Username, required when credentials are configured
    #[arg(long, global = true, env = "TURNOVER_USER")]
    user: Option<String>,
    /// Password, required when credentials are configured
    #[arg(long, global = true, env = "TURNOVER_PASS", hide_env_values = true)]
    password: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dataset statistics and the turnover overview
    Summary(SummaryArgs),
    /// Terminations per month and initiative
    Timeline(TimelineArgs),
    /// Tenure bucket x reason cross-tab
    RiskMatrix(RiskMatrixArgs),
    /// Terminations per age group and initiative
    AgeGroups(DataArgs),
    /// List the values each filter accepts
    Options(InputArgs),
    /// Build the full dashboard report
    Report(ReportArgs),
    /// Export filtered rows with derived columns
    Export(ExportArgs),
    /// Write an example file with the expected columns
    Template(TemplateArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Termination spreadsheet (.csv, .tsv, .txt, .xlsx, .xls, .ods)
    #[arg(short, long)]
    input: PathBuf,
    /// Field delimiter for text files (sniffed when omitted)
    #[arg(long)]
    delimiter: Option<char>,
    /// Sheet to read from workbooks
    #[arg(long)]
    sheet: Option<String>,
}

#[derive(Args)]
struct FilterArgs {
    /// Regional filter
    #[arg(long)]
    regional: Option<String>,
    /// Supervisor filter
    #[arg(long)]
    supervisor: Option<String>,
    /// Brand ("Bandeira") filter
    #[arg(long)]
    brand: Option<String>,
    /// Initiative filter (e.g. "Inic. Empregado")
    #[arg(long)]
    initiative: Option<String>,
    /// Termination reason filter
    #[arg(long)]
    reason: Option<String>,
}

impl FilterArgs {
    fn to_filter_set(&self) -> FilterSet {
        [
            (FilterDimension::Regional, &self.regional),
            (FilterDimension::Supervisor, &self.supervisor),
            (FilterDimension::Brand, &self.brand),
            (FilterDimension::Initiative, &self.initiative),
            (FilterDimension::Reason, &self.reason),
        ]
        .into_iter()
        .fold(FilterSet::new(), |filters, (dimension, value)| {
            filters.with(dimension, Selection::from_option(value.as_deref()))
        })
    }
}

#[derive(Args)]
struct DataArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Args)]
struct OverviewArgs {
    /// Evaluation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,
    /// Active headcount the turnover ratio is measured against
    #[arg(long)]
    headcount: Option<u32>,
}

#[derive(Args)]
struct SummaryArgs {
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    overview: OverviewArgs,
}

#[derive(Args)]
struct TimelineArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Show one MM/YYYY series per initiative instead of the combined timeline
    #[arg(long)]
    bars: bool,
}

#[derive(Args)]
struct RiskMatrixArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Print count, mean tenure and mean age for every cell
    #[arg(long)]
    detail: bool,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    overview: OverviewArgs,
    /// Output file; prints JSON to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = ExportFormatOpt::Json)]
    format: ExportFormatOpt,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
    /// Export format
    #[arg(long, value_enum, default_value_t = ExportFormatOpt::Csv)]
    format: ExportFormatOpt,
}

#[derive(Args)]
struct TemplateArgs {
    /// Output file path
    #[arg(short, long, default_value = "modelo_desligamentos.csv")]
    output: PathBuf,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ExportFormatOpt {
    Json,
    Jsonl,
    Csv,
}

impl From<ExportFormatOpt> for ExportFormat {
    fn from(opt: ExportFormatOpt) -> Self {
        match opt {
            ExportFormatOpt::Json => ExportFormat::Json,
            ExportFormatOpt::Jsonl => ExportFormat::JsonLines,
            ExportFormatOpt::Csv => ExportFormat::Csv,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<TurnoverError>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => TurnoverConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TurnoverConfig::load(),
    };
    setup_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

    if let Commands::Template(args) = &cli.command {
        return cmd_template(args);
    }

    let mut session = SessionContext::new(config.credentials.clone());
    if session.requires_login() {
        let user = cli.user.as_deref().unwrap_or_default();
        let password = cli.password.as_deref().unwrap_or_default();
        session.login(user, password)?;
    }
    session.require_authenticated()?;

    match cli.command {
        Commands::Summary(args) => cmd_summary(&config, args),
        Commands::Timeline(args) => cmd_timeline(&config, args),
        Commands::RiskMatrix(args) => cmd_risk_matrix(&config, args),
        Commands::AgeGroups(args) => cmd_age_groups(&config, args),
        Commands::Options(args) => cmd_options(&config, args),
        Commands::Report(args) => cmd_report(&config, args, &mut std::io::stdout().lock()),
        Commands::Export(args) => cmd_export(&config, args),
        Commands::Template(args) => cmd_template(&args),
    }
}

/// Install the global tracing subscriber; `RUST_LOG` wins over the directive
fn setup_logging(directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_dataset(config: &TurnoverConfig, args: &InputArgs) -> anyhow::Result<TerminationDataset> {
    let mut builder = TerminationDatasetBuilder::new()
        .config(config)
        .path(&args.input);
    if args.delimiter.is_some() {
        builder = builder.delimiter(args.delimiter);
    }
    if let Some(sheet) = &args.sheet {
        builder = builder.sheet_name(sheet.clone());
    }
    let dataset = builder.build()?;
    tracing::info!(records = dataset.len(), path = %args.input.display(), "dataset ready");
    Ok(dataset)
}

fn resolve_overview(config: &TurnoverConfig, args: &OverviewArgs) -> TurnoverConfig {
    let mut config = config.clone();
    if let Some(headcount) = args.headcount {
        config.headcount_baseline = headcount;
    }
    config
}

fn as_of(args: &OverviewArgs) -> NaiveDate {
    args.as_of.unwrap_or_else(|| chrono::Local::now().date_naive())
}

fn cmd_summary(config: &TurnoverConfig, args: SummaryArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(config, &args.data.input)?;
    let filters = args.data.filters.to_filter_set();
    let config = resolve_overview(config, &args.overview);

    dataset.statistics().print_summary();
    println!();

    let view = dataset.filter(&filters);
    if filters.active_count() > 0 {
        println!("Filtered records: {} of {}", view.len(), dataset.len());
    }
    let report = DashboardReport::with_config(&dataset, &filters, &config, as_of(&args.overview));
    report.overview.print_summary();
    Ok(())
}

fn cmd_timeline(config: &TurnoverConfig, args: TimelineArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(config, &args.data.input)?;
    let view = dataset.filter(&args.data.filters.to_filter_set());
    let analytics = view.analytics();

    if args.bars {
        let bars = analytics.initiative_monthly_bars();
        for (kind, series) in [
            (InitiativeKind::Employee, &bars.employee_initiated),
            (InitiativeKind::Company, &bars.company_initiated),
        ] {
            println!("=== {} ===", kind);
            if series.is_empty() {
                println!("No {} terminations for the selected filters", kind.label());
            }
            for bar in series {
                println!("{} | {}", bar.label, bar.count);
            }
        }
        return Ok(());
    }

    let timeline = analytics.monthly_timeline();
    if timeline.is_empty() {
        println!("No terminations for the selected filters");
    }
    for point in &timeline {
        println!("{} | {} | {}", point.label, point.initiative, point.count);
    }
    Ok(())
}

fn cmd_risk_matrix(config: &TurnoverConfig, args: RiskMatrixArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(config, &args.data.input)?;
    let view = dataset.filter(&args.data.filters.to_filter_set());
    let matrix = view.analytics().risk_matrix();

    if matrix.is_empty() {
        println!("No records with both a tenure and a reason for the selected filters");
        return Ok(());
    }

    println!("{:<8} | {}", "Tenure", matrix.columns.join(" | "));
    for (row, label) in matrix.row_labels().iter().enumerate() {
        let counts: Vec<String> = matrix.counts[row].iter().map(|c| c.to_string()).collect();
        println!("{:<8} | {}", label, counts.join(" | "));
    }

    if args.detail {
        println!();
        for (row, label) in matrix.row_labels().iter().enumerate() {
            for (column, reason) in matrix.columns.iter().enumerate() {
                if matrix.counts[row][column] == 0 {
                    continue;
                }
                if let Some(text) = matrix.cell_text(row, column) {
                    println!("{} / {}: {}", label, reason, text);
                }
            }
        }
    }
    Ok(())
}

fn cmd_age_groups(config: &TurnoverConfig, args: DataArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(config, &args.input)?;
    let view = dataset.filter(&args.filters.to_filter_set());
    let groups = view.analytics().age_breakdown();

    if groups.is_empty() {
        println!("No terminations for the selected filters");
    }
    for group in &groups {
        println!("{:<9} | {} | {}", group.label, group.initiative, group.count);
    }
    Ok(())
}

fn cmd_options(config: &TurnoverConfig, args: InputArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(config, &args)?;
    let options = dataset.filter_options();
    for dimension in FilterDimension::ALL {
        println!("{}: {}", dimension, options.with_all_sentinel(dimension).join(", "));
    }
    Ok(())
}

/// Stdout carries only the report (or the written file list)
fn cmd_report(config: &TurnoverConfig, args: ReportArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let dataset = load_dataset(config, &args.data.input)?;
    let filters = args.data.filters.to_filter_set();
    let config = resolve_overview(config, &args.overview);
    let report = DashboardReport::with_config(&dataset, &filters, &config, as_of(&args.overview));

    match &args.output {
        Some(path) => {
            let written = exporter_for(args.format.into()).export_report(&report, path)?;
            for file in written {
                writeln!(out, "Wrote {}", file.display())?;
            }
        }
        None => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
    }
    Ok(())
}

fn cmd_export(config: &TurnoverConfig, args: ExportArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(config, &args.data.input)?;
    let view = dataset.filter(&args.data.filters.to_filter_set());
    exporter_for(args.format.into()).export_records(view.records(), &args.output)?;
    println!("Exported {} records to {}", view.len(), args.output.display());
    Ok(())
}

fn cmd_template(args: &TemplateArgs) -> anyhow::Result<()> {
    let (headers, rows) = TerminationSchema::sample_rows();
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    writer.write_record(&headers)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    println!("Wrote template with {} example rows to {}", rows.len(), args.output.display());
    Ok(())
}
