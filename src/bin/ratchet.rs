//! ratchet — a small operator CLI for Cloud Spanner schemas
//!
//! # Usage
//!
//! ```bash
//! # Show the teardown plan for a metadata snapshot
//! ratchet drop-all-tables --snapshot schema.json --dry-run
//!
//! # Write the plan as a DDL script
//! ratchet drop-all-tables --snapshot schema.json --output drop.sql
//!
//! # Check that a script only contains DDL
//! ratchet check --file schema.sql --ddl-only
//!
//! # Validate a DDL script and write it as one batch
//! ratchet load --file schema.sql --output apply.sql
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use ratchet::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ratchet")]
#[command(version)]
#[command(about = "A simple operator CLI for Cloud Spanner schemas", long_about = None)]
#[command(after_help = "EXAMPLES:
    ratchet drop-all-tables --snapshot schema.json --dry-run
    ratchet -p my-project -i my-instance -d my-db drop-all-tables --snapshot schema.json -o drop.sql
    ratchet check 'CREATE INDEX idx ON Singers (Name); DROP TABLE Albums' --ddl-only
    ratchet load --file schema.sql --mode sequential --force")]
struct Cli {
    /// Project id
    #[arg(short, long, global = true, env = "SPANNER_PROJECT_ID")]
    project: Option<String>,

    /// Instance id
    #[arg(short, long, global = true, env = "SPANNER_INSTANCE_ID")]
    instance: Option<String>,

    /// Database id
    #[arg(short, long, global = true, env = "SPANNER_DATABASE_ID")]
    database: Option<String>,

    /// Config file (defaults to ./ratchet.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Batch,
    Sequential,
}

impl From<ModeArg> for ApplyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Batch => ApplyMode::Batch,
            ModeArg::Sequential => ApplyMode::Sequential,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Plan the DDL that drops every table, index and foreign key
    DropAllTables {
        /// Metadata snapshot (.json or .toml)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Print the plan instead of writing it
        #[arg(long)]
        dry_run: bool,

        /// Script file to write (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Apply statements one by one or as a single batch
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Check that every statement is DDL and write them as one script
    Load {
        /// SQL statement(s), separated by ';'
        sql: Option<String>,

        /// File containing SQL(s). If '-', read from STDIN.
        #[arg(short, long)]
        file: Option<String>,

        /// Script file to write (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Apply statements one by one or as a single batch
        #[arg(short, long, value_enum, default_value = "batch")]
        mode: ModeArg,

        /// Keep going when a statement fails (sequential mode)
        #[arg(long)]
        force: bool,
    },
    /// Split and classify SQL statements
    Check {
        /// SQL statement(s), separated by ';'
        sql: Option<String>,

        /// File containing SQL(s). If '-', read from STDIN.
        #[arg(short, long)]
        file: Option<String>,

        /// Fail unless every statement is DDL
        #[arg(long)]
        ddl_only: bool,
    },
}

impl Cli {
    fn database_overrides(&self) -> DatabaseSection {
        DatabaseSection {
            project: self.project.clone(),
            instance: self.instance.clone(),
            database: self.database.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::DropAllTables {
            snapshot,
            dry_run,
            output,
            mode,
        } => drop_all_tables(&cli, snapshot, *dry_run, output.as_deref(), *mode),
        Commands::Load {
            sql,
            file,
            output,
            mode,
            force,
        } => load(
            sql.as_deref(),
            file.as_deref(),
            output.as_deref(),
            *mode,
            *force,
        ),
        Commands::Check {
            sql,
            file,
            ddl_only,
        } => check(sql.as_deref(), file.as_deref(), *ddl_only),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ratchet=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("RATCHET_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn drop_all_tables(
    cli: &Cli,
    snapshot: &Path,
    dry_run: bool,
    output: Option<&Path>,
    mode: Option<ModeArg>,
) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let target = config.database_target(&cli.database_overrides())?;
    if let Some(target) = &target {
        eprintln!("{} {}", "db:".dimmed(), target.to_string().cyan());
    }

    let snapshot = MetadataSnapshot::load(snapshot)?;
    let plan = ratchet::plan_drop_all(&snapshot).context("Failed to plan teardown")?;

    if dry_run {
        print_plan(&plan);
        return Ok(());
    }

    let mode = mode.map(ApplyMode::from).unwrap_or(config.plan.mode);
    let header = target.map(|t| format!("db: {}", t));
    let applied = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_plan(BufWriter::new(file), header, &plan, mode)?
        }
        None => write_plan(io::stdout().lock(), header, &plan, mode)?,
    };

    eprintln!("{} {} DDL(s) written", "✓".green(), applied.to_string().cyan());
    Ok(())
}

fn write_plan<W: Write>(
    writer: W,
    header: Option<String>,
    plan: &TeardownPlan,
    mode: ApplyMode,
) -> RatchetResult<usize> {
    let mut sink = ScriptSink::new(writer);
    if let Some(header) = header {
        sink = sink.with_header(header);
    }
    apply_plan(&mut sink, plan, mode)?;
    Ok(sink.written())
}

fn print_plan(plan: &TeardownPlan) {
    if plan.is_empty() {
        println!("{}", "(nothing to drop)".dimmed());
        return;
    }

    for stmt in plan {
        let sql = stmt.to_sql();
        match stmt {
            DdlStatement::DropConstraint { .. } => println!("{}", sql.yellow()),
            DdlStatement::DropIndex { .. } => println!("{}", sql.white()),
            DdlStatement::DropTable { .. } => println!("{}", sql.red()),
        }
    }

    let summary = plan.summary();
    println!();
    println!(
        "{} constraint(s), {} index(es), {} table(s)",
        summary.constraints.to_string().cyan(),
        summary.indexes.to_string().cyan(),
        summary.tables.to_string().cyan()
    );
    println!("{}", "No changes made.".yellow());
}

fn read_statements(sql: Option<&str>, file: Option<&str>) -> anyhow::Result<Vec<String>> {
    let content = match (sql, file) {
        (Some(_), Some(_)) | (None, None) => bail!("Specify either arg(sql) or --file"),
        (Some(sql), None) => sql.to_string(),
        (None, Some("-")) => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            content
        }
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path))?,
    };
    Ok(split_statements(&content))
}

fn load(
    sql: Option<&str>,
    file: Option<&str>,
    output: Option<&Path>,
    mode: ModeArg,
    force: bool,
) -> anyhow::Result<()> {
    let sqls = read_statements(sql, file)?;
    ensure_ddl(&sqls)?;
    eprintln!("{} Loading {} DDL(s)...", "→".dimmed(), sqls.len().to_string().cyan());

    let (written, report) = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_statements(BufWriter::new(file), &sqls, mode.into(), force)?
        }
        None => write_statements(io::stdout().lock(), &sqls, mode.into(), force)?,
    };

    for failure in &report.failures {
        eprintln!("{} {}", "✗".red(), failure.to_string().red());
    }
    eprintln!("{} {} DDL(s) written", "✓".green(), written.to_string().cyan());
    if !report.is_clean() {
        bail!("{} statement(s) failed", report.failures.len());
    }
    Ok(())
}

fn write_statements<W: Write>(
    writer: W,
    statements: &[String],
    mode: ApplyMode,
    force: bool,
) -> RatchetResult<(usize, ApplyReport)> {
    let mut sink = ScriptSink::new(writer);
    let report = apply_statements(&mut sink, statements, mode, force)?;
    Ok((sink.written(), report))
}

fn check(sql: Option<&str>, file: Option<&str>, ddl_only: bool) -> anyhow::Result<()> {
    let sqls = read_statements(sql, file)?;

    for sql in &sqls {
        let kind = classify(sql)?;
        let label = format!("{:7}", format!("[{}]", kind));
        println!("{} {}", label.cyan(), sql.white());
    }
    if ddl_only {
        ensure_ddl(&sqls)?;
    }

    println!();
    println!("{} {} statement(s)", "✓".green(), sqls.len().to_string().cyan());
    Ok(())
}
