//! sccs2svn command line entry point
//!
//! Reads the SCCS history below `--sccs-repository` and writes it either
//! into a new Subversion repository (through `svnadmin load`) or into a
//! dumpfile with `--dump-file`. `--dry-run` only prints the commit plan.

use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sccs2svn::config::{
    BatchLimits, CommentMatch, ConvertConfig, GroupingPolicy, TimestampZone,
    DEFAULT_CONTENT_BATCH, DEFAULT_PROPERTY_BATCH, DEFAULT_WINDOW_SECS,
};
use sccs2svn::{convert, ConvertResult, SccsExecutor};
use svn_repos::{DumpWriter, Repository, SvnAdmin};

#[derive(Parser)]
#[command(name = "sccs2svn")]
#[command(about = "Convert a tree of SCCS repositories into a new Subversion repository")]
#[command(version)]
struct Args {
    /// User id recorded on revisions made by the converter itself
    #[arg(long)]
    user: String,

    /// Path of the Subversion repository to create (must not exist)
    #[arg(long)]
    svn_repository: PathBuf,

    /// Root of the tree holding the SCCS directories
    #[arg(long)]
    sccs_repository: PathBuf,

    /// Write a dumpfile to the target path instead of creating a repository
    #[arg(long, conflicts_with = "dry_run")]
    dump_file: bool,

    /// Print the reconstructed commits as JSON and stop
    #[arg(long)]
    dry_run: bool,

    /// Maximum seconds between consecutive deltas of one commit
    #[arg(long, default_value_t = DEFAULT_WINDOW_SECS)]
    window_secs: i64,

    /// Ignore surrounding whitespace when comparing comments
    #[arg(long)]
    trim_comments: bool,

    /// Files per content transaction
    #[arg(long, default_value_t = DEFAULT_CONTENT_BATCH)]
    content_batch: usize,

    /// Paths per property transaction
    #[arg(long, default_value_t = DEFAULT_PROPERTY_BATCH)]
    property_batch: usize,

    /// Time zone SCCS dates are read in
    #[arg(long, value_enum, default_value_t = TimestampZone::Local)]
    timezone: TimestampZone,

    /// Additional file name glob treated as text (repeatable)
    #[arg(long = "text-pattern")]
    text_patterns: Vec<String>,

    /// Leave SCCS keywords untouched
    #[arg(long)]
    no_keywords: bool,

    /// Remove files and directories whose names end with this suffix
    #[arg(long)]
    prune_suffix: Option<String>,

    /// SCCS front-end program
    #[arg(long, default_value = "sccs")]
    sccs_program: String,

    /// svnadmin program
    #[arg(long, default_value = "svnadmin")]
    svnadmin_program: PathBuf,

    /// Log every file sent
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> ConvertConfig {
        let comment_match = if self.trim_comments {
            CommentMatch::Trimmed
        } else {
            CommentMatch::Exact
        };

        ConvertConfig {
            operator: self.user.clone(),
            sccs_root: self.sccs_repository.clone(),
            grouping: GroupingPolicy {
                window_secs: self.window_secs,
                comment_match,
            },
            batches: BatchLimits {
                content: self.content_batch,
                properties: self.property_batch,
            },
            timezone: self.timezone,
            text_patterns: self.text_patterns.clone(),
            translate_keywords: !self.no_keywords,
            prune_suffix: self.prune_suffix.clone(),
            sccs_program: self.sccs_program.clone(),
        }
    }
}

fn main() {
    let args = Args::parse();

    let log_filter = if args.verbose {
        "sccs2svn=debug,svn_repos=debug"
    } else {
        "sccs2svn=info,svn_repos=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> ConvertResult<()> {
    let config = args.config();
    config.validate()?;
    if !args.dry_run {
        convert::ensure_target_absent(&args.svn_repository)?;
    }

    let sccs = SccsExecutor::new(&config.sccs_program)?;
    let admin = if args.dump_file || args.dry_run {
        None
    } else {
        Some(SvnAdmin::new(&args.svnadmin_program)?)
    };

    tracing::info!("Reading SCCS history below {}", config.sccs_root.display());
    let mut records = convert::read_history(&config, &sccs)?;

    if args.dry_run {
        let plan = convert::plan(&config, &mut records)?;
        println!("{}", plan.to_json()?);
        return Ok(());
    }

    let summary = match admin {
        Some(admin) => load_repository(&admin, &args.svn_repository, &config, &sccs, &mut records)?,
        None => {
            tracing::info!("Writing dumpfile {}", args.svn_repository.display());
            let out = BufWriter::new(File::create(&args.svn_repository)?);
            let mut repo = Repository::new(DumpWriter::new(out));
            let summary = convert::migrate(&config, &sccs, &mut records, &mut repo)?;
            repo.into_sink().into_inner()?;
            summary
        }
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Create the target repository and stream every revision into it.
fn load_repository(
    admin: &SvnAdmin,
    target: &Path,
    config: &ConvertConfig,
    sccs: &SccsExecutor,
    records: &mut [sccs2svn::ChangeRecord],
) -> ConvertResult<sccs2svn::MigrationSummary> {
    admin.create(target)?;
    let load = admin.load(target)?;
    let mut repo = Repository::new(DumpWriter::new(load));
    let summary = convert::migrate(config, sccs, records, &mut repo)?;
    repo.into_sink().into_inner()?.finish()?;
    Ok(summary)
}
