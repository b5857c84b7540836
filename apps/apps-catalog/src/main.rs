use anyhow::{anyhow, Context, Result};
use apps_catalog::config::AppsCatalogConfig;
use apps_catalog::contract::model::NewApp;
use apps_catalog::AppsCatalog;
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit_db::DbHandle;
use runtime::{AppConfig, CliArgs};
use search_core::{ConditionTree, ListType, OrderBy, QuerySpec, SearchCtx};
use std::path::{Path, PathBuf};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "apps_catalog";

/// Apps catalog: search versioned application definitions
#[derive(Parser)]
#[command(name = "apps-catalog")]
#[command(about = "Apps catalog: search versioned application definitions")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the database and apply migrations
    Check,
    /// Insert apps (and further versions) from a JSON file
    Seed(SeedArgs),
    /// Run one search and print the page as JSON
    Search(SearchArgs),
}

#[derive(Args)]
struct Caller {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    user: String,
}

#[derive(Args)]
struct SeedArgs {
    #[command(flatten)]
    caller: Caller,
    /// JSON array of apps: `[{"id": "...", "version": "...", "runtime": "DOCKER", "jobType": "BATCH"}]`.
    /// An id that already exists gets the entry added as a new version.
    #[arg(long)]
    file: PathBuf,
}

#[derive(Args)]
struct SearchArgs {
    #[command(flatten)]
    caller: Caller,
    /// OWNED, SHARED_PUBLIC, SHARED_DIRECT, MINE, READ_PERM or ALL
    #[arg(long, default_value = "OWNED")]
    list_type: ListType,
    /// `attribute.operator.value`, repeatable; all must hold
    #[arg(long = "search", value_name = "COND", conflicts_with = "tree")]
    search: Vec<String>,
    /// Boolean condition tree as JSON
    #[arg(long)]
    tree: Option<String>,
    /// e.g. `max_jobs(desc),id`
    #[arg(long)]
    order_by: Option<String>,
    /// Row cap; negative means unbounded
    #[arg(long, allow_negative_numbers = true)]
    limit: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    skip: Option<i64>,
    #[arg(long)]
    start_after: Option<String>,
    /// Force (true) or forbid (false) returning non-latest versions
    #[arg(long)]
    version_specified: Option<bool>,
    /// Ids shared with the caller, repeatable
    #[arg(long = "shared-id")]
    shared_ids: Vec<String>,
    /// Ids the caller may read, repeatable
    #[arg(long = "viewable-id")]
    viewable_ids: Vec<String>,
    #[arg(long)]
    include_deleted: bool,
    #[arg(long)]
    compute_total: bool,
}

impl SearchArgs {
    fn ctx(&self) -> SearchCtx {
        SearchCtx::new(&self.caller.tenant, &self.caller.user)
    }

    fn to_spec(&self) -> Result<QuerySpec> {
        let mut spec = QuerySpec::new()
            .with_list_type(self.list_type)
            .with_shared_ids(self.shared_ids.iter().cloned())
            .with_viewable_ids(self.viewable_ids.iter().cloned())
            .include_deleted(self.include_deleted)
            .compute_total(self.compute_total);

        spec = match &self.tree {
            Some(raw) => {
                let tree: ConditionTree =
                    serde_json::from_str(raw).context("--tree is not a valid condition tree")?;
                spec.with_tree(tree)
            }
            None => spec.with_conditions(self.search.iter().cloned()),
        };
        if let Some(order) = &self.order_by {
            spec = spec.with_order(OrderBy::parse(order)?);
        }
        if let Some(limit) = self.limit {
            spec = spec.with_limit(limit);
        }
        if let Some(skip) = self.skip {
            spec = spec.with_skip(skip);
        }
        if let Some(start_after) = &self.start_after {
            spec = spec.with_start_after(start_after.clone());
        }
        if let Some(specified) = self.version_specified {
            spec = spec.with_version_specified(specified);
        }
        Ok(spec)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::config::default_logging_config);
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("apps-catalog starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command {
        None | Some(Commands::Check) => check(&config).await,
        Some(Commands::Seed(seed_args)) => seed(&config, seed_args).await,
        Some(Commands::Search(search_args)) => search(&config, search_args).await,
    }
}

async fn connect(config: &AppConfig) -> Result<(DbHandle, AppsCatalog)> {
    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("Database URL not configured"))?;
    if db_config.url.trim().is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let dsn = db_config.dsn(&config.home_dir());
    tracing::info!(dsn = %dsn, "connecting to database");
    let db = DbHandle::connect(&dsn, db_config.connect_opts())
        .await
        .with_context(|| format!("cannot connect to {dsn}"))?;
    tracing::info!(engine = ?db.engine(), "connected");

    let module_cfg: AppsCatalogConfig = config.module_config(MODULE_NAME)?;
    let catalog = AppsCatalog::init(&db, &module_cfg).await?;
    Ok((db, catalog))
}

async fn check(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let (db, _catalog) = connect(config).await?;
    db.close().await;
    println!("Configuration check passed");
    Ok(())
}

async fn seed(config: &AppConfig, args: SeedArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let apps: Vec<NewApp> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of apps", args.file.display()))?;

    let (db, catalog) = connect(config).await?;
    let client = catalog.client();
    let ctx = SearchCtx::new(&args.caller.tenant, &args.caller.user);

    for app in apps {
        let id = app.id.clone();
        let stored = match client.create_app(&ctx, app.clone()).await {
            Ok(a) => a,
            Err(apps_catalog::error::AppsCatalogError::Conflict { .. }) => client
                .add_version(&ctx, &id, app.version)
                .await
                .with_context(|| format!("cannot add version to {id}"))?,
            Err(e) => return Err(e).with_context(|| format!("cannot create {id}")),
        };
        println!("{}\t{}", stored.id, stored.version);
    }

    db.close().await;
    Ok(())
}

async fn search(config: &AppConfig, args: SearchArgs) -> Result<()> {
    let spec = args.to_spec()?;
    let (db, catalog) = connect(config).await?;

    let page = catalog
        .client()
        .search_apps(&args.ctx(), &spec)
        .await
        .context("search failed")?;
    println!("{}", serde_json::to_string_pretty(&page)?);

    db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_args(argv: &[&str]) -> SearchArgs {
        let mut full = vec!["apps-catalog", "search", "--tenant", "t1", "--user", "alice"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Some(Commands::Search(args)) => args,
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn search_flags_build_a_query_spec() {
        let args = search_args(&[
            "--list-type",
            "shared-public",
            "--search",
            "max_jobs.gt.2",
            "--search",
            "runtime.eq.docker",
            "--order-by",
            "max_jobs(desc)",
            "--limit",
            "-1",
            "--skip",
            "3",
            "--shared-id",
            "a",
            "--shared-id",
            "b",
            "--compute-total",
        ]);
        let spec = args.to_spec().unwrap();
        assert_eq!(spec.list_type, ListType::SharedPublic);
        assert_eq!(spec.limit, Some(-1));
        assert_eq!(spec.skip, Some(3));
        assert_eq!(spec.shared_ids.len(), 2);
        assert!(spec.compute_total);
        assert_eq!(spec.order_by.to_string(), "max_jobs(desc)");
        assert_eq!(
            spec.conditions,
            search_core::SearchConditions::List(vec![
                "max_jobs.gt.2".into(),
                "runtime.eq.docker".into()
            ])
        );
    }

    #[test]
    fn tree_flag_parses_json() {
        let tree = serde_json::to_string(&ConditionTree::compare("id", "EQ", "x")).unwrap();
        let spec = search_args(&["--tree", &tree]).to_spec().unwrap();
        assert!(matches!(
            spec.conditions,
            search_core::SearchConditions::Tree(_)
        ));
    }

    #[test]
    fn search_and_tree_conflict() {
        let res = Cli::try_parse_from([
            "apps-catalog", "search", "--tenant", "t", "--user", "u", "--search", "id.eq.x",
            "--tree", "{}",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn bad_order_is_reported() {
        let args = search_args(&["--order-by", "id(sideways)"]);
        assert!(args.to_spec().is_err());
    }

    #[test]
    fn global_verbose_counts() {
        let cli = Cli::try_parse_from(["apps-catalog", "-vv", "check"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
