//! Holmes CLI: product feedback investigations
//!
//! Usage:
//!   holmes analyze <product> [--competitor] [--db path] [--config path]
//!   holmes new <product>
//!   holmes list | show | trends
//!   holmes select|delete <instance-id>
//!   holmes resolve <issue-id> [--competitor]
//!   holmes reset | clear-competitor | plan <tier> [--paid]

use clap::{Parser, Subcommand};
use holmes::synthesis::match_source_type;
use holmes::{
    category_breakdown, filter_issues, monthly_trend, AnalysisCoordinator, AnalysisKind,
    AnalyzeOutcome, FeedbackSynthesizer, GeminiProvider, HolmesConfig, Instance, InstanceId,
    IssueCategory, IssueFilter, IssueId, OpenStore, PlanTier, SkipReason, SqliteStore,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "holmes", version, about = "Investigate customer feedback for a product")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a product into the active investigation
    Analyze {
        /// Product name
        product: String,
        /// Analyze as the competitor of the active investigation (max plan)
        #[arg(long)]
        competitor: bool,
    },
    /// Start a fresh investigation and analyze a product into it
    New {
        /// Product name
        product: String,
    },
    /// List investigations
    List,
    /// Show the active investigation's issues
    Show {
        /// Only issues whose description contains this text
        #[arg(long)]
        keyword: Option<String>,
        /// Only issues in this category
        #[arg(long)]
        category: Option<String>,
        /// Only issues citing this source type (e.g. reddit, youtube)
        #[arg(long)]
        source: Option<String>,
    },
    /// Category and monthly breakdown of the active investigation
    Trends,
    /// Make an investigation active
    Select {
        /// Instance id
        id: String,
    },
    /// Delete an investigation
    Delete {
        /// Instance id
        id: String,
    },
    /// Mark an issue resolved, removing it
    Resolve {
        /// Issue id
        issue_id: String,
        /// Resolve from the competitor list
        #[arg(long)]
        competitor: bool,
    },
    /// Clear the active investigation's results
    Reset,
    /// Drop competitor results from the active investigation
    ClearCompetitor,
    /// Switch subscription plan
    Plan {
        /// free, pro or max
        tier: PlanTier,
        /// Record payment for the plan
        #[arg(long)]
        paid: bool,
    },
}

fn open_coordinator(db: Option<PathBuf>, config: Option<PathBuf>) -> Result<AnalysisCoordinator, String> {
    let config = HolmesConfig::resolve(config.as_deref())
        .map_err(|e| format!("Failed to load config: {}", e))?;
    let db_path = db.unwrap_or_else(|| config.db_path());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let store = SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    let provider = GeminiProvider::from_env(config.provider.clone());
    let synthesizer = FeedbackSynthesizer::new(Arc::new(provider));
    AnalysisCoordinator::load(Arc::new(store), synthesizer, config.default_plan)
        .map_err(|e| format!("Failed to load session: {}", e))
}

fn print_instance(instance: &Instance, filter: &IssueFilter) {
    let title = if instance.product_name.is_empty() {
        "(new investigation)"
    } else {
        instance.product_name.as_str()
    };
    println!("{} [{}]", title, instance.id);
    if let Some(due) = instance.next_scan_due {
        println!("Next scheduled scan: {}", due.format("%Y-%m-%d %H:%M UTC"));
    }
    if let Some(error) = &instance.error {
        println!("Error: {}", error);
    }
    for issue in filter_issues(&instance.issues, filter) {
        println!(
            "  {:>6}  {:<22}  {}  ({})",
            issue.total_occurrences(),
            issue.category,
            issue.description,
            issue.id
        );
        for source in &issue.sources {
            println!("          - {}: {} <{}>", source.source_type, source.title, source.url);
        }
    }
    if let Some(competitor) = &instance.competitor_product_name {
        println!();
        println!("Competitor: {}", competitor);
        if let Some(error) = &instance.competitor_error {
            println!("Error: {}", error);
        }
        for issue in filter_issues(&instance.competitor_issues, filter) {
            println!(
                "  {:>6}  {:<22}  {}  ({})",
                issue.total_occurrences(),
                issue.category,
                issue.description,
                issue.id
            );
        }
    }
}

async fn cmd_analyze(coordinator: &AnalysisCoordinator, product: &str, kind: AnalysisKind) -> i32 {
    match coordinator.analyze(product, kind).await {
        Ok(AnalyzeOutcome::Completed { instance_id, issue_count }) => {
            println!("Found {} issues for '{}' ({})", issue_count, product.trim(), instance_id);
            0
        }
        Ok(AnalyzeOutcome::Skipped(SkipReason::EmptyName)) => {
            eprintln!("Error: product name is empty");
            1
        }
        Ok(AnalyzeOutcome::Skipped(SkipReason::AlreadyLoading)) => {
            eprintln!("Error: an analysis is already running for this investigation");
            1
        }
        Ok(AnalyzeOutcome::Discarded { instance_id }) => {
            eprintln!("Warning: investigation {} changed before results arrived, results dropped", instance_id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_list(coordinator: &AnalysisCoordinator) -> i32 {
    let instances = coordinator.list();
    if instances.is_empty() {
        println!("No investigations yet.");
        return 0;
    }
    let active = coordinator.active_id();
    println!("   {:<38}  {:<28}  {:>6}  LAST SCAN", "ID", "PRODUCT", "ISSUES");
    println!("{}", "-".repeat(96));
    for instance in instances {
        let marker = if active.as_ref() == Some(&instance.id) { "*" } else { " " };
        let last_scan = instance
            .last_scan_timestamp
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<38}  {:<28}  {:>6}  {}",
            marker,
            instance.id,
            instance.product_name,
            instance.issues.len(),
            last_scan
        );
    }
    0
}

fn cmd_show(
    coordinator: &AnalysisCoordinator,
    keyword: Option<String>,
    category: Option<String>,
    source: Option<String>,
) -> i32 {
    let mut filter = IssueFilter::new();
    filter.keyword = keyword;
    filter.category = category.as_deref().map(IssueCategory::parse);
    if let Some(label) = source {
        match match_source_type(&label) {
            Some(source_type) => filter.source_type = Some(source_type),
            None => {
                eprintln!("Error: unknown source type '{}'", label);
                return 1;
            }
        }
    }
    match coordinator.active() {
        Some(instance) => {
            print_instance(&instance, &filter);
            0
        }
        None => {
            eprintln!("Error: no active investigation");
            1
        }
    }
}

fn cmd_trends(coordinator: &AnalysisCoordinator) -> i32 {
    let Some(instance) = coordinator.active() else {
        eprintln!("Error: no active investigation");
        return 1;
    };
    if instance.issues.is_empty() {
        println!("No issues to summarize.");
        return 0;
    }
    println!("By category:");
    for (category, count) in category_breakdown(&instance.issues) {
        println!("  {:<24} {:>4}", category, count);
    }
    println!("By month:");
    for (month, count) in monthly_trend(&instance.issues) {
        println!("  {:<24} {:>4}", month, count);
    }
    0
}

fn report(result: Result<String, String>) -> i32 {
    match result {
        Ok(message) => {
            println!("{}", message);
            0
        }
        Err(message) => {
            eprintln!("Error: {}", message);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let coordinator = match open_coordinator(cli.db, cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Analyze { product, competitor } => {
            let kind = if competitor {
                AnalysisKind::Competitor
            } else {
                AnalysisKind::Primary
            };
            cmd_analyze(&coordinator, &product, kind).await
        }
        Commands::New { product } => match coordinator.new_investigation() {
            Ok(_) => cmd_analyze(&coordinator, &product, AnalysisKind::Primary).await,
            Err(e) => report(Err(e.to_string())),
        },
        Commands::List => cmd_list(&coordinator),
        Commands::Show { keyword, category, source } => {
            cmd_show(&coordinator, keyword, category, source)
        }
        Commands::Trends => cmd_trends(&coordinator),
        Commands::Select { id } => report(match coordinator.select(&InstanceId::from(id.as_str())) {
            Ok(true) => Ok(format!("Selected {}", id)),
            Ok(false) => Err(format!("investigation '{}' not found", id)),
            Err(e) => Err(e.to_string()),
        }),
        Commands::Delete { id } => report(match coordinator.delete(&InstanceId::from(id.as_str())) {
            Ok(Some(removed)) => Ok(format!("Deleted '{}' ({})", removed.product_name, id)),
            Ok(None) => Err(format!("investigation '{}' not found", id)),
            Err(e) => Err(e.to_string()),
        }),
        Commands::Resolve { issue_id, competitor } => {
            let Some(instance_id) = coordinator.active_id() else {
                eprintln!("Error: no active investigation");
                std::process::exit(1);
            };
            let issue = IssueId::from(issue_id.as_str());
            let result = if competitor {
                coordinator.resolve_competitor(&instance_id, &issue)
            } else {
                coordinator.resolve(&instance_id, &issue)
            };
            report(match result {
                Ok(true) => Ok(format!("Resolved {}", issue_id)),
                Ok(false) => Err(format!("issue '{}' not found", issue_id)),
                Err(e) => Err(e.to_string()),
            })
        }
        Commands::Reset => report(
            coordinator
                .reset_active()
                .map(|_| "Investigation reset".to_string())
                .map_err(|e| e.to_string()),
        ),
        Commands::ClearCompetitor => report(
            coordinator
                .clear_competitor()
                .map(|_| "Competitor cleared".to_string())
                .map_err(|e| e.to_string()),
        ),
        Commands::Plan { tier, paid } => {
            let result = coordinator.set_plan(tier).and_then(|_| {
                if paid {
                    coordinator.complete_payment()
                } else {
                    Ok(())
                }
            });
            report(
                result
                    .map(|_| format!("Plan set to {}", tier))
                    .map_err(|e| e.to_string()),
            )
        }
    };
    std::process::exit(code);
}
