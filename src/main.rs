use clap::Parser;
use miette::Result;
use partlink::cli::{Cli, Commands, GlobalOpts};
use partlink::core::{Config, Project};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Terminate silently on a closed pipe (`partlink export | head`)
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let config = startup_config(&global);
    init_tracing(&global, &config);
    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    match cli.command {
        Commands::Init(args) => partlink::cli::commands::init::run(args, &global),
        Commands::Entity(cmd) => partlink::cli::commands::entity::run(cmd, &global),
        Commands::Link(cmd) => partlink::cli::commands::link::run(cmd, &global),
        Commands::Show(args) => partlink::cli::commands::show::run(args, &global),
        Commands::QtyMap(args) => partlink::cli::commands::qty_map::run(args, &global),
        Commands::Query(args) => partlink::cli::commands::query::run(args, &global),
        Commands::Export(args) => partlink::cli::commands::export::run(args, &global),
        Commands::Import(args) => partlink::cli::commands::import::run(args, &global),
        Commands::Config(cmd) => partlink::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => partlink::cli::commands::completions::run(args),
    }
}

/// Configuration visible before any command runs, used for logging
fn startup_config(global: &GlobalOpts) -> Config {
    match global.project.as_deref().map(Project::discover_from) {
        Some(Ok(project)) => Config::load_for(&project),
        _ => Config::load(),
    }
}

/// Log to stderr; `-v` wins over PARTLINK_LOG and the `log_level` key
fn init_tracing(global: &GlobalOpts, config: &Config) {
    let directive = if global.verbose {
        "partlink=debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "warn".to_string())
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
