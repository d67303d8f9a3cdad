//! `partlink init` command - Initialize a new project

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::project::{Project, ProjectError};
use crate::core::store::CatalogStore;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the configuration even if .partlink/ already exists (keeps the catalog)
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    let project = match project {
        Ok(project) => project,
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} partlink project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!("  Use {} to rewrite the configuration", style("--force").yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Creates the database and registers the link types
    CatalogStore::open(&project)?;

    if !global.quiet {
        println!(
            "{} Initialized partlink project at {}",
            style("✓").green(),
            style(project.root().display()).cyan()
        );
        println!();
        println!("Next steps:");
        println!(
            "  {} Add catalog entities",
            style("partlink entity add --sku FRAME-1").yellow()
        );
        println!(
            "  {} Link parts to an entity",
            style("partlink link set 1 2:4 3:2.5").yellow()
        );
        println!("  {} Show the resolved parts list", style("partlink show 1").yellow());
    }
    Ok(())
}
