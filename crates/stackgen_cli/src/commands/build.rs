//! Build command - Render and write all config files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use stackgen_core::{BuildLayout, Builder, OptionOverrides};

use super::OptionArgs;

#[derive(Args)]
pub struct BuildArgs {
    /// Directory with the config templates
    #[arg(long, env = "STACKGEN_ASSETS")]
    assets: Option<PathBuf>,

    /// YAML file overriding template and destination paths
    #[arg(long, env = "STACKGEN_LAYOUT")]
    layout: Option<PathBuf>,

    /// Write everything under this directory instead of /
    #[arg(long, env = "STACKGEN_ROOT")]
    root: Option<PathBuf>,

    /// Print the rendered files instead of writing them
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    pub options: OptionArgs,
}

pub fn execute(args: BuildArgs, quiet: bool) -> Result<()> {
    let layout = resolve_layout(args.layout, args.assets, args.root)?;
    let options = OptionOverrides::from(args.options).resolve();
    let builder = Builder::new(options, layout);

    if args.dry_run {
        info!("Dry run, nothing is written");
        for (artifact, content) in builder.preview().context("Failed to render templates")? {
            let target = builder.layout().output(artifact);
            println!("# {} -> {}", artifact, target.display());
            println!("{}", content);
        }
        return Ok(());
    }

    let report = builder.run().context("Build failed")?;

    if !quiet {
        println!("✅ Config files written:");
        for path in &report.written {
            println!("  📄 {}", path.display());
        }
        for path in &report.deleted {
            println!("  🗑  {}", path.display());
        }
        for path in &report.directories {
            println!("  📁 {}", path.display());
        }
    }

    Ok(())
}

fn resolve_layout(
    layout_file: Option<PathBuf>,
    assets: Option<PathBuf>,
    root: Option<PathBuf>,
) -> Result<BuildLayout> {
    let mut layout = match layout_file {
        Some(path) => BuildLayout::from_file(&path)
            .with_context(|| format!("Failed to load layout {:?}", path))?,
        None => BuildLayout::default(),
    };

    if let Some(assets) = assets {
        layout.assets = assets;
    }

    if let Some(root) = root {
        layout = layout.root(root);
    }

    if !layout.assets.is_dir() {
        anyhow::bail!("Template assets directory not found: {:?}", layout.assets);
    }

    Ok(layout)
}
