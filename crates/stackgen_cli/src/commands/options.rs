//! Options command - Print the resolved build options.

use anyhow::{Context, Result};
use clap::Args;

use stackgen_core::OptionOverrides;

use super::OptionArgs;

#[derive(Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub options: OptionArgs,
}

pub fn execute(args: OptionsArgs) -> Result<()> {
    let options = OptionOverrides::from(args.options).resolve();
    let yaml = serde_yaml::to_string(&options).context("Failed to serialize options")?;
    print!("{}", yaml);
    Ok(())
}
