use clap::Subcommand;

use calfocus_core::{Actuator, FallbackActuator, FocusCommand};

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum FocusAction {
    /// Enable the focus mode now
    On {
        /// Focus name (default: configured focus_name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Disable the focus mode now
    Off {
        /// Focus name (default: configured focus_name)
        #[arg(long)]
        name: Option<String>,
    },
}

/// Manual switch. The detected state is left alone, so the scheduler only
/// overrides this on its next real transition.
pub async fn run(ctx: &Context, action: FocusAction) -> CliResult {
    let (command, name) = match action {
        FocusAction::On { name } => (FocusCommand::On, name),
        FocusAction::Off { name } => (FocusCommand::Off, name),
    };
    let focus_name = match name {
        Some(name) => name,
        None => ctx.load()?.config.focus_name,
    };

    FallbackActuator::system_default()
        .set_focus(command, &focus_name)
        .await?;
    println!("{}", command.shortcut_name(&focus_name));
    Ok(())
}
