//! Command dispatch

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::{PhyphoxGenerator, MIME_GENERATED, MIME_PASSTHROUGH};
use crate::cli::args::{Cli, Commands, ConfigCommands, GenerateArgs, TemplateCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see --help".to_string(),
        ));
    };

    match command {
        Commands::Generate(args) => cmd_generate(&container(cli)?, args),
        Commands::Template { command } => match command {
            TemplateCommands::Show => cmd_template_show(&container(cli)?),
            TemplateCommands::Path => cmd_template_path(&container(cli)?),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(&container(cli)?),
            ConfigCommands::Init { force } => cmd_config_init(cli.config.as_deref(), *force),
            ConfigCommands::Path => cmd_config_path(cli.config.as_deref()),
        },
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

#[instrument(skip(container))]
fn cmd_generate(container: &ServiceContainer, args: &GenerateArgs) -> CliResult<()> {
    let generator = match &args.template {
        Some(path) => PhyphoxGenerator::new(
            Arc::clone(&container.fs),
            path.clone(),
            container.settings.namespace.clone(),
        ),
        None => container.generator(),
    };

    let params = args.to_params();
    let bytes = generator.generate(&params)?;

    if args.stdout {
        return write_stdout(&bytes);
    }

    let target = args
        .output
        .clone()
        .unwrap_or_else(|| container.settings.output_dir.join(params.file_name()));
    container
        .fs
        .write(&target, &bytes)
        .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;

    output::success(&format!("wrote {} ({MIME_GENERATED})", target.display()));
    output::detail(&format!("template: {}", generator.template_path().display()));
    output::detail(&params.title());
    output::detail(&params.info_label());
    Ok(())
}

fn cmd_template_show(container: &ServiceContainer) -> CliResult<()> {
    let generator = container.generator();
    let bytes = generator.passthrough()?;
    write_stdout(&bytes)?;
    output::detail(&format!(
        "{} ({MIME_PASSTHROUGH})",
        generator.template_path().display()
    ));
    Ok(())
}

fn cmd_template_path(container: &ServiceContainer) -> CliResult<()> {
    let path = &container.settings.template_path;
    output::info(&path.display());
    if !container.fs.is_file(path) {
        output::warning(&format!("template does not exist: {}", path.display()));
    }
    Ok(())
}

fn cmd_config_show(container: &ServiceContainer) -> CliResult<()> {
    output::header("# Effective configuration");
    output::info(&container.settings.to_toml()?);
    Ok(())
}

fn cmd_config_init(explicit: Option<&Path>, force: bool) -> CliResult<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => global_config_path().ok_or_else(|| {
            CliError::Usage("cannot determine config directory, use --config".to_string())
        })?,
    };

    let fs = RealFileSystem;
    if fs.exists(&path) && !force {
        return Err(CliError::Usage(format!(
            "config already exists: {} (use --force to overwrite)",
            path.display()
        )));
    }

    fs.write(&path, Settings::template().as_bytes())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    output::success(&format!("created {}", path.display()));
    Ok(())
}

fn cmd_config_path(explicit: Option<&Path>) -> CliResult<()> {
    match global_config_path() {
        Some(path) => {
            let state = if path.exists() { "exists" } else { "not found" };
            output::info(&format!("global:   {} ({state})", path.display()));
        }
        None => output::info("global:   <unavailable>"),
    }
    if let Some(path) = explicit {
        let state = if path.exists() { "exists" } else { "not found" };
        output::info(&format!("explicit: {} ({state})", path.display()));
    }
    Ok(())
}

fn write_stdout(bytes: &[u8]) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(bytes)
        .and_then(|()| stdout.flush())
        .map_err(|e| InfraError::io("write stdout", e))?;
    Ok(())
}
