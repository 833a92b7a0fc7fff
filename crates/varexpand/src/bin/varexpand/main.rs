mod cli;

use varexpand::environment::ProcessEnvironment;
use varexpand::sources::VariableSources;
use varexpand::{Expander, Expansions, Options};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("VAREXPAND_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Expand(expand_cli) => expand(expand_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn expand(cli: cli::ExpandCommand) -> anyhow::Result<()> {
    let options = Options {
        escapes: cli.expansion.escapes.into(),
    };
    let expander = expander(&cli.input, options)?;

    match expander.expand() {
        Ok(expansions) => output(&cli.output, &expansions),
        Err(err) => {
            tracing::debug!(partial=?err.partial, "expansion failed");
            Err(err.into())
        }
    }
}

fn expander(input: &cli::InputArgs, options: Options) -> anyhow::Result<Expander> {
    let vars = load(input)?.to_variables();

    Ok(if input.with_env {
        Expander::with_environment(&ProcessEnvironment, vars, options)
    } else {
        Expander::new(vars, options)
    })
}

fn load(input: &cli::InputArgs) -> anyhow::Result<VariableSources> {
    let mut sources = VariableSources::default();

    if input.files.is_empty() && input.directories.is_empty() && input.assignments.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        sources.insert(varexpand::sources::parse_dotenv(&stdin)?, None);
        return Ok(sources);
    }

    for file_path in &input.files {
        sources.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        sources.load_directory(dir_path)?;
    }

    if !input.assignments.is_empty() {
        let mut assignments = varexpand::Variables::default();
        for assignment in &input.assignments {
            let Some((key, value)) = assignment.split_once('=') else {
                anyhow::bail!("Invalid assignment '{assignment}', expected KEY=VALUE");
            };
            assignments.insert(key.to_string(), value.to_string());
        }
        sources.insert(assignments, None);
    }

    Ok(sources)
}

fn output(output: &cli::OutputArgs, expansions: &Expansions) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), expansions)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), expansions)?,
        cli::OutputFormat::Dotenv => print!("{}", varexpand::sources::render_dotenv(expansions)),
    };

    Ok(())
}

/// (varexpand-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    match cli.command {
        Sources(input) => {
            for (index, source, key, value) in load(&input)?.entries() {
                let source = source
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "<args>".into());
                println!("[{index}] {source}: {key}={value}");
            }
        }
        Graph(graph_cli) => {
            let graph = expander(&graph_cli.input, Options::default())?.graph();
            match graph_cli.output.format {
                cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), &graph)?,
                cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), &graph)?,
                cli::OutputFormat::Dotenv => print!("{graph}"),
            }
        }
        Order(input) => {
            for (index, name) in expander(&input, Options::default())?.order()?.iter().enumerate() {
                println!("[{index}] {name}");
            }
        }
    }

    Ok(())
}
