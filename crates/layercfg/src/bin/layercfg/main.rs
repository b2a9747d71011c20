mod cli;

use layercfg::{Config, Configuration, StackedConfig, Value};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("LAYERCFG_LOG"))
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
        cli::Command::Get(get_cli) => get(get_cli),
        cli::Command::Has(has_cli) => has(has_cli),
        cli::Command::All(all_cli) => all(all_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    match command_result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            for error in e.chain() {
                eprintln!("{error}")
            }
            std::process::exit(2);
        }
    }
}

pub fn get(cli: cli::GetCommand) -> anyhow::Result<bool> {
    let mut config = load(&cli.input)?;

    let value = match (config.get(&cli.key)?, cli.default) {
        (Some(value), _) => value,
        (None, Some(default)) => parse_value(&default),
        (None, None) => anyhow::bail!("Key not found: {}", cli.key),
    };

    output(&cli.output, &value)?;
    Ok(true)
}

pub fn has(cli: cli::HasCommand) -> anyhow::Result<bool> {
    let mut config = load(&cli.input)?;
    Ok(config.has(&cli.key)?)
}

pub fn all(cli: cli::AllCommand) -> anyhow::Result<bool> {
    let mut config = load(&cli.input)?;
    let value = Value::Object(config.all()?);

    output(&cli.output, &value)?;
    Ok(true)
}

fn inputs(input: &cli::InputArgs) -> anyhow::Result<Vec<Config>> {
    let mut configs = vec![];

    for path in &input.inputs {
        configs.push(Config::new(path.as_path())?);
    }

    if input.workdir {
        configs.push(Config::new(std::env::current_dir()?)?);
    }

    anyhow::ensure!(
        !configs.is_empty(),
        "No inputs given, use --input or --input-workdir"
    );

    Ok(configs)
}

fn load(input: &cli::InputArgs) -> anyhow::Result<StackedConfig> {
    let mut config = StackedConfig::default();
    for layer in inputs(input)? {
        config.push(layer);
    }

    for (key, value) in &input.overrides {
        config.set(key, parse_value(value))?;
    }

    Ok(config)
}

/// json if possible, string otherwise
fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}

fn output(output: &cli::OutputArgs, value: &Value) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), value)?;
            println!();
        }
    };

    Ok(())
}

/// (layercfg-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<bool> {
    use cli::DevSubCommand::*;

    match cli.command {
        Inspect => {
            for mut config in inputs(&cli.input)? {
                println!("{:#?}", config.inspect()?);
            }
        }
    }

    Ok(true)
}
