use {
    std::{path::PathBuf, process::exit, sync::Arc},
    tracing::{info, error},
    clap::{Parser, Subcommand},
    viewcount_core::FunctionUrlEvent,
    viewcount_runtime::{
        config::{ServerConfig, function_from_config},
        logs::init_logger,
        server::CounterServer,
    },
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the counter over http, one invocation per request.
    Serve {
        config_file: String,
    },
    /// Run a single invocation and print the response.
    Invoke {
        config_file: String,

        #[arg(long, default_value = "/")]
        path: String,
    },
}

impl Command {
    fn config_file(&self) -> &str {
        match self {
            Self::Serve { config_file } | Self::Invoke { config_file, .. } => config_file,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(args.command.config_file()) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("failed to load config: {err}");
            exit(1);
        }
    };

    if let Err(err) = init_logger(&config.logger) {
        eprintln!("failed to init logger: {err}");
        exit(1);
    }
    info!("loaded config from {:?}", config.config_path);

    let function = match function_from_config(&config) {
        Ok(v) => Arc::new(v),
        Err(err) => {
            error!("failed to create function: {err}");
            exit(1);
        }
    };

    match args.command {
        Command::Serve { .. } => {
            let addr = match config.listen_addr() {
                Ok(v) => v,
                Err(err) => {
                    error!("{err}");
                    exit(1);
                }
            };

            let server = match CounterServer::bind(addr, function).await {
                Ok(v) => v,
                Err(err) => {
                    error!("{err}");
                    exit(1);
                }
            };

            server.serve(async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    error!("failed to listen for shutdown signal: {err:?}");
                }
            }).await;
        },
        Command::Invoke { path, .. } => {
            let event = FunctionUrlEvent::new().with_raw_path(path).with_method("GET");
            let response = tokio::task::spawn_blocking(move || function.handle(&event)).await;
            let response = match response {
                Ok(v) => v,
                Err(err) => {
                    error!("function failed: {err:?}");
                    exit(1);
                }
            };

            match serde_json::to_string_pretty(&response) {
                Ok(v) => println!("{v}"),
                Err(err) => {
                    error!("failed to serialize response: {err:?}");
                    exit(1);
                }
            }
        },
    }
}

fn load_config(config_file: &str) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let config_path = std::env::current_dir()?.join(config_file);
    Ok(ServerConfig::load(PathBuf::from(&config_path))?)
}
