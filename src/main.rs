use clap::{Parser, Subcommand};
use sfk::{
    config::{LoggingConfig, SecretStoreConfig, Settings},
    observability::{init_logging, log_config_info, root_span},
    Result, SecretsContext, APP_NAME, VERSION,
};
use tracing::{error, info, Instrument};

#[derive(Parser)]
#[command(name = "sfk")]
#[command(about = "Secret store administration for sfk services")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Environment name; selects config/{env}.json
    #[arg(long, global = true)]
    env: Option<String>,

    /// Directory holding the configuration files
    #[arg(long, global = true, default_value = sfk::config::DEFAULT_CONFIG_DIR)]
    config_dir: std::path::PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value of the secret named by a configuration key
    ValueOf {
        /// Configuration key holding the secret name
        config_key: String,
    },

    /// Create or overwrite a secret
    Create {
        /// Secret name
        name: String,

        /// Secret value; a random value is generated when omitted
        #[arg(long)]
        value: Option<String>,
    },

    /// Delete a secret
    Delete {
        /// Secret name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();

    let settings = Settings::load_from_dir(&cli.config_dir, cli.env.as_deref())?;
    init_logging(&LoggingConfig::from_env(settings.env()))?;
    let span = root_span(settings.env());

    async move {
        info!(app_name = APP_NAME, version = VERSION, "Starting sfk");

        let store_config = SecretStoreConfig::from_env();
        log_config_info(&store_config);

        let context = SecretsContext::initialize(settings, store_config)?;
        let result = run(&context, cli.command).await;
        context.shutdown();

        if let Err(e) = &result {
            error!(error = %e, "Command failed");
        }
        result
    }
    .instrument(span)
    .await
}

async fn run(context: &SecretsContext, command: Commands) -> Result<()> {
    let secrets = context.secrets();

    match command {
        Commands::ValueOf { config_key } => {
            let value = secrets.value_of(&config_key).await?;
            println!("{}", value.expose_secret());
        }
        Commands::Create { name, value } => {
            let created = secrets.create(&name, value.as_deref()).await?;
            println!("{}", created.expose_secret());
        }
        Commands::Delete { name } => {
            secrets.delete(&name).await?;
            println!("Deleted secret '{}'", name);
        }
    }

    Ok(())
}
