use clap::Parser;
use dbchat::ai_sql::{create_ai_client, AiProviderType, AiSqlEngine, ApiKey};
use dbchat::chat::{ChatBot, ReedlineReader, RequestLoop};
use dbchat::cli::Args;
use dbchat::config::Config;
use dbchat::database::{create_database_client, sanitize_connection_url, ConnectionInfo};
use dbchat::logging;
use nu_ansi_term::Color;
use std::error::Error as StdError;
use std::io;
use tracing::{debug, info};

/// Key from the provider's environment variable, else a no-echo prompt
fn read_api_key(provider: AiProviderType) -> Result<ApiKey, Box<dyn StdError>> {
    let env_var = provider.api_key_env_var();
    if let Some(key) = std::env::var(env_var).ok().and_then(ApiKey::new) {
        debug!("Using API key from {}", env_var);
        return Ok(key);
    }

    let entered = rpassword::prompt_password(format!("{} API key: ", provider.display_name()))?;
    ApiKey::new(entered).ok_or_else(|| {
        format!(
            "No {} API key provided (set {} or enter it when prompted)",
            provider.display_name(),
            env_var
        )
        .into()
    })
}

fn load_config(args: &Args) -> Result<Config, Box<dyn StdError>> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

/// Answer each `-c` question in order; true if all succeeded
async fn run_commands(bot: &mut ChatBot, commands: &[String]) -> bool {
    let mut all_ok = true;
    for question in commands {
        match bot.respond(question).await {
            Ok(answer) => println!("{answer}"),
            Err(e) => {
                eprintln!("{}", Color::Red.paint(e.user_message()));
                all_ok = false;
            }
        }
    }
    all_ok
}

async fn async_main() -> Result<bool, Box<dyn StdError>> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let logging_guard = match logging::init(&config, args.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {e}");
            None
        }
    };
    info!("dbchat {} started", env!("CARGO_PKG_VERSION"));
    if let Some(path) = logging_guard.as_ref().and_then(|guard| guard.log_file()) {
        debug!("Logging to {}", path.display());
    }
    debug!("{:?}", args);

    let api_key = read_api_key(config.ai_sql.provider)?;
    let ai_client = create_ai_client(&config.ai_sql, api_key)?;

    let connection_info = ConnectionInfo::parse(&config.database_url)?;
    let database_type = connection_info.database_type;
    info!(
        "Connecting to {}",
        sanitize_connection_url(&config.database_url)
    );
    let database = create_database_client(connection_info).await.map_err(|e| {
        format!(
            "Could not connect to {}: {e}",
            sanitize_connection_url(&config.database_url)
        )
    })?;

    let engine = AiSqlEngine::new(config.ai_sql.clone(), ai_client, database_type);
    let mut bot = ChatBot::new(database, engine, config.chat.clone());

    let success = if args.command.is_empty() {
        let history_path = Config::history_path().ok();
        let mut repl = RequestLoop::new(ReedlineReader::new(history_path), io::stdout());
        repl.run(&mut bot).await?;
        true
    } else {
        run_commands(&mut bot, &args.command).await
    };

    bot.close().await;
    info!("dbchat stopped");
    Ok(success)
}

fn main() {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let result = runtime.block_on(async_main());
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", Color::Red.paint(format!("Error: {e}")));
            std::process::exit(1);
        }
    }
}
