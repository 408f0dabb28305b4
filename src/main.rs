use std::collections::HashMap;
use std::io::{IsTerminal, Read};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chorus::config::{DEFAULT_CONFIG_DIR, Runtime};
use chorus::orchestrator::DispatchRequest;
use chorus::provider::ProviderId;
use chorus::server;

#[derive(Parser)]
#[command(name = "chorus", version, about = "Ask several LLM providers at once")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    ask: AskArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Args)]
struct AskArgs {
    /// Prompt text; read from stdin when omitted.
    prompt: Option<String>,

    /// Prompt text as a flag, for callers that prefer it over the positional.
    #[arg(long = "prompt", value_name = "TEXT", conflicts_with = "prompt")]
    prompt_flag: Option<String>,

    /// System instruction shared by every provider.
    #[arg(long)]
    system: Option<String>,

    /// Ask only OpenAI (combine flags to pick a subset; default is everyone).
    #[arg(long)]
    openai: bool,

    /// Ask only Claude.
    #[arg(long)]
    claude: bool,

    /// Ask only Gemini.
    #[arg(long)]
    gemini: bool,

    #[arg(long)]
    openai_model: Option<String>,

    #[arg(long)]
    claude_model: Option<String>,

    #[arg(long)]
    gemini_model: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long)]
    max_tokens: Option<u32>,

    /// Per-attempt deadline in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Ask the models to spell out their reasoning.
    #[arg(long)]
    show_reasoning: bool,

    /// Apply persisted per-provider override files.
    #[arg(long)]
    use_model_config: bool,

    /// Print the raw aggregate as JSON instead of formatted text.
    #[arg(long)]
    json: bool,

    /// Directory holding persisted override files.
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chorus=info")))
        .init();

    let cli = Cli::parse();
    let config_dir = cli.ask.config_dir.clone();
    let runtime = match Runtime::from_env(&config_dir) {
        Ok(runtime) => Arc::new(runtime),
        Err(err) => {
            eprintln!("failed to initialize: {err}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::Serve { port }) => {
            if let Err(err) = server::serve(runtime, port).await {
                eprintln!("server error: {err}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        None => run_ask(runtime, cli.ask).await,
    }
}

async fn run_ask(runtime: Arc<Runtime>, args: AskArgs) -> ExitCode {
    let Some(prompt) = resolve_prompt(args.prompt.clone().or(args.prompt_flag.clone())) else {
        eprintln!("error: no prompt given (pass it as an argument or on stdin)");
        return ExitCode::FAILURE;
    };

    let mut providers = Vec::new();
    if args.openai {
        providers.push(ProviderId::OpenAi);
    }
    if args.claude {
        providers.push(ProviderId::Claude);
    }
    if args.gemini {
        providers.push(ProviderId::Gemini);
    }
    if providers.is_empty() {
        providers = ProviderId::ALL.to_vec();
    }

    let mut models = HashMap::new();
    if let Some(model) = args.openai_model.clone() {
        models.insert(ProviderId::OpenAi, model);
    }
    if let Some(model) = args.claude_model.clone() {
        models.insert(ProviderId::Claude, model);
    }
    if let Some(model) = args.gemini_model.clone() {
        models.insert(ProviderId::Gemini, model);
    }

    let request = DispatchRequest {
        prompt,
        system: args.system,
        providers,
        models,
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        timeout_ms: args.timeout_ms,
        show_reasoning: args.show_reasoning,
        use_model_config: args.use_model_config,
        ..Default::default()
    };

    let aggregate = runtime.orchestrator.dispatch(request).await;

    if args.json {
        match serde_json::to_string_pretty(&aggregate) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("failed to render result: {err}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    for (provider, outcome) in &aggregate {
        println!(
            "=== {provider} ({model}, {latency}ms) ===",
            model = outcome.model,
            latency = outcome.latency_ms
        );
        match (&outcome.text, &outcome.error) {
            (Some(text), _) => println!("{text}\n"),
            (None, Some(error)) => println!("error: {error}\n"),
            (None, None) => println!("(empty)\n"),
        }
    }
    ExitCode::SUCCESS
}

fn resolve_prompt(arg: Option<String>) -> Option<String> {
    if let Some(prompt) = arg {
        let prompt = prompt.trim().to_string();
        if !prompt.is_empty() {
            return Some(prompt);
        }
    }
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer).ok()?;
    let prompt = buffer.trim().to_string();
    if prompt.is_empty() { None } else { Some(prompt) }
}
