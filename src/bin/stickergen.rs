//! CLI for stickergen - chibi stickers from character photos.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use stickergen::{
    ExpressionMode, GeminiModel, GeminiSticker, GenerationStatus, ImagePayload, StickerProvider,
    StickerSession, SUGGESTED_PROMPTS,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stickergen")]
#[command(about = "Turn a character photo into a chibi sticker via the Gemini image API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sticker from a character photo
    Generate(GenerateArgs),

    /// List suggested emotion prompts
    Prompts,

    /// Check that the Gemini service is reachable and the API key works
    Check(CheckArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Path to the character image (png, jpeg or webp)
    input: PathBuf,

    /// The emotion or action for the sticker, e.g. "Crying with waterfall tears"
    #[arg(
        short,
        long,
        required_unless_present = "keep_original",
        conflicts_with = "keep_original"
    )]
    prompt: Option<String>,

    /// Keep the character's expression and pose from the original image
    #[arg(long)]
    keep_original: bool,

    /// Which character to transform when the photo shows several,
    /// e.g. "the boy in the blue shirt on the left"
    #[arg(short, long)]
    subject: Option<String>,

    /// Output file path (defaults to q-meme-<timestamp>.png in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Gemini model variant
    #[arg(long, value_enum, default_value = "flash")]
    model: ModelArg,

    /// Retries on transient failures (rate limits, timeouts, network errors)
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,
}

#[derive(Args)]
struct CheckArgs {
    /// Gemini model variant
    #[arg(long, value_enum, default_value = "flash")]
    model: ModelArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// Gemini 2.5 Flash Image
    Flash,
    /// Gemini 3 Pro Image
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::Flash,
            ModelArg::Pro => GeminiModel::Pro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stickergen=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await,
        Commands::Prompts => list_prompts(cli.json),
        Commands::Check(args) => check(args, cli.json).await,
    }
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let image = ImagePayload::from_file(&args.input)
        .map_err(|e| anyhow::anyhow!("cannot use {}: {e}", args.input.display()))?;

    let provider = GeminiSticker::builder()
        .model(args.model.into())
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let mut session = StickerSession::new();
    session.set_image(image);
    if args.keep_original {
        session.set_mode(ExpressionMode::KeepOriginal);
    } else {
        session.set_prompt(args.prompt.unwrap_or_default());
    }
    if let Some(subject) = args.subject {
        session.set_subject(subject);
    }

    match session.generate_with(&provider, args.retries).await {
        GenerationStatus::Success(sticker) => {
            let path = match args.output {
                Some(path) => {
                    sticker.save(&path)?;
                    path
                }
                None => sticker.save_timestamped(".")?,
            };

            if json_output {
                let result = serde_json::json!({
                    "success": true,
                    "output": path.display().to_string(),
                    "size_bytes": sticker.size(),
                    "format": sticker.format.extension(),
                    "model": sticker.metadata.model,
                    "duration_ms": sticker.metadata.duration_ms,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Saved sticker: {} ({} bytes)", path.display(), sticker.size());
                if let Some(duration) = sticker.metadata.duration_ms {
                    println!("Duration: {}ms", duration);
                }
            }
            Ok(())
        }
        GenerationStatus::Error(message) => anyhow::bail!("{message}"),
        // begin() refused: clap guarantees a prompt flag, but it may be blank
        _ => anyhow::bail!("an image and a non-empty prompt are required"),
    }
}

fn list_prompts(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&SUGGESTED_PROMPTS)?);
    } else {
        println!("Suggested prompts:\n");
        for prompt in SUGGESTED_PROMPTS {
            println!("  {prompt}");
        }
    }
    Ok(())
}

async fn check(args: CheckArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = GeminiSticker::builder().model(args.model.into()).build()?;
    provider.health_check().await?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "provider": provider.name(),
                "ok": true,
            }))?
        );
    } else {
        println!("{}: ok", provider.name());
    }
    Ok(())
}
