//! CLI for product-shot - image-to-image product photography via Gemini.

use clap::{Parser, ValueEnum};
use product_shot::config::{self, Settings};
use product_shot::{
    Event, GeminiModel, GeminiProvider, Outcome, Pipeline, PipelineOptions, DEFAULT_OUTPUT,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "product-shot")]
#[command(about = "An image-to-image generation pipeline using the Gemini API")]
#[command(version)]
struct Cli {
    /// Path to the input image file
    #[arg(long)]
    image: PathBuf,

    /// Extra text to add to the generation prompt (e.g. 'on a marble tabletop')
    #[arg(long = "extra_prompt", visible_alias = "extra-prompt", default_value = "")]
    extra_prompt: String,

    /// Path to save the output image file
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Gemini model to use
    #[arg(long, value_enum, env = "GEMINI_MODEL", default_value = "flash-image")]
    model: ModelArg,

    /// Replace the built-in product photography prompt
    #[arg(long)]
    base_prompt: Option<String>,

    /// Output a JSON summary instead of progress text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    FlashImage,
    FlashImagePreview,
    ProImage,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::FlashImage => GeminiModel::FlashImage,
            ModelArg::FlashImagePreview => GeminiModel::FlashImagePreview,
            ModelArg::ProImage => GeminiModel::ProImage,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // .env may carry GEMINI_MODEL, so it has to be loaded before parsing.
    config::load_dotenv();
    let cli = Cli::parse();
    let json_output = cli.json;

    let result = match generate(cli).await {
        Ok(outcome) if json_output => print_json(&outcome).map(|()| outcome),
        other => other,
    };
    if let Err(e) = &result {
        eprintln!("\n❌ An error occurred: {e:#}");
    }
    ExitCode::from(exit_status(&result))
}

/// Process exit status for a finished run: 0 once the image is written
/// (and the summary printed), 1 for any failure.
fn exit_status(result: &anyhow::Result<Outcome>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

async fn generate(cli: Cli) -> anyhow::Result<Outcome> {
    let settings = Settings::from_env();

    let mut options = PipelineOptions::new(&cli.image)
        .with_extra_prompt(&cli.extra_prompt)
        .with_output(&cli.output);
    if let Some(base) = cli.base_prompt {
        options = options.with_base_prompt(base);
    }

    let model = GeminiModel::from(cli.model);
    let quiet = cli.json;

    let outcome = Pipeline::new(options)
        .run(
            |name| std::env::var(name).ok(),
            |credential| {
                let mut builder = GeminiProvider::builder()
                    .credential(credential)
                    .model(model);
                if let Some(url) = settings.base_url {
                    builder = builder.base_url(url);
                }
                builder.build()
            },
            |event| {
                if !quiet {
                    print_progress(&event);
                }
            },
        )
        .await?;

    Ok(outcome)
}

fn print_progress(event: &Event<'_>) {
    match event {
        Event::PromptAssembled { base, prompt } => {
            println!("--- Step 1: Using Product Photography Prompt ---");
            println!("\nUsing Base Prompt:\n---\n{base}\n---\n");
            println!("Final Combined Prompt: '{prompt}'");
        }
        Event::Generating { provider, image } => {
            println!("\n--- Step 2: Generating New Image from Image + Text ---");
            println!(
                "-> Generating new image from {} with {provider}...",
                image.display()
            );
        }
        Event::Saved { path, bytes } => {
            println!(
                "\n✅ Success! Image saved to '{}' ({bytes} bytes)",
                path.display()
            );
        }
    }
}

fn print_json(outcome: &Outcome) -> anyhow::Result<()> {
    let result = serde_json::json!({
        "type": "image",
        "success": true,
        "output": outcome.output.display().to_string(),
        "size_bytes": outcome.size_bytes,
        "format": outcome.format.map(|f| f.extension()),
        "provider": outcome.provider,
        "model": outcome.metadata.model,
        "duration_ms": outcome.metadata.duration_ms,
        "prompt": outcome.prompt,
    });
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["product-shot", "--image", "shoe.jpg"]).unwrap();
        assert_eq!(cli.image, PathBuf::from("shoe.jpg"));
        assert_eq!(cli.extra_prompt, "");
        assert_eq!(cli.output, PathBuf::from("generated_product_image.png"));
        assert!(matches!(cli.model, ModelArg::FlashImage));
        assert!(cli.base_prompt.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_extra_prompt_spellings() {
        let cli = Cli::try_parse_from([
            "product-shot",
            "--image",
            "shoe.jpg",
            "--extra_prompt",
            "on a marble tabletop",
        ])
        .unwrap();
        assert_eq!(cli.extra_prompt, "on a marble tabletop");

        let cli = Cli::try_parse_from([
            "product-shot",
            "--image",
            "shoe.jpg",
            "--extra-prompt",
            "in soft light",
            "--output",
            "out.webp",
            "--model",
            "pro-image",
        ])
        .unwrap();
        assert_eq!(cli.extra_prompt, "in soft light");
        assert_eq!(cli.output, PathBuf::from("out.webp"));
        assert_eq!(GeminiModel::from(cli.model), GeminiModel::ProImage);
    }

    #[test]
    fn test_model_reads_gemini_model_env() {
        let command = Cli::command();
        let model = command
            .get_arguments()
            .find(|arg| arg.get_id() == "model")
            .unwrap();
        assert_eq!(model.get_env(), Some(std::ffi::OsStr::new("GEMINI_MODEL")));
    }

    #[test]
    fn test_exit_status() {
        let outcome = Outcome {
            output: PathBuf::from("out.png"),
            prompt: "A shoe".into(),
            size_bytes: 8,
            format: None,
            provider: "Gemini (Google)".into(),
            metadata: Default::default(),
        };
        assert_eq!(exit_status(&Ok(outcome)), 0);

        let failure: product_shot::Error = product_shot::Error::Config("no key".into());
        assert_eq!(exit_status(&Err(failure.into())), 1);
        assert_eq!(exit_status(&Err(anyhow::anyhow!("broken pipe"))), 1);
    }

    #[test]
    fn test_image_is_required() {
        assert!(Cli::try_parse_from(["product-shot"]).is_err());
    }
}
