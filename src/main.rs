//! # Holicard CLI
//!
//! Command-line interface for the holiday postcard maker.
//!
//! ## Usage
//!
//! ```bash
//! # Run the web UI
//! GEMINI_API_KEY=... holicard serve --listen 0.0.0.0:8080
//!
//! # Make a card from the terminal and save both faces as PNG
//! holicard generate --to Sam --from Ana --holiday "New Year" --vibe funny
//!
//! # Use your own words, skip the artwork, and print a WhatsApp link
//! holicard generate --to Sam --from Ana --message "See you soon!" --no-image --share whatsapp
//! ```

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use holicard::{
    CardError, FormModel, GenerationOrchestrator, PostcardFont,
    export::{CardExporter, CanvasRasterizer, DEFAULT_FONT_BASE_URL, FontCache, RenderOptions},
    form::{Holiday, Vibe},
    generation::{GeminiConfig, GeminiService},
    server::{self, ServerConfig},
    share::{
        NativeShareError, ShareChannel, ShareDispatcher, ShareFile, ShareOutcome, SharePayload,
        SharePlatform, ShareRoute,
    },
};

/// Holicard - AI holiday postcard maker
#[derive(Parser, Debug)]
#[command(name = "holicard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Gemini connection settings.
#[derive(Args, Debug)]
struct GeminiArgs {
    /// Gemini API key (falls back to API_KEY)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL")]
    gemini_base_url: Option<String>,

    /// Model used to write the wish
    #[arg(long, env = "GEMINI_TEXT_MODEL")]
    text_model: Option<String>,

    /// Model used to paint the artwork
    #[arg(long, env = "GEMINI_IMAGE_MODEL")]
    image_model: Option<String>,
}

impl GeminiArgs {
    fn into_config(self) -> GeminiConfig {
        let mut config = GeminiConfig::from_env();
        if let Some(key) = self.api_key.filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(key);
        }
        if let Some(url) = self.gemini_base_url {
            config.base_url = url;
        }
        if let Some(model) = self.text_model {
            config.text_model = model;
        }
        if let Some(model) = self.image_model {
            config.image_model = model;
        }
        config
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web UI and JSON API
    Serve {
        /// Address to listen on
        #[arg(long, env = "HOLICARD_LISTEN", default_value = "0.0.0.0:8080")]
        listen: String,

        /// Where exports fetch the card fonts from (google/fonts layout)
        #[arg(long, env = "HOLICARD_FONT_BASE_URL", default_value = DEFAULT_FONT_BASE_URL)]
        font_base_url: String,

        /// Never download fonts; exports use the built-in bitmap face
        #[arg(long)]
        offline_fonts: bool,

        #[command(flatten)]
        gemini: GeminiArgs,
    },

    /// Generate a postcard and save both faces
    Generate {
        /// Recipient name
        #[arg(long)]
        to: String,

        /// Sender name
        #[arg(long)]
        from: String,

        /// Christmas, New Year, Hanukkah, Kwanzaa, Winter Solstice, Thanksgiving
        #[arg(long, default_value = "Christmas")]
        holiday: Holiday,

        /// Heartfelt, Funny, Professional, Poetic, Short & Sweet
        #[arg(long, default_value = "Heartfelt")]
        vibe: Vibe,

        /// Optional theme, e.g. "Snowy Cabin"
        #[arg(long)]
        theme: Option<String>,

        /// Use this message instead of generating one
        #[arg(long)]
        message: Option<String>,

        /// Skip the AI artwork
        #[arg(long)]
        no_image: bool,

        /// Message font: Simple, Elegant, Festive, Script (or a family name)
        #[arg(long, default_value = "Nunito")]
        font: PostcardFont,

        /// Output directory
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,

        /// Pixel density of the saved images (1-4)
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=4))]
        density: u32,

        /// Print a share link for this channel (whatsapp or email)
        #[arg(long)]
        share: Option<ShareChannel>,

        /// Font source for the saved images
        #[arg(long, env = "HOLICARD_FONT_BASE_URL", default_value = DEFAULT_FONT_BASE_URL)]
        font_base_url: String,

        /// Never download fonts; use the built-in bitmap face
        #[arg(long)]
        offline_fonts: bool,

        #[command(flatten)]
        gemini: GeminiArgs,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("holicard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CardError> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Serve {
            listen,
            font_base_url,
            offline_fonts,
            gemini,
        } => {
            let config = gemini.into_config();
            if config.api_key.is_none() {
                tracing::warn!("no Gemini API key set, only custom messages will work");
            }
            let service = GeminiService::new(client, config);
            let server_config = ServerConfig {
                listen_addr: listen,
                font_base_url: (!offline_fonts).then_some(font_base_url),
            };
            server::serve(server_config, Arc::new(service)).await
        }

        Commands::Generate {
            to,
            from,
            holiday,
            vibe,
            theme,
            message,
            no_image,
            font,
            out,
            density,
            share,
            font_base_url,
            offline_fonts,
            gemini,
        } => {
            let form = FormModel {
                recipient: to,
                sender: from,
                holiday,
                vibe,
                theme: theme.unwrap_or_default(),
                custom_message: message.unwrap_or_default(),
                include_image: !no_image,
            };
            let request = form.to_request()?;

            let config = gemini.into_config();
            if config.api_key.is_none() && request.custom_message().is_none() {
                return Err(CardError::Config(
                    "GEMINI_API_KEY is not set; set it or pass --message".to_string(),
                ));
            }
            let service = GeminiService::new(client.clone(), config);
            let orchestrator = GenerationOrchestrator::new(Arc::new(service));

            eprintln!("Generating {} card for {}...", holiday, form.recipient.trim());
            orchestrator.submit(request).await?;
            let record = orchestrator.set_font(font).await?;
            println!("{}\n\n{}\n", record.headline(), record.message);

            let fonts = if offline_fonts {
                FontCache::offline()
            } else {
                FontCache::new(client.clone(), font_base_url)
            };
            let exporter = CardExporter::new(Arc::new(CanvasRasterizer), Arc::new(fonts), client)
                .with_options(RenderOptions {
                    pixel_density: density,
                    ..Default::default()
                });

            let (front, back) = exporter.export_faces(&record, exporter.options()).await?;
            for image in [&front, &back] {
                let path = image.save(&out)?;
                println!("Saved {} ({}x{})", path.display(), image.width, image.height);
            }

            if let Some(channel) = share {
                let dispatcher = ShareDispatcher::new();
                match dispatcher
                    .dispatch(channel, &record, &exporter, &TerminalPlatform)
                    .await
                {
                    ShareOutcome::Done(ShareRoute::Link(url)) => {
                        info!(%channel, "share link ready");
                        println!("\nShare link:\n{}", url);
                    }
                    ShareOutcome::Done(ShareRoute::Native)
                    | ShareOutcome::Aborted
                    | ShareOutcome::Ignored => {}
                    ShareOutcome::Failed(e) => return Err(e),
                }
            }

            Ok(())
        }
    }
}

/// The terminal has no share sheet; links are printed for the user to open.
struct TerminalPlatform;

#[async_trait]
impl SharePlatform for TerminalPlatform {
    fn is_mobile(&self) -> bool {
        false
    }

    fn supports_native_share(&self) -> bool {
        false
    }

    fn can_share_files(&self, _files: &[ShareFile]) -> bool {
        false
    }

    async fn share(&self, _payload: SharePayload) -> Result<(), NativeShareError> {
        Err(NativeShareError::Failed(
            "no share sheet in a terminal".to_string(),
        ))
    }

    async fn open_url(&self, _url: &str) -> Result<(), CardError> {
        Ok(())
    }
}
