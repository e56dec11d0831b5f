#![warn(missing_docs)]
//! product-shot - professional product photos from a phone snapshot.
//!
//! Sends a source image and a product-photography prompt to Gemini's image
//! model and writes the returned image to disk.
//!
//! # Quick Start
//!
//! ```no_run
//! use product_shot::{Credential, GeminiProvider, Pipeline, PipelineOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> product_shot::Result<()> {
//!     let options = PipelineOptions::new("kurta.jpg").with_extra_prompt("on a marble tabletop");
//!     let outcome = Pipeline::new(options)
//!         .run(
//!             |name| std::env::var(name).ok(),
//!             |credential| GeminiProvider::builder().credential(credential).build(),
//!             |_| {},
//!         )
//!         .await?;
//!     println!("saved {} bytes to {}", outcome.size_bytes, outcome.output.display());
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! - `GOOGLE_API_KEY`: required, may come from a `.env` file
//!   (see [`config::load_dotenv`]).
//! - `GEMINI_BASE_URL`: optional API root override.

pub mod config;
mod error;
pub mod image;
pub mod pipeline;
pub mod prompt;

// Re-export error types at crate root
pub use error::{Error, ErrorKind, Result};

pub use config::{Credential, Settings};
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};
pub use image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProvider, SourceImage,
};
pub use pipeline::{Event, Outcome, Pipeline, PipelineOptions, Stage, DEFAULT_OUTPUT};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::Credential;
    pub use crate::error::{Error, Result};
    pub use crate::image::providers::GeminiProvider;
    pub use crate::image::{GeneratedImage, GenerationRequest, ImageProvider};
    pub use crate::pipeline::{Pipeline, PipelineOptions};
}
