//! The four-step generation workflow.
//!
//! ```text
//! Idle -> CredentialResolved -> PromptAssembled -> ResponseReceived -> Written
//!   \________________\__________________\_________________\______> Failed
//! ```
//!
//! Each step runs once, in order. The first error moves the pipeline to
//! [`Stage::Failed`] and is handed back to the caller; nothing here exits
//! the process.

use crate::config::Credential;
use crate::error::Result;
use crate::image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProvider, SourceImage,
};
use crate::prompt;
use std::path::{Path, PathBuf};

/// Output file name used when none is given.
pub const DEFAULT_OUTPUT: &str = "generated_product_image.png";

/// Where the pipeline is in its linear run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has happened yet.
    Idle,
    /// The API key was found.
    CredentialResolved,
    /// The final prompt is ready.
    PromptAssembled,
    /// The model returned an image.
    ResponseReceived,
    /// The image is on disk.
    Written,
    /// A step failed; the run is over.
    Failed,
}

/// Progress notifications emitted while the pipeline runs.
#[derive(Debug)]
pub enum Event<'a> {
    /// The prompt was built from `base` and the user's suffix.
    PromptAssembled {
        /// Base description the prompt started from.
        base: &'a str,
        /// Final text sent to the model.
        prompt: &'a str,
    },
    /// The request is about to go out.
    Generating {
        /// Display name of the provider.
        provider: &'a str,
        /// Source photo being sent.
        image: &'a Path,
    },
    /// The generated image was written.
    Saved {
        /// File the image was written to.
        path: &'a Path,
        /// Number of bytes written.
        bytes: usize,
    },
}

/// What to generate and where to put it.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Source product photo.
    pub image: PathBuf,
    /// Text appended to the base prompt.
    pub extra_prompt: String,
    /// Destination file.
    pub output: PathBuf,
    /// Replacement for [`prompt::BASE_DESCRIPTION`].
    pub base_prompt: Option<String>,
}

impl PipelineOptions {
    /// Options for `image` with an empty suffix and the default output path.
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            extra_prompt: String::new(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            base_prompt: None,
        }
    }

    /// Sets the prompt suffix.
    pub fn with_extra_prompt(mut self, extra: impl Into<String>) -> Self {
        self.extra_prompt = extra.into();
        self
    }

    /// Sets the destination file.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Replaces the built-in base prompt.
    pub fn with_base_prompt(mut self, base: impl Into<String>) -> Self {
        self.base_prompt = Some(base.into());
        self
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// File the image was written to.
    pub output: PathBuf,
    /// Prompt that was sent.
    pub prompt: String,
    /// Number of bytes written.
    pub size_bytes: usize,
    /// Format reported by the API, if recognized.
    pub format: Option<ImageFormat>,
    /// Display name of the provider.
    pub provider: String,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

/// A single-use run of the workflow.
#[derive(Debug)]
pub struct Pipeline {
    options: PipelineOptions,
    stage: Stage,
}

impl Pipeline {
    /// Creates an idle pipeline.
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            stage: Stage::Idle,
        }
    }

    /// Returns the current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Runs all four steps.
    ///
    /// `lookup` resolves environment values for the credential. `connect`
    /// builds the provider from the resolved credential and is only called
    /// once the credential is known, so a missing key never reaches the
    /// network.
    pub async fn run<L, F, P, R>(
        &mut self,
        lookup: L,
        connect: F,
        mut report: R,
    ) -> Result<Outcome>
    where
        L: Fn(&str) -> Option<String>,
        F: FnOnce(Credential) -> Result<P>,
        P: ImageProvider,
        R: FnMut(Event<'_>),
    {
        let result = self.run_steps(lookup, connect, &mut report).await;
        if let Err(ref e) = result {
            tracing::debug!(stage = ?self.stage, "pipeline failed: {e}");
            self.advance(Stage::Failed);
        }
        result
    }

    async fn run_steps<L, F, P, R>(
        &mut self,
        lookup: L,
        connect: F,
        report: &mut R,
    ) -> Result<Outcome>
    where
        L: Fn(&str) -> Option<String>,
        F: FnOnce(Credential) -> Result<P>,
        P: ImageProvider,
        R: FnMut(Event<'_>),
    {
        let credential = Credential::resolve(lookup)?;
        self.advance(Stage::CredentialResolved);

        let base = self
            .options
            .base_prompt
            .as_deref()
            .unwrap_or(prompt::BASE_DESCRIPTION);
        let final_prompt = prompt::assemble_with(base, &self.options.extra_prompt);
        report(Event::PromptAssembled {
            base: base.trim(),
            prompt: &final_prompt,
        });
        self.advance(Stage::PromptAssembled);

        let (image, provider) = self
            .generate(credential, &final_prompt, connect, report)
            .await?;
        self.advance(Stage::ResponseReceived);

        let output = self.options.output.clone();
        image.save(&output)?;
        report(Event::Saved {
            path: &output,
            bytes: image.size(),
        });
        self.advance(Stage::Written);

        Ok(Outcome {
            output,
            prompt: final_prompt,
            size_bytes: image.size(),
            format: image.format(),
            provider,
            metadata: image.metadata,
        })
    }

    async fn generate<F, P, R>(
        &self,
        credential: Credential,
        final_prompt: &str,
        connect: F,
        report: &mut R,
    ) -> Result<(GeneratedImage, String)>
    where
        F: FnOnce(Credential) -> Result<P>,
        P: ImageProvider,
        R: FnMut(Event<'_>),
    {
        let source = SourceImage::load(&self.options.image)?;
        let request = GenerationRequest::new(final_prompt, source)?;
        let provider = connect(credential)?;

        report(Event::Generating {
            provider: provider.name(),
            image: &self.options.image,
        });

        let image = provider.generate(&request).await?;
        Ok((image, provider.name().to_string()))
    }

    fn advance(&mut self, next: Stage) {
        tracing::info!(from = ?self.stage, to = ?next, "pipeline stage");
        self.stage = next;
    }
}
