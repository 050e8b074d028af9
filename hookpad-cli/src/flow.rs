// ABOUTME: Message flows tying webhooks, the response normalizer, fitting, and session saving together
// ABOUTME: Chat messages update the editor and hint line; editor content is sent for image generation

use crate::config::{Config, WebhookKind};
use crate::constants::{messages, timeouts};
use crate::fitting::{Container, FitResult, ImageFitter};
use crate::normalize::{normalize_response, Normalized};
use crate::session::{AppContext, AutoSaver};
use anyhow::{anyhow, Result};
use hookpad_sdk::{HookpadClient, WebhookRequest};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::path::PathBuf;
use std::time::Duration;

/// Collaborators shared by the flows.
pub struct FlowEnv<'a> {
    pub client: &'a HookpadClient,
    pub config: &'a Config,
    pub show_progress: bool,
}

/// Loading indicator that is cleared when dropped, whichever way the flow
/// exits.
struct Spinner(ProgressBar);

impl Spinner {
    fn start(message: &str, visible: bool) -> Self {
        if !visible {
            return Self(ProgressBar::hidden());
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(timeouts::PROGRESS_BAR_TICK_MS));
        Self(pb)
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

/// An image response written to disk.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub mime: String,
    pub dimensions: String,
    pub size: String,
    pub fit: Option<FitResult>,
}

#[derive(Debug, Clone)]
pub struct MessageOutcome {
    /// Editor content after the message
    pub editor: String,
    pub image: Option<GeneratedImage>,
    /// Line shown under the editor, when a summary webhook is configured
    pub hint: Option<String>,
    /// False when the chat webhook could not be reached
    pub connected: bool,
    /// The free-message limit is now used up
    pub quota_reached: bool,
}

#[derive(Debug, Clone)]
pub enum ContentOutcome {
    Text(String),
    Image(GeneratedImage),
}

/// Send a chat message and load the reply into the editor.
///
/// Fails only when the message quota is used up or no chat webhook is
/// configured. Transport failures become the fallback editor text.
pub async fn process_message(
    ctx: &mut AppContext,
    env: &FlowEnv<'_>,
    saver: Option<&mut AutoSaver>,
    message: &str,
) -> Result<MessageOutcome> {
    ctx.check_quota()?;
    let chat_url = env.config.require_webhook(WebhookKind::Chat)?;

    ctx.record_message();

    let request = WebhookRequest::new(message, ctx.session_id().as_str());
    let reply = {
        let _spinner = Spinner::start("Waiting for response...", env.show_progress);
        env.client.send_webhook(chat_url, &request).await
    };

    let (image, connected) = match reply {
        Ok(response) => {
            debug!("Chat webhook replied with {}", response.payload.kind());
            match normalize_response(&response) {
                Normalized::Text(text) => {
                    ctx.set_editor_content(text);
                    (None, true)
                }
                Normalized::Image(artifact) => {
                    match store_image(artifact, env, None) {
                        Ok(image) => {
                            ctx.set_editor_content(format!(
                                "// Image saved to {}",
                                image.path.display()
                            ));
                            (Some(image), true)
                        }
                        Err(text) => {
                            ctx.set_editor_content(text);
                            (None, true)
                        }
                    }
                }
            }
        }
        Err(err) => {
            warn!("Chat webhook failed: {}", err);
            ctx.set_editor_content(messages::CHAT_FALLBACK);
            (None, false)
        }
    };

    if connected {
        if let Some(saver) = saver {
            saver.content_changed(ctx);
        }
    }

    let hint = if connected {
        fetch_hint(ctx, env).await
    } else {
        Some(messages::HINT_CONNECTION_ERROR.to_string())
    };

    Ok(MessageOutcome {
        editor: ctx.editor_content().to_string(),
        image,
        hint,
        connected,
        quota_reached: ctx.quota_reached(),
    })
}

/// Ask the summary webhook for a hint about the current editor content.
async fn fetch_hint(ctx: &AppContext, env: &FlowEnv<'_>) -> Option<String> {
    let url = env.config.webhook(WebhookKind::Summary)?;
    let request = WebhookRequest::new(ctx.editor_content(), ctx.session_id().as_str());

    let _spinner = Spinner::start("Loading...", env.show_progress);
    match env.client.send_webhook(url, &request).await {
        Ok(response) => Some(match normalize_response(&response) {
            Normalized::Text(text) => text,
            Normalized::Image(_) => messages::IMAGE_TEXT.to_string(),
        }),
        Err(err) => {
            warn!("Summary webhook failed: {}", err);
            Some(messages::HINT_FAILED.to_string())
        }
    }
}

/// Send the editor content to the image webhook.
///
/// An image reply is fitted into `container` and saved to the output
/// directory. Transport failures become the fixed fallback text.
pub async fn send_editor_content(
    ctx: &AppContext,
    env: &FlowEnv<'_>,
    container: Box<dyn Container>,
) -> Result<ContentOutcome> {
    let content = ctx.editor_content().trim();
    if content.is_empty() {
        return Err(anyhow!("Editor is empty. Please add some content first."));
    }
    let url = env.config.require_webhook(WebhookKind::Image)?;

    let request = WebhookRequest::new(content, ctx.session_id().as_str());
    let reply = {
        let _spinner = Spinner::start("Generating...", env.show_progress);
        env.client.send_webhook(url, &request).await
    };

    let response = match reply {
        Ok(response) => response,
        Err(err) => {
            warn!("Error sending editor content: {}", err);
            return Ok(ContentOutcome::Text(messages::CONTENT_FALLBACK.to_string()));
        }
    };

    Ok(match normalize_response(&response) {
        Normalized::Text(text) => ContentOutcome::Text(text),
        Normalized::Image(artifact) => match store_image(artifact, env, Some(container)) {
            Ok(image) => ContentOutcome::Image(image),
            Err(text) => ContentOutcome::Text(text),
        },
    })
}

/// Load an artifact, fit it when a container is given, and save it. The
/// error side is the placeholder text to show instead.
fn store_image(
    artifact: crate::artifact::ImageArtifact,
    env: &FlowEnv<'_>,
    container: Option<Box<dyn Container>>,
) -> std::result::Result<GeneratedImage, String> {
    let mut fitter = ImageFitter::new(env.config.fit_config());
    if let Some(container) = container {
        fitter.observe_container(container);
    }

    let id = fitter.add_image(artifact);
    let fit = match fitter.mark_loaded(id) {
        Ok(fit) => fit,
        Err(err) => return Err(err.to_string()),
    };

    let image = fitter
        .image(id)
        .ok_or_else(|| messages::NO_RESPONSE_DATA.to_string())?;
    let artifact = image.artifact();

    let path = artifact
        .save_to(&env.config.output_dir())
        .map_err(|e| crate::artifact::error_placeholder(&e))?;

    Ok(GeneratedImage {
        path,
        mime: artifact.mime().to_string(),
        dimensions: artifact.dimensions_str(),
        size: artifact.size_str(),
        fit: if fitter.container_id().is_some() { fit } else { None },
    })
}
