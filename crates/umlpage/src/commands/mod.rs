//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod titles;
pub(crate) mod watch;

use std::path::{Path, PathBuf};

use clap::Args;
use umlpage_config::{CliSettings, Config};
use umlpage_engine::ImageFormat;
use umlpage_kroki::KrokiEngine;
use umlpage_render::{RenderOptions, RenderRequest};

use crate::error::CliError;

pub(crate) use render::RenderArgs;
pub(crate) use titles::TitlesArgs;
pub(crate) use watch::WatchArgs;

/// Arguments shared by every command that renders a document.
#[derive(Args)]
pub(crate) struct DocumentArgs {
    /// Diagram source file.
    input: PathBuf,

    /// Path to configuration file (default: auto-discover umlpage.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Zoom in percent (overrides config).
    #[arg(short, long)]
    zoom: Option<u32>,

    /// Output format, png or svg (overrides config).
    #[arg(short, long)]
    format: Option<ImageFormat>,

    /// Resample raster pages to this width (overrides config).
    #[arg(short, long)]
    width: Option<u32>,

    /// Kroki server URL (overrides config).
    #[arg(long, env = "UMLPAGE_KROKI_URL")]
    kroki_url: Option<String>,

    /// Extra include directory, searched after configured ones.
    #[arg(short = 'I', long = "include-dir")]
    include_dirs: Vec<PathBuf>,
}

/// Everything a command needs to render one document.
pub(crate) struct Session {
    pub config: Config,
    pub engine: KrokiEngine,
    pub options: RenderOptions,
    pub input: PathBuf,
}

impl DocumentArgs {
    /// Load config with CLI overrides and build the engine.
    pub(crate) fn session(&self) -> Result<Session, CliError> {
        if !self.input.is_file() {
            return Err(CliError::Validation(format!(
                "Input file not found: {}",
                self.input.display()
            )));
        }

        let cli_settings = CliSettings {
            zoom: self.zoom,
            format: self.format,
            width: self.width,
            kroki_url: self.kroki_url.clone(),
            include_dirs: self.include_dirs.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let engine =
            KrokiEngine::new(config.kroki.url.clone()).with_timeout(config.kroki.timeout());
        let options = RenderOptions {
            partial_marker: config.render_resolved.partial_marker.clone(),
            include_dirs: config.include_dirs.clone(),
        };
        tracing::debug!(
            kroki_url = engine.server_url(),
            config = ?config.config_path,
            "Loaded configuration"
        );

        Ok(Session {
            config,
            engine,
            options,
            input: self.input.clone(),
        })
    }
}

impl Session {
    /// Read the input file and build a request from the resolved config.
    pub(crate) fn request(&self) -> Result<RenderRequest, CliError> {
        let source = std::fs::read_to_string(&self.input)?;
        Ok(build_request(source, &self.input, &self.config))
    }

    /// Default primary output path: the input with the format's extension.
    pub(crate) fn default_output(&self) -> PathBuf {
        self.input
            .with_extension(self.config.render_resolved.format.extension())
    }

    /// Cache key for the input document.
    pub(crate) fn document_id(&self) -> String {
        self.input.display().to_string()
    }
}

/// Build a render request for `source` read from `input`.
///
/// Includes resolve relative to the input's directory.
fn build_request(source: String, input: &Path, config: &Config) -> RenderRequest {
    let render = &config.render_resolved;
    let mut request = RenderRequest::new(source)
        .zoom(render.zoom)
        .format(render.format)
        .width(render.width);
    if let Some(dir) = input.parent() {
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        request = request.base_dir(dir);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_request_uses_resolved_config() {
        let mut config = Config::default();
        config.render_resolved.zoom = 150;
        config.render_resolved.format = ImageFormat::Svg;
        config.render_resolved.width = Some(640);

        let request = build_request("A".to_owned(), Path::new("docs/flow.puml"), &config);
        assert_eq!(request.zoom_percent(), 150);
        assert_eq!(request.image_format(), ImageFormat::Svg);
        assert_eq!(request.target_width(), Some(640));
        assert_eq!(request.include_base(), Some(Path::new("docs")));
    }

    #[test]
    fn test_build_request_bare_file_name() {
        let request = build_request("A".to_owned(), Path::new("flow.puml"), &Config::default());
        assert_eq!(request.include_base(), Some(Path::new(".")));
    }
}
