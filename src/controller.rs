//! Screen state for one card: input, loaded profile, loading flag, last error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::rendering::{CardCanvas, Surface};
use crate::{AvatarTask, Error, ProfileRecord, ProfileSource, Result};

pub struct ViewController<P: ProfileSource + ?Sized> {
    source: Arc<P>,
    input: String,
    profile: Option<ProfileRecord>,
    loading: bool,
    error: Option<String>,
}

impl<P: ProfileSource + ?Sized + 'static> ViewController<P> {
    pub fn new(source: Arc<P>) -> Self {
        Self {
            source,
            input: String::new(),
            profile: None,
            loading: false,
            error: None,
        }
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn profile(&self) -> Option<&ProfileRecord> {
        self.profile.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the submit control would be enabled
    pub fn can_submit(&self) -> bool {
        !self.loading && !self.input.trim().is_empty()
    }

    /// Fetch the profile named by the input. Failures end up in
    /// [`error`](Self::error) and clear any previously loaded profile.
    pub fn submit(&mut self) {
        let identifier = self.input.trim().to_string();
        if identifier.is_empty() {
            return;
        }

        self.loading = true;
        self.error = None;
        match self.source.fetch(&identifier) {
            Ok(profile) => {
                self.profile = Some(profile);
                self.error = None;
            }
            Err(e) => {
                log::warn!("Error fetching GitHub data for {}: {}", identifier, e);
                self.profile = None;
                self.error = Some(e.to_string());
            }
        }
        self.loading = false;
    }

    /// Render the loaded profile and start its avatar download.
    pub fn render<S: Surface>(&self, canvas: &mut CardCanvas<S>) -> Option<AvatarTask> {
        let profile = self.profile.as_ref()?;
        let slot = canvas.render(profile);
        Some(AvatarTask::spawn(self.source.clone(), slot, canvas.generation()))
    }

    /// `<login>-github-card.png` for the loaded profile
    pub fn export_file_name(&self) -> Option<String> {
        self.profile.as_ref().map(|p| format!("{}-github-card.png", p.login))
    }

    /// Encode the canvas as PNG and write it into `dir`.
    pub fn export<S: Surface>(&self, canvas: &CardCanvas<S>, dir: &Path) -> Result<PathBuf> {
        let name = self
            .export_file_name()
            .ok_or_else(|| Error::Render("no profile loaded".into()))?;
        let shot = canvas.export_png()?;
        let path = dir.join(name);
        std::fs::write(&path, &shot.png_data)?;
        log::info!("wrote {} ({}x{}, {} bytes)", path.display(), shot.width, shot.height, shot.png_data.len());
        Ok(path)
    }
}
