//! Error taxonomy of the interaction engine.
//!
//! None of these errors is fatal. Components log them where they happen and
//! hand them to the [`crate::viewer::Viewer`], which keeps its last good state
//! and queues them for the host UI.

/// Everything that can go wrong while driving a configured scene.
#[derive(Debug, thiserror::Error)]
pub enum ConfiguratorError {
    /// A name used by the model configuration does not exist in the merged scene.
    #[error("`{name}` is referenced by `{section}` but does not exist in the scene")]
    ConfigReferenceMissing { name: String, section: &'static str },

    /// A scene fragment (or a whole single-asset model) could not be loaded.
    #[error("failed to load asset `{asset}`: {error}")]
    AssetLoadFailed {
        asset: String,
        #[source]
        error: anyhow::Error,
    },

    /// A texture could not be loaded or decoded. The previous binding is kept.
    #[error("failed to load texture for `{target}`: {error}")]
    TextureLoadFailed {
        target: String,
        #[source]
        error: anyhow::Error,
    },

    /// An asynchronous result arrived for a model that is no longer active.
    #[error("discarded result of model generation {requested}, current generation is {current}")]
    StaleResultDiscarded { requested: u64, current: u64 },

    /// The model configuration document is malformed.
    #[error("invalid model configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl ConfiguratorError {
    pub fn missing(name: impl Into<String>, section: &'static str) -> Self {
        Self::ConfigReferenceMissing {
            name: name.into(),
            section,
        }
    }

    /// Whether the host UI should show this error to the user.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::StaleResultDiscarded { .. })
    }
}

pub type Result<T> = std::result::Result<T, ConfiguratorError>;
