use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::providers::base::{impl_provider, BaseProvider, ProviderType};

/// Tools described by a local manual file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextProvider {
    #[serde(flatten)]
    pub base: BaseProvider,
    pub file_path: PathBuf,
}

impl_provider!(TextProvider, ProviderType::Text);

impl TextProvider {
    pub fn new(name: String, file_path: PathBuf) -> Self {
        Self {
            base: BaseProvider::new(name, ProviderType::Text, None),
            file_path,
        }
    }
}
