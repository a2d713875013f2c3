//! Update work items.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What applying an update will do to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentAction {
    None,
    Installation,
    Uninstallation,
    Detection,
    OptionalInstallation,
    Unexpected(i32),
}

impl DeploymentAction {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => DeploymentAction::None,
            1 => DeploymentAction::Installation,
            2 => DeploymentAction::Uninstallation,
            3 => DeploymentAction::Detection,
            4 => DeploymentAction::OptionalInstallation,
            other => DeploymentAction::Unexpected(other),
        }
    }
}

impl fmt::Display for DeploymentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentAction::None => write!(f, "None (Inherit)"),
            DeploymentAction::Installation => write!(f, "Installation"),
            DeploymentAction::Uninstallation => write!(f, "Uninstallation"),
            DeploymentAction::Detection => write!(f, "Detection"),
            DeploymentAction::OptionalInstallation => write!(f, "Optional Installation"),
            DeploymentAction::Unexpected(raw) => write!(f, "Unexpected ({})", raw),
        }
    }
}

/// A single update offered by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub id: Uuid,
    pub revision: u32,
    pub title: String,
    /// Knowledge-base article numbers, without the `KB` prefix.
    pub kb_articles: Vec<String>,
    pub hidden: bool,
    pub deployment_action: DeploymentAction,
    /// The update already has a pending restart and cannot be applied now.
    pub reboot_required: bool,
}

impl Update {
    pub fn new(title: impl Into<String>) -> Self {
        Update {
            id: Uuid::new_v4(),
            revision: 1,
            title: title.into(),
            kb_articles: Vec::new(),
            hidden: false,
            deployment_action: DeploymentAction::Installation,
            reboot_required: false,
        }
    }

    pub fn with_kb(mut self, article: impl Into<String>) -> Self {
        self.kb_articles.push(article.into());
        self
    }

    /// One-line description including identity, KB articles and action.
    pub fn describe(&self) -> String {
        let mut text = format!("{} {{{}.{}}}", self.title, self.id, self.revision);
        if self.hidden {
            text.push_str(" (hidden)");
        }
        if !self.kb_articles.is_empty() {
            let articles: Vec<String> = self
                .kb_articles
                .iter()
                .map(|article| format!("KB{}", article))
                .collect();
            text.push_str(&format!(" ({})", articles.join(",")));
        }
        text.push_str(&format!(" Deployment action: {}", self.deployment_action));
        text
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Ordered updates for one job. Frozen into an `Arc<[Update]>` before a
/// download or install starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCollection {
    updates: Vec<Update>,
}

impl UpdateCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an update and return its index.
    pub fn add(&mut self, update: Update) -> usize {
        self.updates.push(update);
        self.updates.len() - 1
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Update> {
        self.updates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Update> {
        self.updates.iter()
    }

    pub fn to_shared(&self) -> Arc<[Update]> {
        Arc::from(self.updates.clone())
    }
}

impl FromIterator<Update> for UpdateCollection {
    fn from_iter<T: IntoIterator<Item = Update>>(iter: T) -> Self {
        UpdateCollection {
            updates: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a UpdateCollection {
    type Item = &'a Update;
    type IntoIter = std::slice::Iter<'a, Update>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.iter()
    }
}
