//! On-disk project store.
//!
//! Saved projects live in a single `projects.json` document under the
//! platform data directory (or an explicit override, mainly for tests).
//! Each entry keeps the original input next to the computed result so a
//! project can be re-rendered or exported without recalculating.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use licplan_core::{CalcInput, CalculationResult};
use serde::{Deserialize, Serialize};

pub const STORE_FILE: &str = "projects.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedProject {
    pub project: ProjectMeta,
    pub input: CalcInput,
    pub result: CalculationResult,
}

impl SavedProject {
    pub fn new(
        name: String,
        customer: Option<String>,
        description: Option<String>,
        input: CalcInput,
        result: CalculationResult,
    ) -> Self {
        Self {
            project: ProjectMeta {
                id: uuid::Uuid::new_v4().to_string(),
                name,
                customer,
                description,
                created_at: Utc::now(),
            },
            input,
            result,
        }
    }
}

pub struct ProjectStore {
    path: PathBuf,
}

impl ProjectStore {
    pub fn open(dir: Option<PathBuf>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => dirs::data_dir()
                .context("no data directory available on this platform")?
                .join("licplan"),
        };
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(Self {
            path: dir.join(STORE_FILE),
        })
    }

    pub fn load_all(&self) -> Result<Vec<SavedProject>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let projects: Vec<SavedProject> = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        log::debug!(
            "loaded {} saved projects from {}",
            projects.len(),
            self.path.display()
        );
        Ok(projects)
    }

    /// Insert a project, replacing any existing one with the same name.
    pub fn save(&self, project: SavedProject) -> Result<()> {
        let mut all = self.load_all()?;
        all.retain(|p| p.project.name != project.project.name);
        all.push(project);
        self.write_all(&all)
    }

    pub fn find(&self, name: &str) -> Result<SavedProject> {
        self.load_all()?
            .into_iter()
            .find(|p| p.project.name == name)
            .with_context(|| format!("no saved project named '{name}'"))
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let mut all = self.load_all()?;
        let before = all.len();
        all.retain(|p| p.project.name != name);
        anyhow::ensure!(all.len() < before, "no saved project named '{name}'");
        self.write_all(&all)
    }

    fn write_all(&self, projects: &[SavedProject]) -> Result<()> {
        let json = serde_json::to_string_pretty(projects)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
