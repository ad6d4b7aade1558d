//! Custom pipeline definitions from YAML

use crate::core::{
    config::OrchestratorConfig,
    pipeline::{Pipeline, Requirement},
    stage::{Invocation, Stage},
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level pipeline definition loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Pipeline name
    pub name: String,

    /// Banner title (defaults to the name)
    #[serde(default)]
    pub title: Option<String>,

    /// Requirements checked before any stage runs
    #[serde(default)]
    pub prerequisites: Vec<Requirement>,

    /// Stages in execution order
    pub stages: Vec<StageDefinition>,

    /// Teardown command run at cleanup when a service was started
    #[serde(default)]
    pub teardown: Option<Invocation>,

    /// Hints printed after a successful run
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// Stage as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Unique stage name
    pub name: String,

    /// Optional description (defaults to the name)
    #[serde(default)]
    pub description: Option<String>,

    /// Command to run
    pub run: Invocation,

    /// Supporting service this stage starts
    #[serde(default)]
    pub starts_service: Option<String>,

    /// Seconds to wait after success
    #[serde(default)]
    pub settle_secs: Option<u64>,
}

impl PipelineDefinition {
    /// Load a pipeline definition from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a pipeline definition from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let definition: PipelineDefinition = serde_yaml::from_str(yaml)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Validate the definition
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            anyhow::bail!("Pipeline '{}' has no stages", self.name);
        }

        let mut seen = std::collections::HashSet::new();
        for stage in &self.stages {
            if !seen.insert(&stage.name) {
                anyhow::bail!("Duplicate stage name: {}", stage.name);
            }
            if stage.run.program.trim().is_empty() {
                anyhow::bail!("Stage '{}' has an empty program", stage.name);
            }
        }

        if let Some(teardown) = &self.teardown {
            if teardown.program.trim().is_empty() {
                anyhow::bail!("Pipeline '{}' teardown has an empty program", self.name);
            }
        }

        Ok(())
    }

    /// Convert into a runnable pipeline
    ///
    /// Stages without a working directory inherit the configured one.
    pub fn to_pipeline(&self, config: &OrchestratorConfig) -> Pipeline {
        let inherit_dir = |mut inv: Invocation| {
            if inv.working_dir.is_none() {
                inv.working_dir = config.working_dir.clone();
            }
            inv
        };

        let mut pipeline = Pipeline::new(&self.name)
            .with_title(self.title.clone().unwrap_or_else(|| self.name.clone()));
        pipeline.prerequisites = self.prerequisites.clone();
        pipeline.next_steps = self.next_steps.clone();
        pipeline.teardown = self.teardown.clone().map(inherit_dir);

        for def in &self.stages {
            let mut stage = Stage::new(
                &def.name,
                inherit_dir(def.run.clone()),
                def.description.clone().unwrap_or_else(|| def.name.clone()),
            );
            stage.starts_service = def.starts_service.clone();
            if let Some(secs) = def.settle_secs {
                stage = stage.settle_for(Duration::from_secs(secs));
            }
            pipeline = pipeline.stage(stage);
        }

        pipeline
    }
}
