//! Pipeline domain model and the built-in pipelines

use crate::core::{
    config::OrchestratorConfig,
    stage::{Invocation, Stage},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Something that must be available before any stage runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    /// Container runtime answers `<program> ps`
    ContainerRuntime { program: String },
    /// The document index answers its root endpoint
    IndexService,
    /// An executable with this name is on the search path
    Binary { name: String },
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::ContainerRuntime { program } => write!(f, "container runtime ({})", program),
            Requirement::IndexService => write!(f, "index service"),
            Requirement::Binary { name } => write!(f, "binary `{}`", name),
        }
    }
}

/// A pipeline definition: prerequisites, ordered stages and teardown
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Banner title
    pub title: String,

    /// Checked in order before any stage runs
    pub prerequisites: Vec<Requirement>,

    /// Stages in execution order
    pub stages: Vec<Stage>,

    /// Stops supporting services started by the stages
    pub teardown: Option<Invocation>,

    /// Hints printed after a successful run
    pub next_steps: Vec<String>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            prerequisites: Vec::new(),
            stages: Vec::new(),
            teardown: None,
            next_steps: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn require(mut self, requirement: Requirement) -> Self {
        self.prerequisites.push(requirement);
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn with_teardown(mut self, teardown: Invocation) -> Self {
        self.teardown = Some(teardown);
        self
    }

    pub fn next_step(mut self, hint: impl Into<String>) -> Self {
        self.next_steps.push(hint.into());
        self
    }

    /// Look up a stage by name
    pub fn stage_named(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Crawler + PDF processor pipeline
    ///
    /// Starts the message broker, runs the containerised web crawler, then the
    /// PDF processor. Compose services are brought down at cleanup.
    pub fn crawl(config: &OrchestratorConfig) -> Self {
        let dir = config.working_dir.clone();
        let compose = |args: &[&str]| {
            Invocation::new(&config.compose_program)
                .args(args.iter().copied())
                .current_dir(dir.clone())
        };

        Pipeline::new("crawl")
            .with_title("Health Plan Data Pipeline")
            .require(Requirement::ContainerRuntime {
                program: config.container_runtime.clone(),
            })
            .require(Requirement::IndexService)
            .require(Requirement::Binary {
                name: config.script_runtime.clone(),
            })
            .require(Requirement::Binary {
                name: "pdftotext".to_string(),
            })
            .stage(
                Stage::new(
                    "broker",
                    compose(&["up", "-d", "rabbitmq"]),
                    "Starting RabbitMQ service",
                )
                .starts_service("rabbitmq")
                .settle_for(Duration::from_secs(config.settle_secs)),
            )
            .stage(
                Stage::new(
                    "crawler",
                    compose(&["up", "elastic-crawler"]),
                    "Running Elastic Crawler",
                )
                .starts_service("elastic-crawler"),
            )
            .stage(Stage::new(
                "pdf-processor",
                Invocation::new(&config.script_runtime)
                    .arg("scripts/pdf-processor.js")
                    .current_dir(dir.clone()),
                "Running PDF Processor",
            ))
            .with_teardown(compose(&["down"]))
            .next_step(count_hint(config))
    }

    /// Multi-state processor pipeline
    ///
    /// One streamed stage that crawls every configured state, extracts PDF
    /// text and indexes the result.
    pub fn multi_state(config: &OrchestratorConfig) -> Self {
        Pipeline::new("multi-state")
            .with_title("Multi-State Health Plans Pipeline")
            .require(Requirement::Binary {
                name: config.script_runtime.clone(),
            })
            .require(Requirement::Binary {
                name: "pdftotext".to_string(),
            })
            .require(Requirement::IndexService)
            .stage(Stage::new(
                "multi-state-processor",
                Invocation::new(&config.script_runtime)
                    .arg("scripts/multi-state-processor.js")
                    .current_dir(config.working_dir.clone())
                    .streaming(),
                "Multi-State PDF and Content Processor",
            ))
            .next_step(count_hint(config))
            .next_step("Test search: npm run dev")
            .next_step("Navigate to: http://localhost:3000")
    }
}

fn count_hint(config: &OrchestratorConfig) -> String {
    format!(
        "Verify data: GET {}/{}/_count",
        config.index.base_url(),
        config.index.index_name
    )
}
