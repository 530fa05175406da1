//! Generation tasks.
//!
//! A task is the unit of work: build a structured conversation for one
//! target file, invoke the generation client, clean the reply and write it
//! to the target path. The root task aggregates every other file; leaf
//! tasks are self-contained.

use std::fs;
use std::path::Path;

use tracing::debug;

use fiber_llm::Message;

use crate::cleaner::clean_generated_code;
use crate::context::PipelineContext;
use crate::error::CoreResult;
use crate::plan::{ProjectPlan, ROOT_FILE};

/// Which instruction set a task runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// The aggregating entry point that imports every sibling file.
    Root,
    /// A standalone file with no cross-file imports.
    Leaf,
}

/// One file-generation work item. Ephemeral: created per file, consumed once.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    kind: TaskKind,
    task_text: String,
    target_path: String,
    role_description: String,
}

impl GenerationTask {
    /// The root task for a plan.
    pub fn root(plan: &ProjectPlan) -> Self {
        Self {
            kind: TaskKind::Root,
            task_text: format!("Create the {} file.", ROOT_FILE),
            target_path: ROOT_FILE.to_string(),
            role_description: plan.root_description().to_string(),
        }
    }

    /// A leaf task for one declared path.
    pub fn leaf(path: &str, description: &str) -> Self {
        let file_name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path);
        Self {
            kind: TaskKind::Leaf,
            task_text: format!(
                "Implement the {} file for the project. {}",
                file_name, description
            ),
            target_path: path.to_string(),
            role_description: description.to_string(),
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// Build the conversation for this task: the role-specific instruction
    /// turn followed by the task turn with sibling-file context.
    pub fn conversation(&self, plan: &ProjectPlan, root_context: Option<&str>) -> Vec<Message> {
        let system = match self.kind {
            TaskKind::Root => ROOT_SYSTEM_PROMPT,
            TaskKind::Leaf => LEAF_SYSTEM_PROMPT,
        };

        let mut user = format!(
            r#"Please write code for the following task:

Task: {}

This code will go in: {}
File's role: {}

Related files in the system:
{}"#,
            self.task_text,
            self.target_path,
            self.role_description,
            plan.context_listing(&self.target_path),
        );

        if let Some(root) = root_context.filter(|c| !c.trim().is_empty()) {
            user.push_str(&format!(
                "\n\nThe already-generated {} is included for interface context:\n{}",
                ROOT_FILE, root
            ));
        }

        user.push_str(
            "\n\nPlease write the complete code for this file, including all necessary imports and setup.",
        );

        vec![Message::system(system), Message::user(user)]
    }

    /// Run the task: complete the conversation, clean the reply and write it
    /// to the target path, fully overwriting any existing content.
    ///
    /// Generation failures propagate to the caller; the orchestrator owns
    /// retry and result recording.
    pub async fn execute(
        &self,
        ctx: &PipelineContext,
        plan: &ProjectPlan,
        root_context: Option<&str>,
    ) -> CoreResult<()> {
        let messages = self.conversation(plan, root_context);
        let completion = ctx.generator().complete(&messages).await?;
        let content = clean_generated_code(&completion.text);

        let target = ctx.resolve(&self.target_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;

        debug!("Wrote generated content to {}", self.target_path);
        Ok(())
    }
}

// Instruction turns for the two task flavors.

const ROOT_SYSTEM_PROMPT: &str = r#"You will receive specific coding tasks and complete the implementation of individual files.
You will be provided with the requirements for what the file does, as well as its role in the overall project.
The project structure provided is a complete and exhaustive list of the files available. Do not assume the existence of any files beyond the provided ones.
Only provide code, do not provide an explanation before or after the code.

Your task will be to create the App.jsx file. App.jsx will always be the top-level controller and will render the entire project.
As such, it is very important that you:
1. Create the Canvas component from React Three Fiber
2. Import all the necessary components from the other files
3. Render these components within the Canvas
4. Set up any necessary lighting, camera, or other scene elements

You will have context on what those components do from their file descriptions. You get to define the abstractions that those files implement.
Ensure that if the abstractions are implemented correctly per their file descriptions, that the App.jsx file should be able to render the entire project."#;

const LEAF_SYSTEM_PROMPT: &str = r#"You will receive specific coding tasks and complete the implementation of individual files.
You will be provided with the requirements for what the file does, as well as its role in the overall project.
The project structure provided is a complete and exhaustive list of the files available. Do not assume the existence of any files beyond the provided ones.
Only provide code, do not provide an explanation before or after the code.

The file you create must be fully self-contained: do not import any of the other project files. App.jsx is the only file that imports others.
Do not reference external assets such as images, audio, or 3D model files. Any object normally sourced from an asset must instead be built from code-level primitives."#;
