//! Project structure generation.
//!
//! Asks the generation service for a file list and per-file descriptions,
//! then extracts the `<answer>` delimited JSON block from the reply. A
//! missing block or unparseable JSON aborts the run before any file I/O.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info};

use fiber_llm::{Message, TextGenerator};

use crate::error::{CoreError, CoreResult};
use crate::plan::ProjectPlan;

const ANSWER_OPEN: &str = "<answer>";
const ANSWER_CLOSE: &str = "</answer>";

/// Shape of the structured plan inside the `<answer>` block.
#[derive(Debug, Deserialize)]
struct RawPlan {
    files: Vec<String>,
    descriptions: HashMap<String, String>,
}

/// Generate a project plan from the user's prompt.
pub async fn generate_plan(
    generator: &dyn TextGenerator,
    user_prompt: &str,
) -> CoreResult<ProjectPlan> {
    info!("Generating project structure");

    let messages = vec![
        Message::system(STRUCTURE_SYSTEM_PROMPT),
        Message::user(structure_user_prompt(user_prompt)),
    ];

    let completion = generator.complete(&messages).await?;
    let plan = parse_plan(&completion.text)?;

    info!("Project structure has {} files", plan.len());
    Ok(plan)
}

/// Extract and parse the `<answer>` delimited plan from a structure reply.
pub(crate) fn parse_plan(response: &str) -> CoreResult<ProjectPlan> {
    let raw = extract_answer(response)?;
    debug!("Extracted answer block ({} bytes)", raw.len());

    let raw: RawPlan = serde_json::from_str(raw)?;
    ProjectPlan::new(raw.files, raw.descriptions)
}

fn extract_answer(response: &str) -> CoreResult<&str> {
    let start = response
        .find(ANSWER_OPEN)
        .ok_or(CoreError::MissingDelimiters)?
        + ANSWER_OPEN.len();
    let end = response[start..]
        .find(ANSWER_CLOSE)
        .ok_or(CoreError::MissingDelimiters)?
        + start;
    Ok(response[start..end].trim())
}

fn structure_user_prompt(user_prompt: &str) -> String {
    format!(
        r#"First, you are provided with a starter code template containing the following files:
- index.html
- src/App.jsx
- src/index.jsx
- src/styles.css
You should include these files in your described project structure.

Now, analyze the user's prompt to understand the project requirements. Then, follow these steps:

1. Generate the 'files' array:
- Create a flat list of files needed for the project.
- Include appropriate files for the 3D scene, components, and other necessary project elements.
- The user will ask for simple projects, so create as minimal a set of files as required to complete the project.
- Do not create files for sprites, music, favicons, or images. Only utilize JavaScript to create 3D models using React Three Fiber.
- Do not create unrelated files for README.md, package.json, or .gitignore.
- Create jsx files instead of js files.
- IMPORTANT: The structure must be flat. App.jsx is the only file that can import other files. Each leaf file must work standalone and not import additional files such as hooks or components.
- DO NOT generate a Scene.jsx file as that is the role of App.jsx.

2. Generate the 'descriptions' object:
- For each file in the 'files' array, create a corresponding entry in the 'descriptions' object.
- The key should be the file path, and the value should be a brief description of the file's purpose or contents.
- Ensure descriptions are concise but informative, explaining the role of each file in the project.
- If there are files requiring 3D models, describe the task as creating the 3D object from primitives, not by importing outside 3D models.
- For leaf files, clearly specify that they must be self-contained and not import other files.

3. Format your response as a JSON object with 'files' and 'descriptions' as its main properties.

Your final output should be formatted as follows:

<answer>
{{
"files": [
    // Your generated files array here
],
"descriptions": {{
    // Your generated descriptions object here
}}
}}
</answer>

Remember to tailor the project structure and descriptions to the specific requirements mentioned in the user's prompt:

<user_prompt>
{user_prompt}
</user_prompt>

Ensure that your generated project structure and file descriptions are relevant to the user's request and follow best practices for the type of project they're asking about."#
    )
}

const STRUCTURE_SYSTEM_PROMPT: &str = "You are tasked with generating a project structure \
    and file descriptions for a React Three Fiber project based on a user's prompt. Your \
    output should be a JSON object containing two main objects: 'files' (list of files) \
    and 'descriptions'.";
