//! Cleanup of generated code.
//!
//! Generation services commonly wrap code in fenced blocks even when asked
//! not to. The cleaner strips one leading and one trailing fence marker and
//! nothing else.

const FENCE: &str = "```";

/// Remove a single leading fence marker (through the end of its line) and a
/// single trailing fence marker, then trim surrounding whitespace.
///
/// Idempotent on already-clean input. An opening fence with no following
/// line break leaves the text unmodified.
pub fn clean_generated_code(content: &str) -> String {
    let mut content = content.trim();

    if content.starts_with(FENCE) {
        match content.find('\n') {
            Some(newline) => content = &content[newline + 1..],
            // A marker with nothing after it on the line is not a wrapper
            None => return content.to_string(),
        }
    }

    if content.ends_with(FENCE) {
        content = &content[..content.len() - FENCE.len()];
    }

    content.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fenced_block() {
        let raw = "```jsx\nconst x = 1;\n```";
        assert_eq!(clean_generated_code(raw), "const x = 1;");
    }

    #[test]
    fn test_strips_bare_fences() {
        let raw = "```\nexport default App;\n```";
        assert_eq!(clean_generated_code(raw), "export default App;");
    }

    #[test]
    fn test_clean_input_unchanged() {
        let clean = "function App() { return null; }";
        assert_eq!(clean_generated_code(clean), clean);
    }

    #[test]
    fn test_idempotent() {
        let raw = "```js\nlet a = 2;\n```";
        let once = clean_generated_code(raw);
        assert_eq!(clean_generated_code(&once), once);
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let raw = "\n\n```jsx\nconst y = 3;\n```\n\n";
        assert_eq!(clean_generated_code(raw), "const y = 3;");
    }

    #[test]
    fn test_opening_fence_without_newline_left_alone() {
        assert_eq!(clean_generated_code("```"), "```");
        assert_eq!(clean_generated_code("```jsx"), "```jsx");
    }

    #[test]
    fn test_trailing_fence_only() {
        let raw = "const z = 4;\n```";
        assert_eq!(clean_generated_code(raw), "const z = 4;");
    }
}
