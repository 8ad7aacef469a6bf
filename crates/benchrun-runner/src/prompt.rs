//! Prompt rendering for repair problems.

use benchrun_core::ProblemRecord;

/// Structured repair prompt. `{repo}` and `{problem_statement}` are
/// substituted verbatim; the rest, including the example diff, is sent as is.
const REPAIR_TEMPLATE: &str = r#"You are a software engineer fixing a bug. Provide a COMPLETE, VALID git diff patch.

Repository: {repo}
Problem: {problem_statement}

CRITICAL - Output Format:
1. Brief explanation (1-2 sentences)
2. Complete git diff patch in this EXACT format:

```diff
diff --git a/filename.py b/filename.py
--- a/filename.py
+++ b/filename.py
@@ -10,7 +10,7 @@
 context line
-old line
+new line
 context line
```

Make the patch COMPLETE - do not truncate. End with newline."#;

/// Prompt used by connectivity probes.
pub const PROBE_PROMPT: &str = "Solve: If 2x + 3 = 11, what is x?\n\nShow your work briefly.";

/// Prompt used by quick connectivity probes.
pub const QUICK_PROBE_PROMPT: &str = "What is 5 + 3? Just say the number.";

/// Render the repair prompt for `problem`.
pub fn render_repair_prompt(problem: &ProblemRecord) -> String {
    // Single pass so placeholder-like text inside the statement is not expanded.
    let mut out = String::with_capacity(REPAIR_TEMPLATE.len() + problem.problem_statement.len());
    let mut rest = REPAIR_TEMPLATE;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{repo}") {
            out.push_str(&problem.repo);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{problem_statement}") {
            out.push_str(&problem.problem_statement);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_repo_and_statement() {
        let problem = ProblemRecord::new("x1", "psf/requests", "Sessions leak sockets.");
        let prompt = render_repair_prompt(&problem);

        assert!(prompt.contains("Repository: psf/requests\n"));
        assert!(prompt.contains("Problem: Sessions leak sockets.\n"));
        assert!(prompt.contains("```diff\ndiff --git a/filename.py b/filename.py"));
        assert!(!prompt.contains("{repo}"));
    }

    #[test]
    fn test_statement_braces_left_alone() {
        let problem = ProblemRecord::new("x1", "a/b", "dict {repo} and {key: 1} break");
        let prompt = render_repair_prompt(&problem);
        assert!(prompt.contains("Problem: dict {repo} and {key: 1} break"));
    }
}
