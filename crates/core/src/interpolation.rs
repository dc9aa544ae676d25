use indexmap::IndexSet;

use crate::context::{Suffix, VariableContext};

/// Substitutes every `$(<name><suffix>)` token of the given contexts with the
/// double-quoted derived value.
///
/// Contexts are applied in order and, within a context, suffixes in the order
/// of [`Suffix::ALL`]. Each (context, suffix) pair is a single replace over the
/// current text; the output is never re-scanned until it stops changing.
/// Tokens naming unknown contexts are left as they are. Quotes inside values
/// are not escaped.
pub fn resolve(template: &str, contexts: &[VariableContext]) -> String {
    let mut resolved = template.to_string();

    for context in contexts {
        for suffix in Suffix::ALL {
            let placeholder = context.placeholder(suffix);
            if resolved.contains(&placeholder) {
                let value = format!("\"{}\"", context.derive(suffix));
                resolved = resolved.replace(&placeholder, &value);
            }
        }
    }

    resolved
}

/// Find all `$(identifier)` tokens left in `text`, in order of first appearance.
pub fn unresolved_placeholders(text: &str) -> IndexSet<String> {
    let mut tokens = IndexSet::new();
    let mut rest = text;

    while let Some(start) = rest.find("$(") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find(')') else {
            break;
        };

        let name = &after_open[..end];
        if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            let _ = tokens.insert(format!("$({name})"));
            rest = &after_open[end + 1..];
        } else {
            rest = after_open;
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FILE, PROJECT_FILE, SOLUTION_FILE};

    fn file_context(path: &str) -> Vec<VariableContext> {
        vec![VariableContext::new(FILE, path)]
    }

    #[test]
    fn test_resolve_without_placeholders_is_unchanged() {
        let template = "@echo off\nbuild --all\n";
        assert_eq!(resolve(template, &file_context("/a/b/c.txt")), template);
    }

    #[test]
    fn test_resolve_each_suffix() {
        let contexts = file_context("/a/b/c.txt");
        assert_eq!(resolve("$(file)", &contexts), "\"c\"");
        assert_eq!(resolve("$(fileWithExtension)", &contexts), "\"c.txt\"");
        assert_eq!(resolve("$(fileExtension)", &contexts), "\".txt\"");
        assert_eq!(resolve("$(fileDirectory)", &contexts), "\"/a/b\"");
        assert_eq!(resolve("$(fileFullPath)", &contexts), "\"/a/b/c.txt\"");
    }

    #[test]
    fn test_resolve_scenario() {
        let resolved = resolve(
            "echo $(file) in $(fileDirectory)",
            &file_context("/tmp/x/y.sh"),
        );
        assert_eq!(resolved, "echo \"y\" in \"/tmp/x\"");
    }

    #[test]
    fn test_resolve_leaves_unknown_tokens() {
        assert_eq!(
            resolve("$(unknownVar)", &file_context("/a/b/c.txt")),
            "$(unknownVar)"
        );
        assert_eq!(resolve("$(file)", &[]), "$(file)");
    }

    #[test]
    fn test_resolve_replaces_every_occurrence() {
        let resolved = resolve("$(file) $(file)", &file_context("/a/b/c.txt"));
        assert_eq!(resolved, "\"c\" \"c\"");
    }

    #[test]
    fn test_resolve_is_idempotent_on_resolved_text() {
        let contexts = file_context("/a/b/c.txt");
        let once = resolve("cd $(fileDirectory) && run $(fileWithExtension)", &contexts);
        assert_eq!(resolve(&once, &contexts), once);
    }

    #[test]
    fn test_resolve_multiple_contexts() {
        let contexts = vec![
            VariableContext::new(SOLUTION_FILE, "/src/app.sln"),
            VariableContext::new(PROJECT_FILE, "/src/web/web.csproj"),
            VariableContext::new(FILE, "/src/web/build.bat"),
        ];
        let resolved = resolve(
            "msbuild $(solutionFileFullPath) /p:Project=$(projectFile) $(fileDirectory)",
            &contexts,
        );
        assert_eq!(
            resolved,
            "msbuild \"/src/app.sln\" /p:Project=\"web\" \"/src/web\""
        );
    }

    #[test]
    fn test_resolve_does_not_escape_quotes() {
        let resolved = resolve("$(fileWithExtension)", &file_context("/a/say \"hi\".txt"));
        assert_eq!(resolved, "\"say \"hi\".txt\"");
    }

    #[test]
    fn test_resolve_does_not_expand_recursively() {
        // The directory contains a token that the same pair would match again.
        let contexts = file_context("/a/$(fileDirectory)/c.txt");
        let resolved = resolve("$(fileDirectory)", &contexts);
        assert_eq!(resolved, "\"/a/$(fileDirectory)\"");
    }

    #[test]
    fn test_unresolved_placeholders() {
        let tokens = unresolved_placeholders("echo $(outDir) $(file) $(outDir) $(bad token) $(");
        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
        assert_eq!(tokens, vec!["$(outDir)", "$(file)"]);
    }

    #[test]
    fn test_unresolved_placeholders_empty_after_resolution() {
        let resolved = resolve("run $(fileFullPath)", &file_context("/a/b/c.txt"));
        assert!(unresolved_placeholders(&resolved).is_empty());
    }
}
