//! `${placeholder}` rendering for reply and send content

use std::collections::HashMap;

/// Replace every `${key}` with its value; unknown placeholders are left as written
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Placeholder names a template refers to, in order of appearance
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else { break };
        found.push(&after[..end]);
        rest = &after[end + 1..];
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<String, String> {
        HashMap::from([
            ("user".to_string(), "alice".to_string()),
            ("guild".to_string(), "Rustaceans".to_string()),
        ])
    }

    #[test]
    fn test_render_known_placeholders() {
        assert_eq!(
            render("Hi ${user}, welcome to ${guild}!", &vars()),
            "Hi alice, welcome to Rustaceans!"
        );
    }

    #[test]
    fn test_render_keeps_unknown_and_unterminated() {
        assert_eq!(render("${nope} and ${user}", &vars()), "${nope} and alice");
        assert_eq!(render("cost: ${user", &vars()), "cost: ${user");
        assert_eq!(render("no placeholders", &vars()), "no placeholders");
    }

    #[test]
    fn test_placeholders_listed_in_order() {
        assert_eq!(placeholders("${a}-${b} ${a"), vec!["a", "b"]);
        assert!(placeholders("plain").is_empty());
    }
}
