use crate::session::SessionState;

/// Split a console line on spaces and tabs.
///
/// A token that starts with `'` or `"` runs to the matching quote, and
/// `\` escapes that quote inside it; the other quote kind is kept as is.
/// Quotes inside an unquoted token are literal, so inline JSON survives.
/// Lines starting with `;` (comments) or `:` (labels) yield no tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    let line = line.trim_start_matches(is_blank);
    if line.starts_with([';', ':']) {
        return Vec::new();
    }

    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.next_if(|&c| is_blank(c)).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };

        let mut token = String::new();
        if first == '\'' || first == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                if c == first {
                    break;
                }
                if c == '\\' && chars.peek() == Some(&first) {
                    chars.next();
                    token.push(first);
                } else {
                    token.push(c);
                }
            }
        }
        while let Some(c) = chars.next_if(|&c| !is_blank(c)) {
            token.push(c);
        }
        tokens.push(token);
    }
    tokens
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

pub fn prompt(state: Option<&SessionState>) -> String {
    let tag = state.map(SessionState::prompt_tag).unwrap_or_default();
    format!("tdc{tag}>>> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokenize("  select \t  lab  "), vec!["select", "lab"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn single_quotes_keep_json_intact() {
        assert_eq!(
            tokenize(r#"sendtask '{"actions":[]}'"#),
            vec!["sendtask", r#"{"actions":[]}"#]
        );
        assert_eq!(
            tokenize(r#"sendtask '{"actions": [{"action": "configure"}]}'"#),
            vec!["sendtask", r#"{"actions": [{"action": "configure"}]}"#]
        );
    }

    #[test]
    fn unquoted_json_is_one_token() {
        assert_eq!(
            tokenize(r#"sendtask {"actions":[{"action":"configure"}]}"#),
            vec!["sendtask", r#"{"actions":[{"action":"configure"}]}"#]
        );
    }

    #[test]
    fn double_quotes_group_words_and_escape() {
        assert_eq!(tokenize(r#"select "Lab Scanner""#), vec!["select", "Lab Scanner"]);
        assert_eq!(tokenize(r#"say "it \"works\" 'here'""#), vec!["say", r#"it "works" 'here'"#]);
        assert_eq!(tokenize(r#"say 'don\'t'"#), vec!["say", "don't"]);
        assert_eq!(tokenize(r#"run """#), vec!["run", ""]);
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        assert_eq!(tokenize("sendtask '{ \"a\": 1"), vec!["sendtask", "{ \"a\": 1"]);
    }

    #[test]
    fn comments_and_labels_yield_nothing() {
        assert!(tokenize("; a comment").is_empty());
        assert!(tokenize("  ; indented note").is_empty());
        assert!(tokenize(":start").is_empty());
    }

    #[test]
    fn prompt_follows_session_state() {
        assert_eq!(prompt(None), "tdc>>> ");
        assert_eq!(prompt(Some(&SessionState::NoSession)), "tdc>>> ");
        assert_eq!(prompt(Some(&SessionState::Ready)), "tdc.rdy>>> ");
        assert_eq!(prompt(Some(&SessionState::Draining)), "tdc.drn>>> ");
    }
}
