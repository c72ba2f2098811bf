//! Dockerfile 解析：去注释、合并续行、拆出指令

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub index: usize,
    pub keyword: String,
    pub value: String,
}

pub fn parse(contents: &str) -> Vec<Instruction> {
    let mut instructions: Vec<Instruction> = Vec::new();
    let mut current = String::new();

    for line in contents.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        if stripped.starts_with('#') {
            if stripped.to_lowercase().starts_with("# syntax=") {
                push("SYNTAX".to_string(), stripped.to_string(), &mut instructions);
            }
            continue;
        }

        let stripped = strip_inline_comment(stripped);
        if stripped.is_empty() {
            continue;
        }

        if let Some(head) = stripped.strip_suffix('\\') {
            current.push_str(head.trim_end());
            current.push(' ');
            continue;
        }
        current.push_str(stripped);

        let joined = std::mem::take(&mut current);
        let mut parts = joined.splitn(2, char::is_whitespace);
        let keyword = match parts.next() {
            Some(k) if !k.is_empty() => k.to_uppercase(),
            _ => continue,
        };
        let value = parts.next().unwrap_or("").trim().to_string();
        push(keyword, value, &mut instructions);
    }

    instructions
}

fn push(keyword: String, value: String, list: &mut Vec<Instruction>) {
    let index = list.len();
    list.push(Instruction { index, keyword, value });
}

/// Cut a trailing `# ...` that is not inside quotes.
fn strip_inline_comment(s: &str) -> &str {
    let mut in_quote = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' | '\'' => in_quote = !in_quote,
            '#' if !in_quote => return s[..i].trim_end(),
            _ => {}
        }
    }
    s
}
