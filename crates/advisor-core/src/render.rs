//! Turn model replies into display HTML.
//!
//! Replies are untrusted text. Everything is escaped before any markup is added, so a reply
//! containing `<script>` renders as text.

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Line-oriented formatting: numbered steps, bullets, `Header:` lines, source markers, `**bold**`
/// and bare http(s) links.
pub fn reply_to_html(text: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            blocks.push("<br>".to_string());
            continue;
        }
        if let Some((n, rest)) = split_step(line) {
            blocks.push(format!(
                "<div class=\"step-item\"><span class=\"step-number\">{n}</span>{}</div>",
                inline(rest)
            ));
        } else if let Some(rest) = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("• "))
        {
            blocks.push(format!("<div class=\"bullet-item\">• {}</div>", inline(rest)));
        } else if is_citation(line) {
            blocks.push(format!(
                "<div class=\"citation-header\">{}</div>",
                inline(line)
            ));
        } else if is_header(line) {
            blocks.push(format!(
                "<div class=\"section-break\"></div><h4 class=\"section-header\">{}</h4>",
                inline(line)
            ));
        } else {
            blocks.push(format!("{}<br>", inline(line)));
        }
    }
    blocks.concat()
}

fn split_step(line: &str) -> Option<(&str, &str)> {
    let digits = line.find(|c: char| !c.is_ascii_digit())?;
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    Some((&line[..digits], rest.trim_start()))
}

fn is_header(line: &str) -> bool {
    line.ends_with(':')
        && line.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && line.matches(':').count() == 1
}

fn is_citation(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    ["source:", "sources:", "citation:", "citations:"]
        .iter()
        .any(|p| lower.starts_with(p))
}

/// Escape, then apply `**bold**` and link markup.
fn inline(s: &str) -> String {
    linkify(&bold(&escape_html(s)))
}

fn bold(s: &str) -> String {
    let parts: Vec<&str> = s.split("**").collect();
    // An odd count of markers leaves the last one literal.
    let pairs = (parts.len() - 1) / 2;
    let mut out = String::with_capacity(s.len());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            if i <= pairs * 2 {
                out.push_str(if i % 2 == 1 { "<strong>" } else { "</strong>" });
            } else {
                out.push_str("**");
            }
        }
        out.push_str(part);
    }
    out
}

fn linkify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, word) in s.split(' ').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if word.starts_with("http://") || word.starts_with("https://") {
            out.push_str(&format!(
                "<a href=\"{word}\" target=\"_blank\" rel=\"noopener\" class=\"ai-link\">{word}</a>"
            ));
        } else {
            out.push_str(word);
        }
    }
    out
}
