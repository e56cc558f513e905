//! Regex-based HTML helpers for legacy content fragments.
//!
//! Legacy fragments are small, editor-produced and shallow, so a fixed
//! sequence of rewrites is enough to turn them into markdown.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern")
}

static TAG: Lazy<Regex> = Lazy::new(|| re(r"(?s)<[^>]*>"));
static NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| re(r"&#([0-9]{1,7});"));
static HEX_ENTITY: Lazy<Regex> = Lazy::new(|| re(r"(?i)&#x([0-9a-f]{1,6});"));
static SCRIPT: Lazy<Regex> = Lazy::new(|| re(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>"));
static COMMENT: Lazy<Regex> = Lazy::new(|| re(r"(?s)<!--.*?-->"));
static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| re(r"[ \t]*[\r\n]+[ \t]*"));
static TABLE: Lazy<Regex> = Lazy::new(|| re(r"(?is)<table\b.*?</table>"));
static THEAD: Lazy<Regex> = Lazy::new(|| re(r"(?is)<thead\b[^>]*>(.*?)</thead>"));
static ROW: Lazy<Regex> = Lazy::new(|| re(r"(?is)<tr\b[^>]*>(.*?)</tr>"));
static CELL: Lazy<Regex> = Lazy::new(|| re(r"(?is)<t[hd]\b[^>]*>(.*?)</t[hd]>"));
static BR: Lazy<Regex> = Lazy::new(|| re(r"(?i)<br\s*/?>"));
static HEADING: Lazy<Regex> = Lazy::new(|| re(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]>"));
static STRONG: Lazy<Regex> = Lazy::new(|| re(r"(?is)<(?:strong|b)(?:\s[^>]*)?>(.*?)</(?:strong|b)>"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| re(r"(?is)<(?:em|i)(?:\s[^>]*)?>(.*?)</(?:em|i)>"));
static STRIKE: Lazy<Regex> = Lazy::new(|| re(r"(?is)<(?:del|s|strike)(?:\s[^>]*)?>(.*?)</(?:del|s|strike)>"));
static CODE: Lazy<Regex> = Lazy::new(|| re(r"(?is)<code(?:\s[^>]*)?>(.*?)</code>"));
static LINK: Lazy<Regex> =
    Lazy::new(|| re(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#));
static IMAGE: Lazy<Regex> = Lazy::new(|| re(r#"(?is)<img\s[^>]*?src\s*=\s*["']([^"']*)["'][^>]*>"#));
static LIST: Lazy<Regex> = Lazy::new(|| re(r"(?is)<(ol|ul)\b[^>]*>(.*?)</(?:ol|ul)>"));
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| re(r"(?is)<li\b[^>]*>(.*?)(?:</li>|$)"));
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| re(r"(?is)<blockquote\b[^>]*>(.*?)</blockquote>"));
static BLOCK_OPEN: Lazy<Regex> = Lazy::new(|| re(r"(?i)<(?:p|div|section|article)\b[^>]*>"));
static BLOCK_CLOSE: Lazy<Regex> = Lazy::new(|| re(r"(?i)</(?:p|div|section|article)>"));
static HORIZONTAL_RULE: Lazy<Regex> = Lazy::new(|| re(r"(?i)<hr\s*/?>"));
static SPACES: Lazy<Regex> = Lazy::new(|| re(r"[ \t]{2,}"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| re(r"\n{3,}"));

/// Decodes named and numeric character references.
pub fn decode_entities(text: &str) -> String {
    let text = NUMERIC_ENTITY.replace_all(text, |caps: &Captures| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    let text = HEX_ENTITY.replace_all(&text, |caps: &Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&rsquo;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&rdquo;", "\u{201d}")
        .replace("&ldquo;", "\u{201c}")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&hellip;", "\u{2026}")
        .replace("&amp;", "&")
}

/// Removes every tag, leaving entities encoded.
///
/// Text that is translated further must stay encoded, otherwise a decoded
/// `&lt;` would read as the start of a tag on the next pass.
pub fn remove_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Removes every tag and decodes entities.
pub fn strip_tags(html: &str) -> String {
    decode_entities(&remove_tags(html))
}

/// Splits every `<table>` out of a fragment.
///
/// Returns the table fragments in order and the remaining prose.
pub fn split_tables(html: &str) -> (Vec<String>, String) {
    let tables = TABLE
        .find_iter(html)
        .map(|m| m.as_str().to_string())
        .collect();
    let prose = TABLE.replace_all(html, " ").into_owned();
    (tables, prose)
}

/// A table as a row-major matrix of markdown cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    pub rows: Vec<Vec<String>>,
    pub has_header_row: bool,
    pub has_header_column: bool,
}

impl ParsedTable {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Parses one `<table>` fragment, header rows first.
///
/// `scope="col"` anywhere marks a header row and `scope="row"` a header column.
pub fn parse_table(table: &str) -> ParsedTable {
    let head: Vec<&str> = THEAD
        .captures_iter(table)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let body = THEAD.replace_all(table, "");

    let rows = head
        .into_iter()
        .flat_map(|h| ROW.captures_iter(h).map(|c| parse_row(&c[1])).collect::<Vec<_>>())
        .chain(ROW.captures_iter(&body).map(|c| parse_row(&c[1])))
        .collect();

    ParsedTable {
        rows,
        has_header_row: table.contains(r#"scope="col""#),
        has_header_column: table.contains(r#"scope="row""#),
    }
}

fn parse_row(row: &str) -> Vec<String> {
    CELL.captures_iter(row)
        .map(|c| inline_markdown(&c[1]))
        .collect()
}

fn inline_markdown(html: &str) -> String {
    to_markdown(html)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders a parsed table as a GFM table.
pub fn table_to_markdown(table: &ParsedTable) -> String {
    let width = table.column_count();
    if width == 0 {
        return String::new();
    }

    let render = |row: &[String]| {
        let cells: Vec<String> = (0..width)
            .map(|i| row.get(i).map(|c| c.replace('|', "\\|")).unwrap_or_default())
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    let mut rows = table.rows.iter();
    if let Some(first) = rows.next() {
        lines.push(render(first));
    }
    lines.push(format!("|{}", " --- |".repeat(width)));
    lines.extend(rows.map(|r| render(r)));
    lines.join("\n")
}

/// Translates an HTML fragment to markdown.
pub fn to_markdown(html: &str) -> String {
    let html = COMMENT.replace_all(html, "");
    let html = SCRIPT.replace_all(&html, "");
    let html = LINE_BREAKS.replace_all(&html, " ");

    // Tables are rendered from decoded cells, so they skip the passes below.
    let mut tables = vec![];
    let html = TABLE.replace_all(&html, |caps: &Captures| {
        tables.push(table_to_markdown(&parse_table(&caps[0])));
        format!("\n\n{}\n\n", table_placeholder(tables.len() - 1))
    });

    let html = BR.replace_all(&html, "\n");
    let html = HORIZONTAL_RULE.replace_all(&html, "\n\n---\n\n");
    let html = STRONG.replace_all(&html, |caps: &Captures| wrap_inline(&caps[1], "**"));
    let html = EMPHASIS.replace_all(&html, |caps: &Captures| wrap_inline(&caps[1], "_"));
    let html = STRIKE.replace_all(&html, |caps: &Captures| wrap_inline(&caps[1], "~~"));
    let html = CODE.replace_all(&html, |caps: &Captures| wrap_inline(&caps[1], "`"));
    let html = LINK.replace_all(&html, |caps: &Captures| {
        let text = remove_tags(&caps[2]);
        let text = text.trim();
        if text.is_empty() {
            String::new()
        } else {
            format!("[{}]({})", text, &caps[1])
        }
    });
    let html = IMAGE.replace_all(&html, "![]($1)");

    let html = HEADING.replace_all(&html, |caps: &Captures| {
        let level: usize = caps[1].parse().unwrap_or(1);
        format!("\n\n{} {}\n\n", "#".repeat(level), remove_tags(&caps[2]).trim())
    });

    let html = LIST.replace_all(&html, |caps: &Captures| {
        let ordered = caps[1].eq_ignore_ascii_case("ol");
        let items: Vec<String> = LIST_ITEM
            .captures_iter(&caps[2])
            .map(|item| remove_tags(&BLOCK_CLOSE.replace_all(&item[1], " ")))
            .map(|item| item.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|item| !item.is_empty())
            .enumerate()
            .map(|(i, item)| {
                if ordered {
                    format!("{}. {}", i + 1, item)
                } else {
                    format!("- {}", item)
                }
            })
            .collect();
        format!("\n\n{}\n\n", items.join("\n"))
    });

    let html = BLOCKQUOTE.replace_all(&html, |caps: &Captures| {
        let inner = BLOCK_CLOSE.replace_all(&caps[1], "\n\n");
        let inner = remove_tags(&inner);
        let quoted: Vec<String> = inner
            .trim()
            .lines()
            .map(|l| format!("> {}", l.trim()).trim_end().to_string())
            .collect();
        format!("\n\n{}\n\n", quoted.join("\n"))
    });

    let html = BLOCK_OPEN.replace_all(&html, "");
    let html = BLOCK_CLOSE.replace_all(&html, "\n\n");
    let text = strip_tags(&html);

    let text: Vec<String> = text
        .lines()
        .map(|l| SPACES.replace_all(l.trim(), " ").into_owned())
        .collect();
    let joined = text.join("\n");
    let text = BLANK_LINES.replace_all(&joined, "\n\n");

    tables
        .iter()
        .enumerate()
        .fold(text.into_owned(), |text, (i, table)| {
            text.replace(&table_placeholder(i), table)
        })
        .trim()
        .to_string()
}

fn table_placeholder(index: usize) -> String {
    format!("\u{1}table-{}\u{1}", index)
}

fn wrap_inline(inner: &str, marker: &str) -> String {
    let text = inner.trim();
    if text.is_empty() {
        return String::new();
    }
    format!("{}{}{}", marker, text, marker)
}
