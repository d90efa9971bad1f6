use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::actions::MenuOption;
use crate::config::Config;
use crate::datetime::format_display_date;
use crate::item::{Item, ItemKind, ROOT_ID};
use crate::session::Session;
use crate::store::ItemStore;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all, fields(count = items.len()))]
    pub fn print_listing<W: Write>(
        &self,
        out: &mut W,
        session: &Session,
        items: &[&Item],
    ) -> anyhow::Result<()> {
        if items.is_empty() {
            let what = if session.is_searching() {
                "No matches."
            } else {
                "Empty folder."
            };
            writeln!(out, "{what}")?;
            return Ok(());
        }

        let headers = vec![
            " ".to_string(),
            "ID".to_string(),
            "Type".to_string(),
            "Name".to_string(),
            "Date".to_string(),
            "Details".to_string(),
        ];

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let marker = if session.selection().contains(item.id.as_str()) {
                "*"
            } else if session.clipboard().is_cut(item.id.as_str()) {
                "~"
            } else {
                ""
            };

            let details = match &item.kind {
                ItemKind::Folder { .. } => {
                    let count = session.store().child_count(item.id.as_str());
                    if count == 1 {
                        "1 item".to_string()
                    } else {
                        format!("{count} items")
                    }
                }
                ItemKind::Bookmark { url } => url.clone(),
            };

            let name = if item.is_folder() {
                self.paint(&item.name, "34")
            } else {
                item.name.clone()
            };

            rows.push(vec![
                marker.to_string(),
                self.paint(item.id.as_str(), "33"),
                item.item_type().as_str().to_string(),
                name,
                format_display_date(item.date),
                details,
            ]);
        }

        write_table(out, headers, rows)?;
        Ok(())
    }

    pub fn print_location<W: Write>(&self, out: &mut W, session: &Session) -> anyhow::Result<()> {
        let crumbs = session.breadcrumbs();
        let root = session
            .store()
            .get(ROOT_ID)
            .map(|root| root.name.clone())
            .unwrap_or_default();
        if crumbs.is_empty() {
            writeln!(out, "{root} /")?;
        } else {
            writeln!(out, "{root} /{}", crumbs.join("/"))?;
        }
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_item_info<W: Write>(&self, out: &mut W, item: &Item) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(item)?;
        writeln!(out, "{json}")?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_tree<W: Write>(&self, out: &mut W, store: &ItemStore) -> anyhow::Result<()> {
        let Some(root) = store.get(ROOT_ID) else {
            return Ok(());
        };
        writeln!(out, "{} ({})", root.name, root.id)?;

        let mut stack: Vec<(&Item, usize)> = store
            .children(ROOT_ID)
            .into_iter()
            .rev()
            .map(|child| (child, 1))
            .collect();
        while let Some((item, depth)) = stack.pop() {
            let glyph = if item.is_folder() { "+" } else { "-" };
            writeln!(
                out,
                "{}{glyph} {} ({})",
                "  ".repeat(depth),
                item.name,
                self.paint(item.id.as_str(), "33")
            )?;
            stack.extend(
                store
                    .children(item.id.as_str())
                    .into_iter()
                    .rev()
                    .map(|child| (child, depth + 1)),
            );
        }
        Ok(())
    }

    pub fn print_menu<W: Write>(&self, out: &mut W, options: &[MenuOption]) -> anyhow::Result<()> {
        let headers = vec![
            "Action".to_string(),
            "Label".to_string(),
            "Shortcut".to_string(),
        ];
        let rows = options
            .iter()
            .map(|option| {
                vec![
                    option.action.as_str().to_string(),
                    option.text.to_string(),
                    option.shortcut.unwrap_or_default().to_string(),
                ]
            })
            .collect();
        write_table(out, headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let mut line = String::new();
    for (header, &width) in headers.iter().zip(&widths) {
        line.push_str(&format!("{header:width$} "));
    }
    writeln!(writer, "{}", line.trim_end())?;

    line.clear();
    for &width in &widths {
        line.push_str(&format!("{:-<width$} ", ""));
    }
    writeln!(writer, "{}", line.trim_end())?;

    for row in rows {
        line.clear();
        for (cell, &width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            line.push_str(cell);
            line.push_str(&" ".repeat(padding));
            line.push(' ');
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
