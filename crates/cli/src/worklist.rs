//! Manual-mode worklist export.
//!
//! Renders the approved price actions as a standalone HTML page the
//! user can open in a browser: one row per action with a direct edit
//! link, so applying the changes by hand is a matter of clicking down
//! the list.

use std::path::Path;

use relist_engine::model::PriceAction;
use relist_engine::money::format_minor;

use crate::exit_codes::EXIT_RUN_WORKLIST;
use crate::CliError;

pub fn write_worklist(
    path: &Path,
    actions: &[PriceAction],
    profile: &str,
    generated_at: &str,
) -> Result<(), CliError> {
    let html = render(actions, profile, generated_at);
    std::fs::write(path, html).map_err(|e| CliError {
        code: EXIT_RUN_WORKLIST,
        message: format!("cannot write worklist {}: {}", path.display(), e),
        hint: None,
    })
}

fn render(actions: &[PriceAction], profile: &str, generated_at: &str) -> String {
    let mut out = String::with_capacity(2048 + actions.len() * 256);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Price worklist</title>\n<style>\n");
    out.push_str(
        "body{font-family:sans-serif;margin:2em}table{border-collapse:collapse}\n\
         th,td{border:1px solid #ccc;padding:.4em .8em;text-align:left}\n\
         td.num{text-align:right;font-variant-numeric:tabular-nums}\n\
         tr.done{opacity:.4;text-decoration:line-through}\n",
    );
    out.push_str("</style>\n</head>\n<body>\n");

    out.push_str(&format!(
        "<h1>Price worklist</h1>\n<p>Profile {} &middot; generated {} &middot; {} item(s)</p>\n",
        escape(profile),
        escape(generated_at),
        actions.len(),
    ));

    if actions.is_empty() {
        out.push_str("<p>Nothing to do.</p>\n</body>\n</html>\n");
        return out;
    }

    out.push_str("<table>\n<tr><th></th><th>Item</th><th>Current</th><th>New</th><th>%</th><th></th></tr>\n");

    for action in actions {
        out.push_str("<tr onclick=\"this.classList.toggle('done')\">");
        out.push_str(&format!("<td>{}</td>", escape(&action.item_id)));
        out.push_str(&format!("<td>{}</td>", escape(&action.title)));
        out.push_str(&format!("<td class=\"num\">{}</td>", format_minor(action.current_minor)));
        out.push_str(&format!("<td class=\"num\">{}</td>", format_minor(action.target_minor)));
        out.push_str(&format!("<td class=\"num\">{:+}</td>", action.change_percent));
        if action.url.is_empty() {
            out.push_str("<td></td>");
        } else {
            out.push_str(&format!(
                "<td><a href=\"{0}/edit\" target=\"_blank\">edit</a></td>",
                escape(&action.url),
            ));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</table>\n</body>\n</html>\n");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
