//! text bar charts for the terminal; input is plain (label, seconds) data
//! straight from the stat module

use crate::clock::fmt_clock;

pub const BAR_WIDTH : usize = 40;

/// horizontal bar chart, one row per entry, scaled to the largest value:
///
/// ```text
/// Mon 2024-01-01 |########            | 02:00:00
/// ```
pub fn bar_chart(rows : &[(String, i64)], width : usize) -> String
{
    let max = rows.iter().map(|(_, s)| *s).max().unwrap_or(0).max(0);
    let label_w = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();

    for (label, secs) in rows
    {
        let secs = (*secs).max(0);
        let filled = if max == 0
        {
            0
        }
        else
        {
            // round up so any logged time shows at least one mark
            ((secs as u128 * width as u128 + max as u128 - 1) / max as u128) as usize
        };

        out.push_str(&format!(
            "{:<lw$} |{}{}| {}\n",
            label,
            "#".repeat(filled),
            " ".repeat(width - filled),
            fmt_clock(secs as u64),
            lw = label_w,
        ));
    }

    out
}

/// `[#####     ] 50%` progress toward the daily goal
pub fn progress_bar(progress : f64, width : usize) -> String
{
    let p = progress.clamp(0.0, 1.0);
    let filled = (p * width as f64).round() as usize;

    format!("[{}{}] {:3.0}%", "#".repeat(filled), " ".repeat(width - filled), p * 100.)
}
