use super::TimeRange;
use chrono::{DateTime, Utc};

const TIME_FILTER: &str = "$__timeFilter(";

fn timestamp_literal(ts: &DateTime<Utc>) -> String {
    format!("TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
}

/// Byte offset of the `)` closing a macro argument, skipping nested
/// parentheses and quoted text.
fn closing_paren(arg: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in arg.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') if depth == 0 => return Some(i),
            (None, ')') => depth -= 1,
            _ => {}
        }
    }
    None
}

fn expand_time_filters(sql: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    while let Some(start) = rest.find(TIME_FILTER) {
        let arg_start = start + TIME_FILTER.len();
        // Unbalanced: leave the remainder untouched.
        let Some(len) = closing_paren(&rest[arg_start..]) else {
            break;
        };
        let column = rest[arg_start..arg_start + len].trim();
        let end = arg_start + len + 1;

        out.push_str(&rest[..start]);
        if column.is_empty() {
            out.push_str(&rest[start..end]);
        } else {
            out.push_str(&format!("{} BETWEEN {} AND {}", column, from, to));
        }
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

/// Expands `$__timeFilter(expr)`, `$__timeFrom` and `$__timeTo` against `range`.
///
/// SQL without macros, or a missing range, comes back unchanged.
pub fn interpolate(sql: &str, range: Option<&TimeRange>) -> String {
    let Some(range) = range else {
        return sql.to_string();
    };
    if !sql.contains("$__time") {
        return sql.to_string();
    }

    let from = timestamp_literal(&range.from);
    let to = timestamp_literal(&range.to);

    expand_time_filters(sql, &from, &to)
        .replace("$__timeFrom", &from)
        .replace("$__timeTo", &to)
}
