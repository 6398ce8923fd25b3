//! Translation of WHERE expressions into the search engine's filter-query syntax.
//!
//! Conjunctive equality is the well-supported path. Other operators are
//! mapped on a best-effort basis: comparisons become range queries, `LIKE`
//! becomes a wildcard query, and negations use the `*:*` base when they
//! appear where a pure negative clause would match nothing.

use crate::query::ast::{CompareOp, Expr, Literal};

/// Characters with a meaning in the native query syntax.
const SPECIAL_CHARS: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
    '/', ' ',
];

/// Escape a bare term so it is matched literally.
pub fn escape_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if SPECIAL_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Quote a phrase value, escaping embedded quotes and backslashes.
pub fn quote_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn literal_value(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => quote_value(s),
        Literal::Number(n) => n.clone(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "*".to_string(),
    }
}

fn like_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' => out.push('*'),
            '_' => out.push('?'),
            c if SPECIAL_CHARS.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// A rendered clause and whether it only excludes documents.
struct Clause {
    text: String,
    negative: bool,
}

impl Clause {
    fn positive(text: String) -> Self {
        Self {
            text,
            negative: false,
        }
    }

    fn negative(text: String) -> Self {
        Self {
            text,
            negative: true,
        }
    }

    fn negate_if(text: String, negated: bool) -> Self {
        if negated {
            Self::negative(format!("-{text}"))
        } else {
            Self::positive(text)
        }
    }

    /// Form that can stand alone as an OR operand or under a negation.
    fn standalone(self) -> String {
        if self.negative {
            format!("(*:* {})", self.text)
        } else {
            self.text
        }
    }
}

/// Render a WHERE expression as one filter query.
pub fn to_filter_query(expr: &Expr) -> String {
    render(expr).text
}

fn render(expr: &Expr) -> Clause {
    match expr {
        Expr::And(items) => {
            let parts: Vec<Clause> = items.iter().map(render).collect();
            let negative = parts.iter().all(|p| p.negative);
            let text = parts
                .into_iter()
                .map(|p| {
                    if p.text.contains(" OR ") && !p.negative {
                        format!("({})", p.text)
                    } else {
                        p.text
                    }
                })
                .collect::<Vec<_>>()
                .join(" AND ");
            Clause { text, negative }
        }
        Expr::Or(items) => Clause::positive(
            items
                .iter()
                .map(|item| {
                    let clause = render(item);
                    // a bare conjunction would bind its operands to the whole OR
                    if !clause.negative && matches!(item, Expr::And(_)) {
                        format!("({})", clause.text)
                    } else {
                        clause.standalone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" OR "),
        ),
        Expr::Not(inner) => {
            let inner = render(inner);
            let text = if inner.negative {
                inner.standalone()
            } else if inner.text.contains(' ') {
                format!("({})", inner.text)
            } else {
                inner.text
            };
            Clause::negative(format!("-{text}"))
        }
        Expr::Compare { column, op, value } => {
            let v = literal_value(value);
            match op {
                CompareOp::Eq => Clause::positive(format!("{column}:{v}")),
                CompareOp::NotEq => Clause::negative(format!("-{column}:{v}")),
                CompareOp::Gt => Clause::positive(format!("{column}:{{{v} TO *]")),
                CompareOp::GtEq => Clause::positive(format!("{column}:[{v} TO *]")),
                CompareOp::Lt => Clause::positive(format!("{column}:[* TO {v}}}")),
                CompareOp::LtEq => Clause::positive(format!("{column}:[* TO {v}]")),
            }
        }
        Expr::InList {
            column,
            values,
            negated,
        } => {
            let joined = values.iter().map(literal_value).collect::<Vec<_>>().join(" OR ");
            Clause::negate_if(format!("{column}:({joined})"), *negated)
        }
        Expr::IsNull { column, negated } => {
            // IS NULL excludes every document that has a value
            Clause::negate_if(format!("{column}:[* TO *]"), !*negated)
        }
        Expr::Like {
            column,
            pattern,
            negated,
        } => Clause::negate_if(format!("{column}:{}", like_pattern(pattern)), *negated),
        Expr::Between {
            column,
            low,
            high,
            negated,
        } => Clause::negate_if(
            format!("{column}:[{} TO {}]", literal_value(low), literal_value(high)),
            *negated,
        ),
    }
}
