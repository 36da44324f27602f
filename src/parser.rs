use std::fs;
use std::io;

use thiserror::Error;

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Dimacs {
    /// Declared by the `p cnf` line, if any.
    pub num_vars: Option<usize>,
    pub clauses: DimacsClauses,
}

pub type DimacsClauses = Vec<Vec<i64>>;

#[derive(Error, Debug)]
pub enum DimacsError {
    #[error("could not read file: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: `{token}` is not a literal")]
    InvalidLiteral { line: usize, token: String },

    #[error("line {line}: malformed problem line `{text}`")]
    InvalidHeader { line: usize, text: String },

    #[error("clause {clause}: unbalanced parenthesis in `{text}`")]
    UnbalancedParenthesis { clause: usize, text: String },
}

pub fn parse_file(path: &str) -> Result<Dimacs, DimacsError> {
    let contents = fs::read_to_string(path)?;
    if path.ends_with(".txt") && contents.trim_start().starts_with('(') {
        parse_infix(&contents)
    } else {
        parse(&contents)
    }
}

/// Parses DIMACS CNF. A clause ends at `0` or at the end of its line; lines
/// starting with `c` or `%` and lone `0` lines are ignored.
pub fn parse(dimacs: &str) -> Result<Dimacs, DimacsError> {
    let mut result = Dimacs::default();
    for (idx, line) in dimacs.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') || line.starts_with('%') || line == "0" {
            continue;
        }
        if line.starts_with('p') {
            result.num_vars = Some(parse_header(idx + 1, line)?);
            continue;
        }
        let mut clause = Vec::new();
        for token in line.split_whitespace() {
            let num = token
                .parse::<i64>()
                .map_err(|_| DimacsError::InvalidLiteral {
                    line: idx + 1,
                    token: token.to_string(),
                })?;
            if num == 0 {
                result.clauses.push(clause);
                clause = Vec::new();
            } else {
                clause.push(num);
            }
        }
        if !clause.is_empty() {
            result.clauses.push(clause);
        }
    }
    Ok(result)
}

fn parse_header(line: usize, text: &str) -> Result<usize, DimacsError> {
    let invalid = || DimacsError::InvalidHeader {
        line,
        text: text.to_string(),
    };
    let parts: Vec<&str> = text.split_whitespace().collect();
    match parts.as_slice() {
        ["p", "cnf", vars, _clauses] => vars.parse::<usize>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Parses the infix form `(1 v 2) & (-1 v 3)`. `∧` may stand for `&`,
/// `∨` or `|` for `v`, and `¬` or `~` for `-`.
pub fn parse_infix(formula: &str) -> Result<Dimacs, DimacsError> {
    let mut result = Dimacs::default();
    let formula = formula.trim();
    if formula.is_empty() {
        return Ok(result);
    }
    for (idx, group) in formula.split(|c| c == '&' || c == '∧').enumerate() {
        let group = group.trim();
        let unbalanced = || DimacsError::UnbalancedParenthesis {
            clause: idx,
            text: group.to_string(),
        };
        let inner = match (group.starts_with('('), group.ends_with(')')) {
            (true, true) => &group[1..group.len() - 1],
            (false, false) => group,
            _ => return Err(unbalanced()),
        };
        if inner.contains('(') || inner.contains(')') {
            return Err(unbalanced());
        }
        let mut clause = Vec::new();
        for token in inner
            .split(|c| c == 'v' || c == '∨' || c == '|')
            .map(str::trim)
            .filter(|token| !token.is_empty())
        {
            clause.push(parse_infix_literal(idx, token)?);
        }
        result.clauses.push(clause);
    }
    Ok(result)
}

fn parse_infix_literal(clause: usize, token: &str) -> Result<i64, DimacsError> {
    let (negated, rest) = match token.chars().next() {
        Some(c @ '¬') | Some(c @ '~') => (true, token[c.len_utf8()..].trim()),
        _ => (false, token),
    };
    let num = rest
        .parse::<i64>()
        .ok()
        .filter(|num| *num != 0)
        .ok_or_else(|| DimacsError::InvalidLiteral {
            line: clause + 1,
            token: token.to_string(),
        })?;
    Ok(if negated { -num } else { num })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_without_terminator() {
        let dimacs = parse("-1\n1 2").unwrap();
        assert_eq!(vec![vec![-1], vec![1, 2]], dimacs.clauses);
        assert_eq!(None, dimacs.num_vars);
    }

    #[test]
    fn parses_header_and_comments() {
        let dimacs = parse(
            "c example
            p cnf 4 2
            1 -3 0
            2 4 -1 0
            %
            0
            ",
        )
        .unwrap();
        assert_eq!(Some(4), dimacs.num_vars);
        assert_eq!(vec![vec![1, -3], vec![2, 4, -1]], dimacs.clauses);
    }

    #[test]
    fn several_clauses_on_one_line() {
        let dimacs = parse("1 2 0 -1 0").unwrap();
        assert_eq!(vec![vec![1, 2], vec![-1]], dimacs.clauses);
    }

    #[test]
    fn rejects_garbage() {
        match parse("1 x 0") {
            Err(DimacsError::InvalidLiteral { line: 1, token }) => assert_eq!("x", token),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse("p dnf 3 1").is_err());
    }

    #[test]
    fn parses_infix_ascii() {
        let dimacs = parse_infix("(1v2) & (-1v3) & (-2v-3)").unwrap();
        assert_eq!(vec![vec![1, 2], vec![-1, 3], vec![-2, -3]], dimacs.clauses);
    }

    #[test]
    fn parses_infix_unicode() {
        let dimacs = parse_infix("(1 ∨ 2) ∧ (¬1 ∨ 3) ∧ (~2)").unwrap();
        assert_eq!(vec![vec![1, 2], vec![-1, 3], vec![-2]], dimacs.clauses);
    }

    #[test]
    fn infix_empty_group_is_empty_clause() {
        let dimacs = parse_infix("(1) & ()").unwrap();
        assert_eq!(vec![vec![1], vec![]], dimacs.clauses);
        assert!(parse_infix("").unwrap().clauses.is_empty());
    }

    #[test]
    fn infix_rejects_unbalanced() {
        assert!(parse_infix("(1 v 2 & (3)").is_err());
        assert!(parse_infix("(1 v 0)").is_err());
    }
}
