use crate::document::DocId;
use crate::index::InvertedIndex;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

lazy_static! {
    static ref QUERY_RE: Regex = Regex::new(r"\(|\)|\w+").expect("valid regex");
}

/// Rejected boolean queries. Lexing never fails; these come out of the
/// shunting-yard conversion or postfix evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("{0} is missing an operand")]
    MissingOperand(Operator),
    #[error("adjacent terms without an operator between them")]
    MissingOperator,
}

/// Boolean operators, in precedence order: NOT binds tightest, OR loosest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Not,
    And,
    Or,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::Not => 3,
            Operator::And => 2,
            Operator::Or => 1,
        }
    }

    /// NOT is a right-associative prefix operator; AND and OR associate left.
    fn is_right_associative(self) -> bool {
        matches!(self, Operator::Not)
    }

    fn from_word(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Operator::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Operator::Or)
        } else if word.eq_ignore_ascii_case("not") {
            Some(Operator::Not)
        } else {
            None
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Not => "NOT",
            Operator::And => "AND",
            Operator::Or => "OR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryToken {
    Open,
    Close,
    Op(Operator),
    Term(String),
}

/// One element of a query in postfix (reverse Polish) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostfixToken {
    Op(Operator),
    Term(String),
}

/// Splits a query into parentheses, operator words, and search terms.
/// Operator words match whole tokens only, so terms like `android` or
/// `nothing` stay terms. Search terms are lowercased to match the index.
fn lex(query: &str) -> Vec<QueryToken> {
    QUERY_RE
        .find_iter(query)
        .map(|m| match m.as_str() {
            "(" => QueryToken::Open,
            ")" => QueryToken::Close,
            word => match Operator::from_word(word) {
                Some(op) => QueryToken::Op(op),
                None => QueryToken::Term(word.to_lowercase()),
            },
        })
        .collect()
}

/// Converts an infix query to postfix with the shunting-yard algorithm.
///
/// An empty query yields an empty token list, which evaluates to no matches.
pub fn parse_query(query: &str) -> Result<Vec<PostfixToken>, QueryError> {
    #[derive(Clone, Copy)]
    enum StackItem {
        Open,
        Op(Operator),
    }

    let mut output = Vec::new();
    let mut operators: Vec<StackItem> = Vec::new();

    for token in lex(query) {
        match token {
            QueryToken::Open => operators.push(StackItem::Open),
            QueryToken::Close => loop {
                match operators.pop() {
                    Some(StackItem::Op(op)) => output.push(PostfixToken::Op(op)),
                    Some(StackItem::Open) => break,
                    None => return Err(QueryError::UnbalancedParens),
                }
            },
            QueryToken::Op(op) => {
                while let Some(&StackItem::Op(top)) = operators.last() {
                    let pops = if op.is_right_associative() {
                        top.precedence() > op.precedence()
                    } else {
                        top.precedence() >= op.precedence()
                    };
                    if !pops {
                        break;
                    }
                    operators.pop();
                    output.push(PostfixToken::Op(top));
                }
                operators.push(StackItem::Op(op));
            }
            QueryToken::Term(term) => output.push(PostfixToken::Term(term)),
        }
    }

    while let Some(item) = operators.pop() {
        match item {
            StackItem::Op(op) => output.push(PostfixToken::Op(op)),
            StackItem::Open => return Err(QueryError::UnbalancedParens),
        }
    }

    Ok(output)
}

fn pop_operand(
    operands: &mut Vec<BTreeSet<DocId>>,
    op: Operator,
) -> Result<BTreeSet<DocId>, QueryError> {
    operands.pop().ok_or(QueryError::MissingOperand(op))
}

/// Evaluates a postfix query against the index with set algebra. Terms load
/// their posting lists, AND intersects, OR unions, and NOT complements
/// against the document universe.
pub fn evaluate(postfix: &[PostfixToken], index: &InvertedIndex) -> Result<Vec<DocId>, QueryError> {
    let mut operands: Vec<BTreeSet<DocId>> = Vec::new();

    for token in postfix {
        match token {
            PostfixToken::Term(term) => {
                operands.push(index.postings(term).iter().copied().collect());
            }
            PostfixToken::Op(op) => {
                let set = match op {
                    Operator::Not => {
                        let operand = pop_operand(&mut operands, *op)?;
                        index
                            .document_universe()
                            .difference(&operand)
                            .copied()
                            .collect()
                    }
                    Operator::And => {
                        let right = pop_operand(&mut operands, *op)?;
                        let left = pop_operand(&mut operands, *op)?;
                        left.intersection(&right).copied().collect()
                    }
                    Operator::Or => {
                        let right = pop_operand(&mut operands, *op)?;
                        let left = pop_operand(&mut operands, *op)?;
                        left.union(&right).copied().collect()
                    }
                };
                operands.push(set);
            }
        }
    }

    match operands.pop() {
        Some(result) if operands.is_empty() => Ok(result.into_iter().collect()),
        Some(_) => Err(QueryError::MissingOperator),
        None => Ok(Vec::new()),
    }
}

/// Parses and evaluates `query`, returning matching documents in ascending
/// `DocId` order.
pub fn boolean_search(index: &InvertedIndex, query: &str) -> Result<Vec<DocId>, QueryError> {
    let postfix = parse_query(query)?;
    evaluate(&postfix, index)
}
