//! Query parsing and boolean evaluation against an [`Index`].
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or      := and ( ["OR"] and )*        adjacent clauses are ORed
//! and     := unary ( "AND" unary )*
//! unary   := "NOT" unary | primary
//! primary := "(" or ")" | '"' phrase '"' | word
//! ```
//!
//! Words and phrases are normalized with the index tokenizer. A word that
//! splits into several tokens (`e-mail`) is matched as a phrase.

use std::collections::BTreeSet;

use crate::error::{Result, SearchError};
use crate::tokenizer::terms;
use crate::{DocId, Index};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Term(String),
    /// Consecutive terms
    Phrase(Vec<String>),
    And(Vec<Query>),
    Or(Vec<Query>),
    Not(Box<Query>),
    /// A word with no indexable characters; matches nothing
    Null,
}

/// Evaluation output: matching documents plus the query terms that found them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    /// Ascending doc ids
    pub doc_ids: Vec<DocId>,
    pub matched_terms: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexeme {
    Word(String),
    Quoted(String),
    LParen,
    RParen,
    And,
    Or,
    Not,
}

/// Split a query into lexemes tagged with their byte offset.
fn lex(query: &str) -> Result<Vec<(Lexeme, usize)>> {
    let mut out = Vec::new();
    let mut chars = query.char_indices().peekable();
    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                out.push((Lexeme::LParen, offset));
            }
            ')' => {
                chars.next();
                out.push((Lexeme::RParen, offset));
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(SearchError::syntax(offset, "unterminated quote"));
                }
                out.push((Lexeme::Quoted(text), offset));
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                let lexeme = match word.as_str() {
                    "AND" => Lexeme::And,
                    "OR" => Lexeme::Or,
                    "NOT" => Lexeme::Not,
                    _ => Lexeme::Word(word),
                };
                out.push((lexeme, offset));
            }
        }
    }
    Ok(out)
}

fn text_query(text: &str) -> Query {
    let mut toks: Vec<String> = terms(text).collect();
    match toks.len() {
        0 => Query::Null,
        1 => Query::Term(toks.remove(0)),
        _ => Query::Phrase(toks),
    }
}

fn collapse(mut clauses: Vec<Query>, wrap: fn(Vec<Query>) -> Query) -> Query {
    if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        wrap(clauses)
    }
}

struct Parser {
    lexemes: Vec<(Lexeme, usize)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.pos).map(|(l, _)| l)
    }

    fn offset(&self) -> usize {
        self.lexemes.get(self.pos).map(|(_, o)| *o).unwrap_or(self.end)
    }

    fn parse_or(&mut self) -> Result<Query> {
        let mut clauses = vec![self.parse_and()?];
        loop {
            match self.peek() {
                None | Some(Lexeme::RParen) => break,
                Some(Lexeme::Or) => {
                    self.pos += 1;
                    clauses.push(self.parse_and()?);
                }
                Some(_) => clauses.push(self.parse_and()?),
            }
        }
        Ok(collapse(clauses, Query::Or))
    }

    fn parse_and(&mut self) -> Result<Query> {
        let mut clauses = vec![self.parse_unary()?];
        while self.peek() == Some(&Lexeme::And) {
            self.pos += 1;
            clauses.push(self.parse_unary()?);
        }
        Ok(collapse(clauses, Query::And))
    }

    fn parse_unary(&mut self) -> Result<Query> {
        if self.peek() == Some(&Lexeme::Not) {
            self.pos += 1;
            return Ok(Query::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Query> {
        let offset = self.offset();
        let Some((lexeme, _)) = self.lexemes.get(self.pos).cloned() else {
            return Err(SearchError::syntax(offset, "expected a term"));
        };
        self.pos += 1;
        match lexeme {
            Lexeme::Word(w) => Ok(text_query(&w)),
            Lexeme::Quoted(p) => Ok(text_query(&p)),
            Lexeme::LParen => {
                let inner = self.parse_or()?;
                if self.peek() != Some(&Lexeme::RParen) {
                    return Err(SearchError::syntax(offset, "unclosed parenthesis"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Lexeme::RParen => Err(SearchError::syntax(offset, "unexpected ')'")),
            Lexeme::And | Lexeme::Or | Lexeme::Not => {
                Err(SearchError::syntax(offset, "operator is missing an operand"))
            }
        }
    }
}

/// Parse a free-text query. Offsets in syntax errors are byte offsets into `query`.
pub fn parse(query: &str) -> Result<Query> {
    if query.trim().is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    let mut parser = Parser { lexemes: lex(query)?, pos: 0, end: query.len() };
    let parsed = parser.parse_or()?;
    if parser.pos < parser.lexemes.len() {
        return Err(SearchError::syntax(parser.offset(), "unbalanced ')'"));
    }
    Ok(parsed)
}

fn intersect(a: &BTreeSet<DocId>, b: &BTreeSet<DocId>) -> BTreeSet<DocId> {
    a.intersection(b).copied().collect()
}

impl Query {
    /// Doc ids matching this query.
    pub fn evaluate(&self, index: &Index) -> Result<BTreeSet<DocId>> {
        match self {
            Query::Null => Ok(BTreeSet::new()),
            Query::Term(t) => Ok(index.inverted.postings(t).iter().copied().collect()),
            Query::Phrase(phrase) if phrase.is_empty() => Ok(BTreeSet::new()),
            Query::Phrase(phrase) => {
                let mut candidates: Option<BTreeSet<DocId>> = None;
                for t in phrase {
                    let postings: BTreeSet<DocId> = index.inverted.postings(t).iter().copied().collect();
                    candidates = Some(match candidates {
                        None => postings,
                        Some(c) => intersect(&c, &postings),
                    });
                }
                let mut out = BTreeSet::new();
                for doc_id in candidates.unwrap_or_default() {
                    let content_terms: Vec<String> = terms(&index.docs.get(doc_id)?.content).collect();
                    if content_terms.windows(phrase.len()).any(|w| w == phrase.as_slice()) {
                        out.insert(doc_id);
                    }
                }
                Ok(out)
            }
            Query::And(clauses) => {
                let mut acc: Option<BTreeSet<DocId>> = None;
                for c in clauses {
                    let docs = c.evaluate(index)?;
                    acc = Some(match acc {
                        None => docs,
                        Some(a) => intersect(&a, &docs),
                    });
                    if acc.as_ref().is_some_and(BTreeSet::is_empty) {
                        break;
                    }
                }
                Ok(acc.unwrap_or_default())
            }
            Query::Or(clauses) => {
                let mut acc = BTreeSet::new();
                for c in clauses {
                    acc.extend(c.evaluate(index)?);
                }
                Ok(acc)
            }
            Query::Not(inner) => {
                let excluded = inner.evaluate(index)?;
                Ok((0..index.num_docs() as DocId).filter(|d| !excluded.contains(d)).collect())
            }
        }
    }

    /// Terms outside any `NOT`; only these can be highlighted.
    pub fn positive_terms(&self, out: &mut BTreeSet<String>) {
        match self {
            Query::Term(t) => {
                out.insert(t.clone());
            }
            Query::Phrase(p) => out.extend(p.iter().cloned()),
            Query::And(cs) | Query::Or(cs) => cs.iter().for_each(|c| c.positive_terms(out)),
            Query::Not(_) | Query::Null => {}
        }
    }
}

impl Index {
    /// Evaluate `query`, returning matching doc ids and the positive query
    /// terms that occur in at least one of them.
    pub fn search(&self, query: &str) -> Result<SearchHits> {
        let parsed = parse(query)?;
        let matched = parsed.evaluate(self)?;

        let mut candidates = BTreeSet::new();
        parsed.positive_terms(&mut candidates);
        let matched_terms = candidates
            .into_iter()
            .filter(|t| self.inverted.postings(t).iter().any(|d| matched.contains(d)))
            .collect();

        tracing::debug!(query, hits = matched.len(), "evaluated query");
        Ok(SearchHits { doc_ids: matched.into_iter().collect(), matched_terms })
    }
}
