//! Small arithmetic evaluator for chat messages.
//!
//! Grammar, loosest binding first:
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '%') unary)*
//! unary  := ('+' | '-') unary | power
//! power  := atom ('^' unary)?
//! atom   := number | '(' expr ')'
//! ```
//! `^` is right-associative and binds tighter than unary minus, so
//! `-2^2 = -4` and `2^3^2 = 512`. `%` is the floating point remainder.

use crate::error::CalcError;

/// Deepest nesting of parentheses, signs and exponents accepted.
pub const MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    Open,
    Close,
}

/// Evaluates `expr`, rounding the result to 5 decimal places.
pub fn calculate(expr: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(tok) = parser.peek() {
        return Err(CalcError::Syntax(describe(Some(tok))));
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }

    let rounded = (value * 100_000.0).round() / 100_000.0;
    // avoid printing "-0"
    Ok(if rounded == 0.0 { 0.0 } else { rounded })
}

fn tokenize(expr: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut lit = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        lit.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = lit.parse::<f64>().map_err(|_| CalcError::BadNumber(lit))?;
                tokens.push(Token::Num(n));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            other => return Err(CalcError::InvalidChar(other)),
        }
    }
    Ok(tokens)
}

fn describe(tok: Option<&Token>) -> String {
    match tok {
        None => "end of expression".to_string(),
        Some(Token::Num(n)) => format!("number {n}"),
        Some(Token::Op(op)) => format!("operator '{op}'"),
        Some(Token::Open) => "'('".to_string(),
        Some(Token::Close) => "')'".to_string(),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            acc = match op {
                '*' => acc * rhs,
                '/' => acc / rhs,
                _ => acc % rhs,
            };
        }
        Ok(acc)
    }

    // Every recursive path (parentheses, signs, exponents) passes through here.
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let value = match self.eat_op(&['+', '-']) {
            Some('-') => self.unary().map(|v| -v),
            Some(_) => self.unary(),
            None => self.power(),
        };
        self.depth -= 1;
        value
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.atom()?;
        if self.eat_op(&['^']).is_some() {
            let exp = self.unary()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Open) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    other => Err(CalcError::Syntax(describe(other.as_ref()))),
                }
            }
            other => Err(CalcError::Syntax(describe(other.as_ref()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(calculate("5 + 7 * 2"), Ok(19.0));
        assert_eq!(calculate("(5 + 7) * 2"), Ok(24.0));
        assert_eq!(calculate("10 - 4 - 3"), Ok(3.0));
        assert_eq!(calculate("17 % 5"), Ok(2.0));
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(calculate("2^3^2"), Ok(512.0));
        assert_eq!(calculate("-2^2"), Ok(-4.0));
        assert_eq!(calculate("2^-1"), Ok(0.5));
    }

    #[test]
    fn test_rounds_to_five_places() {
        assert_eq!(calculate("1/3"), Ok(0.33333));
        assert_eq!(calculate("2/3"), Ok(0.66667));
        assert_eq!(calculate("-0.000001"), Ok(0.0));
    }

    #[test]
    fn test_rejects_unsupported_input() {
        assert_eq!(calculate("hello"), Err(CalcError::InvalidChar('h')));
        assert_eq!(calculate("   "), Err(CalcError::Empty));
        assert_eq!(calculate("1.2.3"), Err(CalcError::BadNumber("1.2.3".into())));
        assert_eq!(calculate("1 / 0"), Err(CalcError::NotFinite));
        assert_eq!(calculate("0 % 0"), Err(CalcError::NotFinite));
        assert_eq!(calculate("(1 + 2").unwrap_err().as_label(), "calc_syntax");
        assert_eq!(calculate("1 2").unwrap_err().as_label(), "calc_syntax");
        assert_eq!(calculate("* 3").unwrap_err().as_label(), "calc_syntax");
    }

    #[test]
    fn test_nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(calculate(&deep), Err(CalcError::TooDeep(MAX_DEPTH)));
        assert_eq!(
            calculate(&format!("{}1", "-".repeat(100_000))),
            Err(CalcError::TooDeep(MAX_DEPTH))
        );
        assert_eq!(
            calculate(&format!("2{}", "^1".repeat(100_000))),
            Err(CalcError::TooDeep(MAX_DEPTH))
        );

        let ok = format!("{}7{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(calculate(&ok), Ok(7.0));
        assert_eq!(calculate("--3"), Ok(3.0));
    }
}
