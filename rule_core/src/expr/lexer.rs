use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Ident(String),
    /// `{name}` or `{name.property}`
    Reference(String, Option<String>),
    /// `NdM`
    Dice(u32, u32),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        match ch {
            c if c.is_whitespace() => pos += 1,
            '+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                pos += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                pos += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                pos += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            '{' => {
                let (token, next) = lex_reference(&chars, pos)?;
                tokens.push(token);
                pos = next;
            }
            '}' => return Err(ExprError::UnbalancedBrace(pos)),
            c if c.is_ascii_digit() || c == '.' => {
                let (token, next) = lex_number_or_dice(&chars, pos)?;
                tokens.push(token);
                pos = next;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                tokens.push(implicit_dice(&word).unwrap_or(Token::Ident(word)));
            }
            other => return Err(ExprError::UnexpectedChar(other, pos)),
        }
    }

    Ok(tokens)
}

fn lex_reference(chars: &[char], open: usize) -> Result<(Token, usize), ExprError> {
    let mut pos = open + 1;
    while pos < chars.len() && chars[pos] != '}' {
        if chars[pos] == '{' {
            return Err(ExprError::UnbalancedBrace(pos));
        }
        pos += 1;
    }
    if pos >= chars.len() {
        return Err(ExprError::UnbalancedBrace(open));
    }

    let inner: String = chars[open + 1..pos].iter().collect();
    let inner = inner.trim();
    if inner.is_empty() {
        return Err(ExprError::EmptyReference(open));
    }

    // The property is whatever follows the last dot, so custom names may
    // contain spaces but not dots.
    let token = match inner.rsplit_once('.') {
        Some((name, property)) => Token::Reference(name.trim().to_string(), Some(property.trim().to_string())),
        None => Token::Reference(inner.to_string(), None),
    };
    Ok((token, pos + 1))
}

fn lex_number_or_dice(chars: &[char], start: usize) -> Result<(Token, usize), ExprError> {
    let mut pos = start;
    while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
        pos += 1;
    }
    let text: String = chars[start..pos].iter().collect();

    // `NdM` - the `d` must follow the digits directly
    if pos + 1 < chars.len() && matches!(chars[pos], 'd' | 'D') && chars[pos + 1].is_ascii_digit() {
        let count: u32 = text.parse().map_err(|_| ExprError::BadNumber(text.clone()))?;
        let sides_start = pos + 1;
        let mut end = sides_start;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
        let sides_text: String = chars[sides_start..end].iter().collect();
        let sides: u32 = sides_text
            .parse()
            .map_err(|_| ExprError::BadNumber(sides_text.clone()))?;
        return Ok((Token::Dice(count, sides), end));
    }

    let value: f64 = text.parse().map_err(|_| ExprError::BadNumber(text.clone()))?;
    Ok((Token::Number(value), pos))
}

/// `d20` written without a count
fn implicit_dice(word: &str) -> Option<Token> {
    let sides = word.strip_prefix(['d', 'D'])?;
    if sides.is_empty() || !sides.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    sides.parse().ok().map(|s| Token::Dice(1, s))
}
