use super::lexer::Token;
use super::ExprError;
use buff_core::StackKey;
use dice_core::DiceFormula;

/// Stack property a reference reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackProp {
    Layers,
    Potency,
}

/// Pooled-resource count a reference reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolField {
    /// Available bonus slots
    Extra,
    /// Spent primary slots
    Used,
    /// Available primary slots
    Primary,
    /// Available bonus slots
    Bonus,
}

/// A resolved `{...}` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarRef {
    Stack(StackKey, StackProp),
    Pool(PoolField),
}

/// Whitelisted functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Floor,
    Ceil,
    Round,
    Max,
    Min,
    Abs,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "floor" => Some(Func::Floor),
            "ceil" => Some(Func::Ceil),
            "round" => Some(Func::Round),
            "max" => Some(Func::Max),
            "min" => Some(Func::Min),
            "abs" => Some(Func::Abs),
            _ => None,
        }
    }

    fn check_arity(&self, name: &str, count: usize) -> Result<(), ExprError> {
        let ok = match self {
            Func::Max | Func::Min => count >= 1,
            _ => count == 1,
        };
        if ok {
            Ok(())
        } else {
            Err(ExprError::Arity(name.to_string(), count))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(VarRef),
    Dice(DiceFormula),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, ExprError> {
        if self.tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        let expr = self.parse_add()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(ExprError::Trailing(format!("{:?}", token))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        match self.advance() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(ExprError::Unexpected(format!("{:?}", t))),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn parse_add(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Num(n)),
            Some(Token::Dice(count, sides)) => {
                if count == 0 || sides == 0 || count > dice_core::MAX_DICE {
                    return Err(ExprError::BadDice(format!("{}d{}", count, sides)));
                }
                Ok(Expr::Dice(DiceFormula::new(count, sides)))
            }
            Some(Token::Reference(name, property)) => Ok(Expr::Var(resolve_reference(&name, property.as_deref())?)),
            Some(Token::LParen) => {
                let inner = self.parse_add()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() != Some(&Token::LParen) {
                    return Err(ExprError::BareIdentifier(name));
                }
                let func = Func::lookup(&name).ok_or_else(|| ExprError::UnknownFunction(name.clone()))?;
                self.advance();
                let args = self.parse_args()?;
                func.check_arity(&name, args.len())?;
                Ok(Expr::Call(func, args))
            }
            Some(other) => Err(ExprError::Unexpected(format!("{:?}", other))),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_add()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                Some(other) => return Err(ExprError::Unexpected(format!("{:?}", other))),
                None => return Err(ExprError::UnexpectedEnd),
            }
        }
        Ok(args)
    }
}

fn resolve_reference(name: &str, property: Option<&str>) -> Result<VarRef, ExprError> {
    if name == "pooled" {
        let field = match property {
            Some("extra") => PoolField::Extra,
            Some("used") => PoolField::Used,
            Some("primary") => PoolField::Primary,
            Some("bonus") => PoolField::Bonus,
            _ => return Err(ExprError::UnknownProperty(format!("pooled.{}", property.unwrap_or("")))),
        };
        return Ok(VarRef::Pool(field));
    }

    let prop = match property {
        None | Some("layers") => StackProp::Layers,
        Some("potency") => StackProp::Potency,
        Some(other) => return Err(ExprError::UnknownProperty(format!("{}.{}", name, other))),
    };
    if name.is_empty() {
        return Err(ExprError::UnknownProperty(format!(".{}", property.unwrap_or(""))));
    }
    Ok(VarRef::Stack(StackKey::parse(name), prop))
}
