use super::parser::{BinOp, Expr, Func, PoolField, StackProp, VarRef};
use super::ExprError;
use buff_core::{ActorCombatState, PoolKind};
use dice_core::{DiceFormula, Roller};

/// Supplies values for references and dice during evaluation
pub trait Resolver {
    fn resolve(&self, var: &VarRef) -> f64;
    fn roll(&mut self, dice: &DiceFormula) -> f64;
}

/// Resolves references against the acting actor and rolls through a roller
pub struct ActorResolver<'a> {
    actor: &'a ActorCombatState,
    roller: &'a mut dyn Roller,
}

impl<'a> ActorResolver<'a> {
    pub fn new(actor: &'a ActorCombatState, roller: &'a mut dyn Roller) -> Self {
        ActorResolver { actor, roller }
    }
}

impl Resolver for ActorResolver<'_> {
    fn resolve(&self, var: &VarRef) -> f64 {
        match var {
            VarRef::Stack(key, StackProp::Layers) => self.actor.stack_layers(key) as f64,
            VarRef::Stack(key, StackProp::Potency) => self.actor.stack_potency(key) as f64,
            VarRef::Pool(PoolField::Extra) | VarRef::Pool(PoolField::Bonus) => {
                self.actor.available(PoolKind::Bonus) as f64
            }
            VarRef::Pool(PoolField::Primary) => self.actor.available(PoolKind::Primary) as f64,
            VarRef::Pool(PoolField::Used) => self.actor.pools().spent(PoolKind::Primary) as f64,
        }
    }

    fn roll(&mut self, dice: &DiceFormula) -> f64 {
        self.roller.roll(dice).total as f64
    }
}

impl Expr {
    /// Evaluate against a resolver; non-finite results are errors
    pub fn eval(&self, resolver: &mut dyn Resolver) -> Result<f64, ExprError> {
        let value = self.eval_inner(resolver)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ExprError::NonFinite)
        }
    }

    fn eval_inner(&self, resolver: &mut dyn Resolver) -> Result<f64, ExprError> {
        Ok(match self {
            Expr::Num(n) => *n,
            Expr::Var(var) => resolver.resolve(var),
            Expr::Dice(dice) => resolver.roll(dice),
            Expr::Neg(inner) => -inner.eval_inner(resolver)?,
            Expr::Binary(op, lhs, rhs) => {
                let l = lhs.eval_inner(resolver)?;
                let r = rhs.eval_inner(resolver)?;
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Rem => l % r,
                }
            }
            Expr::Call(func, args) => {
                let values = args
                    .iter()
                    .map(|a| a.eval_inner(resolver))
                    .collect::<Result<Vec<_>, _>>()?;
                apply(*func, &values)
            }
        })
    }

    /// Whether evaluating this tree would roll dice
    pub fn has_dice(&self) -> bool {
        match self {
            Expr::Dice(_) => true,
            Expr::Num(_) | Expr::Var(_) => false,
            Expr::Neg(inner) => inner.has_dice(),
            Expr::Binary(_, lhs, rhs) => lhs.has_dice() || rhs.has_dice(),
            Expr::Call(_, args) => args.iter().any(Expr::has_dice),
        }
    }
}

fn apply(func: Func, values: &[f64]) -> f64 {
    let first = values.first().copied().unwrap_or(f64::NAN);
    match func {
        Func::Floor => first.floor(),
        Func::Ceil => first.ceil(),
        Func::Round => first.round(),
        Func::Abs => first.abs(),
        Func::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Func::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
    }
}
