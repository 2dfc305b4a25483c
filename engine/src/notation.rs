use thiserror::Error;

use crate::Dice;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("empty dice expression")]
    Empty,
    #[error("invalid term '{term}' in dice expression '{expr}'")]
    BadTerm { expr: String, term: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    /// `count` dice of `sides` faces; `sign` applies to the subtotal.
    Roll { sign: i32, count: u32, sides: u32 },
    Flat(i32),
}

/// A parsed dice expression: a sum of signed terms, each either a bare
/// integer or `[count]d<sides>` (omitted count = 1). `"2d6+3"`, `"-1d4"`,
/// `"5"` and `"1d8+1d4+2"` are all valid; whitespace is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceExpr {
    terms: Vec<Term>,
}

impl DiceExpr {
    pub fn parse(input: &str) -> Result<Self, NotationError> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(NotationError::Empty);
        }

        let mut terms = Vec::new();
        let mut start = 0;
        for (i, c) in compact.char_indices().skip(1) {
            if c == '+' || c == '-' {
                terms.push(parse_term(input, &compact[start..i])?);
                start = i;
            }
        }
        terms.push(parse_term(input, &compact[start..])?);

        Ok(Self { terms })
    }

    pub fn roll(&self, dice: &mut Dice) -> i32 {
        let mut total = 0;
        for term in &self.terms {
            match *term {
                Term::Roll { sign, count, sides } => {
                    let mut subtotal = 0;
                    for _ in 0..count {
                        subtotal += dice.die(sides as i32);
                    }
                    total += sign * subtotal;
                }
                Term::Flat(v) => total += v,
            }
        }
        total
    }

    /// Statistical mean: an `NdM` term contributes `N*(M+1)/2`.
    pub fn average(&self) -> f64 {
        self.terms
            .iter()
            .map(|term| match *term {
                Term::Roll { sign, count, sides } => {
                    f64::from(sign) * f64::from(count) * (f64::from(sides) + 1.0) / 2.0
                }
                Term::Flat(v) => f64::from(v),
            })
            .sum()
    }

    /// Minimum and maximum possible totals.
    pub fn bounds(&self) -> (i32, i32) {
        let mut lo = 0;
        let mut hi = 0;
        for term in &self.terms {
            match *term {
                Term::Roll { sign, count, sides } => {
                    let a = sign * count as i32;
                    let b = sign * (count * sides) as i32;
                    lo += a.min(b);
                    hi += a.max(b);
                }
                Term::Flat(v) => {
                    lo += v;
                    hi += v;
                }
            }
        }
        (lo, hi)
    }
}

fn parse_term(expr: &str, term: &str) -> Result<Term, NotationError> {
    let bad = || NotationError::BadTerm {
        expr: expr.to_string(),
        term: term.to_string(),
    };

    let (sign, body) = match term.as_bytes().first() {
        Some(b'+') => (1, &term[1..]),
        Some(b'-') => (-1, &term[1..]),
        _ => (1, term),
    };
    if body.is_empty() {
        return Err(bad());
    }

    if let Some((count, sides)) = body.split_once('d') {
        let count: u32 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| bad())?
        };
        let sides: u32 = sides.parse().map_err(|_| bad())?;
        if sides == 0 {
            return Err(bad());
        }
        Ok(Term::Roll { sign, count, sides })
    } else {
        let value: i32 = body.parse().map_err(|_| bad())?;
        Ok(Term::Flat(sign * value))
    }
}

/// Parse-and-roll in one step. Expressions live as strings on actions and
/// are parsed at the moment of the roll, so a malformed one surfaces here
/// and aborts the encounter in progress.
pub fn roll_dice(dice: &mut Dice, expr: &str) -> Result<i32, NotationError> {
    Ok(DiceExpr::parse(expr)?.roll(dice))
}
