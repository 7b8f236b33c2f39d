//! Scramble generation and move-sequence manipulation.
//!
//! Timers only ever see scrambles as opaque strings coming out of a
//! [`ScrambleSource`]; the move types here exist so the generators can invert
//! and simplify algorithm material before printing it.

use clap::ValueEnum;
use itertools::Itertools;
use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Something that produces a fresh scramble each time it is asked.
pub trait ScrambleSource: fmt::Debug {
    fn next_scramble(&mut self) -> String;
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Zbll,
    ThreeByThree,
    TwoByTwo,
}

/// A turnable layer or whole-cube rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    R,
    L,
    U,
    D,
    F,
    B,
    WideR,
    WideL,
    WideU,
    WideD,
    WideF,
    WideB,
    M,
    E,
    S,
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Layer {
    const OUTER: [Layer; 6] = [Layer::R, Layer::L, Layer::U, Layer::D, Layer::F, Layer::B];

    pub fn axis(self) -> Axis {
        match self {
            Layer::R | Layer::L | Layer::WideR | Layer::WideL | Layer::M | Layer::X => Axis::X,
            Layer::U | Layer::D | Layer::WideU | Layer::WideD | Layer::E | Layer::Y => Axis::Y,
            Layer::F | Layer::B | Layer::WideF | Layer::WideB | Layer::S | Layer::Z => Axis::Z,
        }
    }

    fn symbol(self) -> char {
        match self {
            Layer::R => 'R',
            Layer::L => 'L',
            Layer::U => 'U',
            Layer::D => 'D',
            Layer::F => 'F',
            Layer::B => 'B',
            Layer::WideR => 'r',
            Layer::WideL => 'l',
            Layer::WideU => 'u',
            Layer::WideD => 'd',
            Layer::WideF => 'f',
            Layer::WideB => 'b',
            Layer::M => 'M',
            Layer::E => 'E',
            Layer::S => 'S',
            Layer::X => 'x',
            Layer::Y => 'y',
            Layer::Z => 'z',
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        let layer = match c {
            'R' => Layer::R,
            'L' => Layer::L,
            'U' => Layer::U,
            'D' => Layer::D,
            'F' => Layer::F,
            'B' => Layer::B,
            'r' => Layer::WideR,
            'l' => Layer::WideL,
            'u' => Layer::WideU,
            'd' => Layer::WideD,
            'f' => Layer::WideF,
            'b' => Layer::WideB,
            'M' => Layer::M,
            'E' => Layer::E,
            'S' => Layer::S,
            'x' => Layer::X,
            'y' => Layer::Y,
            'z' => Layer::Z,
            _ => return None,
        };
        Some(layer)
    }
}

/// One layer turned by 1, 2 or 3 clockwise quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub layer: Layer,
    quarters: u8,
}

impl Move {
    pub fn new(layer: Layer, quarters: u8) -> Option<Self> {
        match quarters % 4 {
            0 => None,
            q => Some(Self { layer, quarters: q }),
        }
    }

    pub fn inverse(self) -> Self {
        Self {
            layer: self.layer,
            quarters: 4 - self.quarters,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.quarters {
            2 => "2",
            3 => "'",
            _ => "",
        };
        write!(f, "{}{}", self.layer.symbol(), suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMoveError(String);

impl fmt::Display for ParseMoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid move `{}`", self.0)
    }
}

impl std::error::Error for ParseMoveError {}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let layer = chars
            .next()
            .and_then(Layer::from_symbol)
            .ok_or_else(|| ParseMoveError(s.to_string()))?;

        let quarters = match chars.as_str() {
            "" => 1,
            "2" | "2'" => 2,
            "'" => 3,
            _ => return Err(ParseMoveError(s.to_string())),
        };

        Ok(Self { layer, quarters })
    }
}

pub fn parse_sequence(s: &str) -> Result<Vec<Move>, ParseMoveError> {
    s.split_whitespace().map(str::parse).collect()
}

pub fn format_sequence(moves: &[Move]) -> String {
    moves.iter().join(" ")
}

/// The sequence that undoes `moves`.
pub fn invert(moves: &[Move]) -> Vec<Move> {
    moves.iter().rev().map(|m| m.inverse()).collect()
}

/// Merges adjacent turns of the same layer, dropping turns that cancel out.
pub fn simplify(moves: &[Move]) -> Vec<Move> {
    let mut out: Vec<Move> = Vec::with_capacity(moves.len());

    for m in moves {
        match out.last() {
            Some(top) if top.layer == m.layer => {
                let merged = Move::new(m.layer, top.quarters + m.quarters);
                out.pop();
                if let Some(merged) = merged {
                    out.push(merged);
                }
            }
            _ => out.push(*m),
        }
    }

    out
}

/// Last-layer algorithms that keep the first two layers solved and the edges
/// oriented. Their inverses set up ZBLL cases.
const LAST_LAYER_ALGS: &[&str] = &[
    "R U R' U R U2 R'",
    "R U2 R' U' R U' R'",
    "R U R' U R U' R' U R U2 R'",
    "R U2 R2 U' R2 U' R2 U2 R",
    "r U R' U' r' F R F'",
    "F R' F' r U R U' r'",
    "R2 D R' U2 R D' R' U2 R'",
    "R U R' U' R' F R2 U' R' U' R U R' F'",
    "R U R' F' R U R' U' R' F R2 U' R'",
    "R U' R U R U R U' R' U' R2",
    "R2 U R U R' U' R' U' R' U R'",
    "M2 U M2 U2 M2 U M2",
    "M' U M2 U M2 U M' U2 M2",
    "F R U' R' U' R U R' F' R U R' U' R' F R F'",
    "x R' U R' D2 R U' R' D2 R2 x'",
];

const THREE_BY_THREE_LENGTH: usize = 20;
const TWO_BY_TWO_LENGTH: usize = 10;

#[derive(Debug)]
pub struct RandomScrambler<R: Rng> {
    category: Category,
    rng: R,
}

impl RandomScrambler<StdRng> {
    pub fn from_entropy(category: Category) -> Self {
        Self::new(category, StdRng::from_entropy())
    }
}

impl<R: Rng> RandomScrambler<R> {
    pub fn new(category: Category, rng: R) -> Self {
        Self { category, rng }
    }

    fn random_quarters(&mut self) -> u8 {
        self.rng.gen_range(1..=3)
    }

    /// Random turns from `faces`, never repeating a face back to back and
    /// never stacking three turns on one axis.
    fn random_turns(&mut self, faces: &[Layer], length: usize) -> Vec<Move> {
        let mut moves: Vec<Move> = Vec::with_capacity(length);

        while moves.len() < length {
            let layer = match faces.choose(&mut self.rng) {
                Some(layer) => *layer,
                None => break,
            };

            let n = moves.len();
            if n >= 1 && moves[n - 1].layer == layer {
                continue;
            }
            if n >= 2
                && moves[n - 1].layer.axis() == layer.axis()
                && moves[n - 2].layer.axis() == layer.axis()
            {
                continue;
            }

            let quarters = self.random_quarters();
            moves.extend(Move::new(layer, quarters));
        }

        moves
    }

    fn random_auf(&mut self) -> Option<Move> {
        Move::new(Layer::U, self.rng.gen_range(0..4))
    }

    fn last_layer_case(&mut self) -> Vec<Move> {
        let mut moves = Vec::new();

        for _ in 0..2 {
            moves.extend(self.random_auf());
            let alg = LAST_LAYER_ALGS
                .choose(&mut self.rng)
                .map(|alg| parse_sequence(alg).unwrap_or_default())
                .unwrap_or_default();
            moves.extend(invert(&alg));
        }
        moves.extend(self.random_auf());

        simplify(&moves)
    }

    pub fn generate(&mut self) -> Vec<Move> {
        match self.category {
            Category::Zbll => self.last_layer_case(),
            Category::ThreeByThree => self.random_turns(&Layer::OUTER, THREE_BY_THREE_LENGTH),
            Category::TwoByTwo => {
                self.random_turns(&[Layer::R, Layer::U, Layer::F], TWO_BY_TWO_LENGTH)
            }
        }
    }
}

impl<R: Rng + fmt::Debug> ScrambleSource for RandomScrambler<R> {
    fn next_scramble(&mut self) -> String {
        let scramble = format_sequence(&self.generate());
        debug!("generated {} scramble: {}", self.category, scramble);
        scramble
    }
}

/// The scramble to solve now and the one that was just solved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScramblePair {
    current: String,
    previous: String,
}

impl ScramblePair {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn previous(&self) -> &str {
        &self.previous
    }

    pub fn rotate(&mut self, next: String) {
        if !self.current.is_empty() {
            self.previous = std::mem::take(&mut self.current);
        }
        self.current = next;
    }
}
