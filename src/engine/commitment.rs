//! Move Commitment Codec
//!
//! Commit to a move before the opponent's move is known.
//! Reveal the move and secret key later; the engine recomputes the hash.

use std::fmt;
use rand::RngCore;
use serde::{Serialize, Deserialize};

use crate::core::hash::{ct_eq, StateHash, StateHasher};

/// Length of keys produced by [`generate_secret`].
pub const SECRET_LEN: usize = 32;

/// A Rock-Paper-Scissors move.
///
/// Wire tags (`ROCK = 1`, `PAPER = 2`, `SCISSORS = 3`).
/// `None` is the unset/invalid sentinel and never opens a commitment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Move {
    /// Unset or undecodable move.
    #[default]
    None = 0,
    /// Beats Scissors.
    Rock = 1,
    /// Beats Rock.
    Paper = 2,
    /// Beats Paper.
    Scissors = 3,
}

impl Move {
    /// All playable moves.
    pub const PLAYABLE: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Decode a raw tag. Anything outside 1..=3 becomes `None`.
    pub fn from_tag(tag: u8) -> Move {
        match tag {
            1 => Move::Rock,
            2 => Move::Paper,
            3 => Move::Scissors,
            _ => Move::None,
        }
    }

    /// Wire tag.
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Is this one of Rock/Paper/Scissors?
    #[inline]
    pub fn is_playable(self) -> bool {
        self != Move::None
    }

    /// The move this one defeats.
    pub fn beats(self) -> Option<Move> {
        match self {
            Move::Rock => Some(Move::Scissors),
            Move::Scissors => Some(Move::Paper),
            Move::Paper => Some(Move::Rock),
            Move::None => None,
        }
    }
}

impl From<u8> for Move {
    fn from(tag: u8) -> Self {
        Move::from_tag(tag)
    }
}

/// Published commitment to a `(move, secret)` pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub StateHash);

impl Commitment {
    /// Raw digest.
    pub fn as_bytes(&self) -> &StateHash {
        &self.0
    }

    /// Hex encoding, for logs.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", &self.to_hex()[..16])
    }
}

/// Build the commitment for `mv` under `secret_key`.
///
/// SHA-256 over `domain || tag || secret_key`. The tag is a single byte, so
/// the concatenation is unambiguous for any key length.
pub fn commit(mv: Move, secret_key: &[u8]) -> Commitment {
    let mut hasher = StateHasher::for_commitment();
    hasher.update_u8(mv.tag());
    hasher.update_bytes(secret_key);
    Commitment(hasher.finalize())
}

/// Check that `(mv, secret_key)` opens `commitment`.
///
/// `Move::None` never verifies, even against a commitment crafted over tag 0.
pub fn verify(commitment: &Commitment, mv: Move, secret_key: &[u8]) -> bool {
    let recomputed = commit(mv, secret_key);
    let matches = ct_eq(&recomputed.0, &commitment.0);
    matches && mv.is_playable()
}

/// Fresh random secret key.
pub fn generate_secret() -> [u8; SECRET_LEN] {
    let mut secret = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}
