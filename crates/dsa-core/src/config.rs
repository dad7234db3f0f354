//! Generation and signing configuration

use crate::arith::{DEFAULT_MILLER_RABIN_ROUNDS, MIN_MILLER_RABIN_ROUNDS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Bit lengths of the modulus `p` and subgroup order `q`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSize {
    /// Bit length of p (L)
    pub p_bits: u64,
    /// Bit length of q (N)
    pub q_bits: u64,
}

impl DomainSize {
    /// L = 1024, N = 160
    pub const L1024_N160: DomainSize = DomainSize { p_bits: 1024, q_bits: 160 };
    /// L = 2048, N = 224
    pub const L2048_N224: DomainSize = DomainSize { p_bits: 2048, q_bits: 224 };
    /// L = 2048, N = 256
    pub const L2048_N256: DomainSize = DomainSize { p_bits: 2048, q_bits: 256 };
    /// L = 3072, N = 256
    pub const L3072_N256: DomainSize = DomainSize { p_bits: 3072, q_bits: 256 };

    /// Arbitrary sizes. Anything below the presets is only fit for tests.
    pub fn custom(p_bits: u64, q_bits: u64) -> Result<Self> {
        let size = Self { p_bits, q_bits };
        size.check()?;
        Ok(size)
    }

    /// Look up a preset by its modulus length, e.g. `2048`.
    pub fn for_modulus(p_bits: u64) -> Result<Self> {
        match p_bits {
            1024 => Ok(Self::L1024_N160),
            2048 => Ok(Self::L2048_N256),
            3072 => Ok(Self::L3072_N256),
            other => Err(Error::InvalidParameters(format!(
                "No preset for {}-bit modulus",
                other
            ))),
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.q_bits < 8 {
            return Err(Error::InvalidParameters(format!(
                "Subgroup order must be at least 8 bits, got {}",
                self.q_bits
            )));
        }
        // p = k*q + 1 with even k >= 2 needs at least one extra bit
        if self.p_bits <= self.q_bits {
            return Err(Error::InvalidParameters(format!(
                "Modulus ({} bits) must be longer than subgroup order ({} bits)",
                self.p_bits, self.q_bits
            )));
        }
        Ok(())
    }
}

impl Default for DomainSize {
    fn default() -> Self {
        Self::L2048_N256
    }
}

/// Retry budgets and test strength for domain parameter generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Target sizes
    pub size: DomainSize,
    /// Miller-Rabin rounds for every primality test
    pub miller_rabin_rounds: usize,
    /// How many subgroup primes q to try before failing
    pub max_q_attempts: usize,
    /// Candidates for p tried per q; 0 means 4 * p_bits
    pub max_p_trials: usize,
    /// Draws of h tried when deriving the generator
    pub max_generator_attempts: usize,
}

impl GenerationConfig {
    /// Default budgets for the given size
    pub fn with_size(size: DomainSize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Reject sizes and test strengths generation cannot stand behind.
    pub fn check(&self) -> Result<()> {
        self.size.check()?;
        if self.miller_rabin_rounds < MIN_MILLER_RABIN_ROUNDS {
            return Err(Error::InvalidParameters(format!(
                "At least {} Miller-Rabin rounds required, got {}",
                MIN_MILLER_RABIN_ROUNDS, self.miller_rabin_rounds
            )));
        }
        Ok(())
    }

    /// Effective p trial budget
    pub fn p_trials(&self) -> usize {
        if self.max_p_trials == 0 {
            4 * self.size.p_bits as usize
        } else {
            self.max_p_trials
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            size: DomainSize::default(),
            miller_rabin_rounds: DEFAULT_MILLER_RABIN_ROUNDS,
            max_q_attempts: 16,
            max_p_trials: 0,
            max_generator_attempts: 64,
        }
    }
}

/// Retry budget for signing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Fresh nonces tried before giving up on r = 0 or s = 0
    pub max_attempts: usize,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self { max_attempts: 32 }
    }
}
