//! Fixed domains shared by the unit tests

use crate::DomainParameters;
use num_bigint::BigUint;
use std::sync::Arc;

fn hex(s: &str) -> BigUint {
    BigUint::parse_bytes(s.as_bytes(), 16).unwrap()
}

/// p = 23, q = 11, g = 4: small enough to check by hand
pub fn tiny_domain() -> Arc<DomainParameters> {
    Arc::new(
        DomainParameters::new(
            BigUint::from(23u32),
            BigUint::from(11u32),
            BigUint::from(4u32),
        )
        .unwrap(),
    )
}

/// 256-bit p, 64-bit q
pub fn fixture_256_64() -> Arc<DomainParameters> {
    Arc::new(
        DomainParameters::new(
            hex("9c9b49a474a7c6f24dbc59021a6e3e96e653b18ebdf9483a9ab0b2f9ebf9ee31"),
            hex("e0602d4036e2c01f"),
            hex("205fe8e04e61dde920e80922646e98150657b4bde5ae2b75388958f35b72a825"),
        )
        .unwrap(),
    )
}

/// 512-bit p, 160-bit q
pub fn fixture_512_160() -> Arc<DomainParameters> {
    Arc::new(
        DomainParameters::new(
            hex(concat!(
                "8e8bc57478a5620a629ef9442f5e21f0fdf9216235aa73832d723ff81d43bf46",
                "e0cfc485a083c8fad63b170571ba208f56df27a4a4909ed69c0f7fb54c0e52c7",
            )),
            hex("cd91a8646b5ed152daea13ee33b3f60c10eedf43"),
            hex(concat!(
                "2ec73e75ef3de246dc5b4a34eda1abdc352c612ea153114b23013b131b8b520a",
                "a45736154f63f7d727a3e6e4775dcdff202bfdc247a0a6ba86c2d0996d3d5d54",
            )),
        )
        .unwrap(),
    )
}
