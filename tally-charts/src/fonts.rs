//! Bundled font registration.
//!
//! Charts are rendered on headless servers, so text never depends on system
//! fonts: DejaVu Sans ships with the crate and is registered with plotters
//! under the generic "sans-serif" family.

use anyhow::{Result, anyhow};
use plotters::style::{FontStyle, register_font};
use std::sync::OnceLock;

/// Family name every chart uses for text
pub const FONT: &str = "sans-serif";

static DEJAVU_SANS: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Register the bundled font once per process.
pub fn ensure_registered() -> Result<()> {
    REGISTERED
        .get_or_init(|| {
            register_font(FONT, FontStyle::Normal, DEJAVU_SANS)
                .map_err(|_| "bundled DejaVuSans.ttf is not a valid font".to_string())
        })
        .clone()
        .map_err(|e| anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_is_idempotent() {
        ensure_registered().unwrap();
        ensure_registered().unwrap();
    }
}
