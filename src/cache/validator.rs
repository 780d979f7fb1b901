//! Opaque validator tokens for conditional result delivery.
//!
//! A token encodes the math tick of the payload it was served with, in ETag
//! clothing: `"mt-<tick>"`. Clients echo tokens back verbatim (possibly
//! several, possibly with a weak-validator `W/` prefix); the server parses
//! each back to a tick and takes the minimum as the freshness floor, which
//! satisfies the strictest validator the client holds.

use tracing::warn;

use crate::types::MathTick;

/// The token served alongside a payload and echoed back by clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorToken(String);

impl ValidatorToken {
    /// The token for a payload at `tick`.
    pub fn for_tick(tick: MathTick) -> Self {
        ValidatorToken(format!("\"mt-{}\"", tick.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a single echoed token back to its tick.
    ///
    /// Accepts an optional `W/` prefix and optional surrounding quotes.
    /// Returns `None` for anything this server could not have issued.
    pub fn parse(raw: &str) -> Option<MathTick> {
        let s = raw.trim();
        let s = s.strip_prefix("W/").unwrap_or(s);
        let s = match s.strip_prefix('"') {
            Some(rest) => rest.strip_suffix('"')?,
            None => s,
        };
        let s = s.strip_prefix("mt-")?;
        s.parse().ok().map(MathTick)
    }
}

/// Resolves a comma-separated validator header to a freshness floor.
///
/// The floor is the minimum tick among the tokens that parse. Tokens that do
/// not parse are ignored with a warning; if nothing parses the request is
/// treated as unconditional (`None`).
pub fn floor_from_header(header: &str) -> Option<MathTick> {
    let mut floor: Option<MathTick> = None;
    for raw in header.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match ValidatorToken::parse(raw) {
            Some(tick) => {
                floor = Some(match floor {
                    Some(current) => current.min(tick),
                    None => tick,
                });
            }
            None => {
                warn!(token = raw, "ignoring unparseable validator token");
            }
        }
    }
    floor
}
