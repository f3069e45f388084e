//! Clock skew validation
//!
//! The server refuses to hand out tunnel configuration to clients whose
//! clock is far off, so the client checks `get unixtime` up front.

use super::{Error, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default allowed difference between server and local clocks, in seconds
pub const DEFAULT_TOLERANCE_SECS: u64 = 120;

/// Compare the server clock to the local clock
///
/// Returns 0 when the clocks agree within `tolerance` seconds, and
/// `Error::ClockSkew` carrying the absolute difference otherwise.
pub fn check(server_epoch: i64, local_epoch: i64, tolerance: u64) -> Result<u64> {
    let skew = local_epoch.abs_diff(server_epoch);

    if skew > tolerance {
        tracing::warn!(
            "local time {} differs from server time {} by {} seconds",
            local_epoch,
            server_epoch,
            skew
        );
        return Err(Error::ClockSkew { skew, tolerance });
    }

    Ok(0)
}

/// Current wall-clock time in seconds since the Unix epoch
pub fn local_epoch_seconds() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
