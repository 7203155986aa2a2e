//! MIFARE Classic key recovery backends.
//!
//! The cryptanalysis itself is external. [`KeyRecovery`] is the seam the HTTP
//! handlers call through; [`ToolRecovery`] drives the proxmark3 `mfkey`
//! command-line tools.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use http::StatusCode;
use tokio::process::Command;
use tracing::debug;

use crate::error::Error;
use crate::middleware::BoxFuture;

/// Which attack a set of sniffed values feeds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Attack {
    /// Two reader authentications against the same tag nonce.
    Mfkey32,
    /// Two reader authentications with distinct tag nonces.
    Mfkey32v2,
    /// One complete authentication, including the tag's answer.
    Mfkey64,
}

impl Attack {
    pub const ALL: [Attack; 3] = [Self::Mfkey32, Self::Mfkey32v2, Self::Mfkey64];

    pub fn name(self) -> &'static str {
        match self {
            Self::Mfkey32 => "mfkey32",
            Self::Mfkey32v2 => "mfkey32v2",
            Self::Mfkey64 => "mfkey64",
        }
    }

    /// Request body fields, in the order the tools take them.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Mfkey32 => &["uid", "nt0", "nr0", "ar0", "nr1", "ar1"],
            Self::Mfkey32v2 => &["uid", "nt0", "nr0", "ar0", "nt1", "nr1", "ar1"],
            Self::Mfkey64 => &["uid", "nt", "nr", "ar", "at"],
        }
    }
}

impl fmt::Display for Attack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Recovers a 48-bit sector key from sniffed authentication values.
///
/// `args` holds one word per entry of [`Attack::fields`], in that order.
pub trait KeyRecovery: Send + Sync {
    fn recover<'a>(&'a self, attack: Attack, args: &'a [u32]) -> BoxFuture<'a, Result<u64, Error>>;
}

/// Runs `<dir>/<attack name> <args as hex>` and reads the key from stdout.
#[derive(Clone, Debug)]
pub struct ToolRecovery {
    dir: PathBuf,
}

impl ToolRecovery {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_owned() }
    }
}

impl KeyRecovery for ToolRecovery {
    fn recover<'a>(&'a self, attack: Attack, args: &'a [u32]) -> BoxFuture<'a, Result<u64, Error>> {
        Box::pin(async move {
            let program = self.dir.join(attack.name());
            let output = Command::new(&program)
                .args(args.iter().map(|word| format!("{word:08x}")))
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            debug!(%attack, status = %output.status, "key recovery tool finished");

            parse_found_key(&stdout)
                .ok_or_else(|| Error::http(StatusCode::UNPROCESSABLE_ENTITY, "key not found"))
        })
    }
}

/// Extracts the key from a `Found Key: [xxxxxxxxxxxx]` line.
fn parse_found_key(stdout: &str) -> Option<u64> {
    stdout.lines().find_map(|line| {
        let (_, rest) = line.split_once("Found Key: [")?;
        let (hex, _) = rest.split_once(']')?;
        u64::from_str_radix(hex.trim(), 16).ok()
    })
}

/// Formats a key the way clients expect it: 12 uppercase hex digits.
pub fn format_key(key: u64) -> String {
    format!("{:012X}", key & 0xFFFF_FFFF_FFFF)
}
