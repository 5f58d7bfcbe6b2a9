use std::io::{self, ErrorKind};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Description of a simulated console, loadable from JSON.
///
/// ```json
/// {
///   "library_available": true,
///   "processes": [
///     { "pid": 16843264, "name": "/dev_hdd0/game/BLES00000/USRDIR/EBOOT.BIN",
///       "regions": [ { "base": 65536, "size": 4096, "fill": 0 } ] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleProfile {
    /// Whether `init` succeeds. `false` simulates a missing control library.
    #[serde(default = "default_true")]
    pub library_available: bool,
    /// Processes in listing order.
    #[serde(default)]
    pub processes: Vec<ProcessProfile>,
}

/// One simulated process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessProfile {
    pub pid: u32,
    pub name: String,
    #[serde(default)]
    pub regions: Vec<RegionProfile>,
}

/// One mapped memory region of a simulated process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub base: u64,
    pub size: usize,
    /// Initial value of every byte in the region.
    #[serde(default)]
    pub fill: u8,
}

fn default_true() -> bool {
    true
}

impl ConsoleProfile {
    /// Parse a profile from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Load a profile from a JSON file.
    ///
    /// Malformed JSON is reported as [`ErrorKind::InvalidData`].
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|err| io::Error::new(ErrorKind::InvalidData, err))
    }
}

impl Default for ConsoleProfile {
    /// A console running the system shell and one game.
    fn default() -> Self {
        Self {
            library_available: true,
            processes: vec![
                ProcessProfile {
                    pid: 0x0100_0300,
                    name: "dev_flash/vsh/module/vsh.self".to_string(),
                    regions: vec![RegionProfile {
                        base: 0x0001_0000,
                        size: 0x1_0000,
                        fill: 0,
                    }],
                },
                ProcessProfile {
                    pid: 0x0101_0200,
                    name: "/dev_hdd0/game/BLES00000/USRDIR/EBOOT.BIN".to_string(),
                    regions: vec![
                        RegionProfile {
                            base: 0x0001_0000,
                            size: 0x10_0000,
                            fill: 0,
                        },
                        RegionProfile {
                            base: 0x3000_0000,
                            size: 0x4_0000,
                            fill: 0,
                        },
                    ],
                },
            ],
        }
    }
}
