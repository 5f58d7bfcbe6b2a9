//! Process discovery on top of the console capability.

use ccbridge_console::{
    ConsoleControl, ConsoleError, ConsoleResult, GAME_PROCESS_EXCLUDE, MAX_PROCESSES,
};
use tracing::{debug, warn};

/// A process id with its resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedProcess {
    pub pid: u32,
    pub name: String,
}

/// Result of the game-process scan.
///
/// `pid` is 0 when nothing matched or the scan failed part way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameProcess {
    pub pid: u32,
    pub name: Option<String>,
}

/// Find the first listed process whose name does not contain
/// [`GAME_PROCESS_EXCLUDE`].
///
/// Names are resolved in listing order and the scan stops at the first
/// match. Any capability failure yields the empty result.
pub fn find_game_process<C>(console: Option<&mut C>) -> GameProcess
where
    C: ConsoleControl + ?Sized,
{
    let Some(console) = console else {
        warn!(error = %ConsoleError::NotInitialized, "game process scan skipped");
        return GameProcess::default();
    };

    match scan_for_game(console) {
        Ok(Some(found)) => {
            debug!(pid = found.pid, name = %found.name, "found game process");
            GameProcess {
                pid: found.pid,
                name: (!found.name.is_empty()).then_some(found.name),
            }
        }
        Ok(None) => {
            debug!("no game process running");
            GameProcess::default()
        }
        Err(error) => {
            warn!(%error, "game process scan failed");
            GameProcess::default()
        }
    }
}

fn scan_for_game<C>(console: &mut C) -> ConsoleResult<Option<NamedProcess>>
where
    C: ConsoleControl + ?Sized,
{
    for pid in console.list_processes()?.into_iter().take(MAX_PROCESSES) {
        let name = console.process_name(pid)?;
        if !name.contains(GAME_PROCESS_EXCLUDE) {
            return Ok(Some(NamedProcess { pid, name }));
        }
    }
    Ok(None)
}

/// List up to [`MAX_PROCESSES`] processes with their names.
///
/// Every name is resolved before returning; one failed lookup fails the
/// whole listing.
pub fn list_named_processes<C>(console: Option<&mut C>) -> ConsoleResult<Vec<NamedProcess>>
where
    C: ConsoleControl + ?Sized,
{
    let console = console.ok_or(ConsoleError::NotInitialized)?;
    console
        .list_processes()?
        .into_iter()
        .take(MAX_PROCESSES)
        .map(|pid| {
            let name = console.process_name(pid)?;
            Ok(NamedProcess { pid, name })
        })
        .collect()
}
