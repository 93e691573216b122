//! Disk error collection for the sensor heat grid
//!
//! Reads a hardware inventory listing the drives of every host and the
//! kernel logs of those hosts, and counts disk errors per backplane position.
//! The result is a sensor reading mapping the heat grid renders directly.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use tsuite_common::{Result, SensorReadings, TsuiteError};

/// Number of sensor hosts in the default grid
pub const SENSOR_HOSTS: usize = 8;
/// Highest disk slot number on a backplane
pub const MAX_SLOT: usize = 10;

/// A drive listed in the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    pub serial: String,
    pub sd: String,
    pub scsi_id: String,
    pub backplane: String,
    pub slot: String,
}

/// Drives per host, in inventory order
pub type Inventory = BTreeMap<String, Vec<Drive>>;

/// Kinds of disk errors recognized in kernel logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskErrorKind {
    Termination,
    ScsiStatus,
    ScsiTimeout,
}

/// One disk error line of a kernel log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskError {
    pub kind: DiskErrorKind,
    pub scsi_id: String,
    /// Device name, absent for terminations
    pub sd: Option<String>,
}

fn host_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Welcome.+?on (.+)$").expect("host header regex compiles"))
}

fn disk_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^type=disk,subtype=SATA,serial=(.+?),.+?sd0=(.+?),.+?scsi_id0=(.+?),.+?backplane0=(.+?),slot0=(.+?)",
        )
        .expect("disk line regex compiles")
    })
}

fn termination() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^mps\d+: \((.+?)\) terminated").expect("termination regex compiles"))
}

fn scsi_status() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\((.+?):mps\d+:(.+?)\): (READ|WRITE)\(\d+\)").expect("scsi status regex compiles")
    })
}

fn scsi_timeout() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\((.+?):mps\d+:(.+?)\): SCSI command timeout .+? SMID (\d+)")
            .expect("scsi timeout regex compiles")
    })
}

/// Parse an inventory listing. Lines before the first host header are ignored.
pub fn parse_inventory(text: &str) -> Inventory {
    let mut inventory = Inventory::new();
    let mut current: Option<String> = None;

    for line in text.lines().map(str::trim_end) {
        if let Some(caps) = host_header().captures(line) {
            let host = caps[1].to_string();
            debug!("Inventory section for {}", host);
            inventory.entry(host.clone()).or_default();
            current = Some(host);
            continue;
        }

        let Some(host) = current.as_ref() else {
            continue;
        };

        if let Some(caps) = disk_line().captures(line) {
            let drive = Drive {
                serial: caps[1].to_string(),
                sd: caps[2].to_string(),
                scsi_id: caps[3].to_string(),
                backplane: caps[4].to_string(),
                slot: caps[5].to_string(),
            };
            if let Some(drives) = inventory.get_mut(host) {
                drives.push(drive);
            }
        }
    }

    for (host, drives) in &inventory {
        debug!("Found {} drives on {}", drives.len(), host);
    }
    inventory
}

/// Every disk error line of a kernel log, in log order
pub fn scan_kernel_log(text: &str) -> Vec<DiskError> {
    text.lines()
        .map(str::trim_end)
        .filter_map(|line| {
            if let Some(caps) = termination().captures(line) {
                Some(DiskError {
                    kind: DiskErrorKind::Termination,
                    scsi_id: caps[1].to_string(),
                    sd: None,
                })
            } else if let Some(caps) = scsi_status().captures(line) {
                Some(DiskError {
                    kind: DiskErrorKind::ScsiStatus,
                    scsi_id: caps[2].to_string(),
                    sd: Some(caps[1].to_string()),
                })
            } else {
                scsi_timeout().captures(line).map(|caps| DiskError {
                    kind: DiskErrorKind::ScsiTimeout,
                    scsi_id: caps[2].to_string(),
                    sd: Some(caps[1].to_string()),
                })
            }
        })
        .collect()
}

/// Drive whose SCSI id matches `scsi_id`, ignoring the first character of both
pub fn find_drive_by_scsi_id<'a>(drives: &'a [Drive], scsi_id: &str) -> Option<&'a Drive> {
    let wanted = scsi_id.get(1..)?;
    drives
        .iter()
        .find(|drive| drive.scsi_id.get(1..) == Some(wanted))
}

/// Host name up to its first `.`
pub fn short_host(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

/// Grid with every known disk at 0
pub fn default_grid() -> SensorReadings {
    (0..SENSOR_HOSTS)
        .map(|host| {
            let letter = (b'a' + (host / 2) as u8) as char;
            let side = if host % 2 == 0 { "front" } else { "rear" };
            let disks = (0..=MAX_SLOT)
                .map(|slot| (format!("sdisk{}{}-{}", letter, slot, side), 0.0))
                .collect();
            (format!("sense{}", host), disks)
        })
        .collect()
}

/// Count disk errors of every `(host, kernel log)` pair into the default grid
pub fn collect(inventory: &Inventory, logs: &[(String, String)]) -> Result<SensorReadings> {
    let mut grid = default_grid();

    for (host, log) in logs {
        let drives = inventory.get(host).ok_or_else(|| {
            TsuiteError::Config(format!(
                "{} is not listed in the inventory; hosts listed are: {}",
                host,
                inventory.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let errors = scan_kernel_log(log);
        debug!("{} disk error lines in the log of {}", errors.len(), host);

        let sensor = short_host(host);
        for error in errors {
            let Some(drive) = find_drive_by_scsi_id(drives, &error.scsi_id) else {
                debug!("No drive with scsi id {} on {}", error.scsi_id, host);
                continue;
            };

            let disks = grid.entry(sensor.to_string()).or_default();
            let count = disks.entry(drive.backplane.clone()).or_insert_with(|| {
                warn!("{} {} is not part of the sensor grid", sensor, drive.backplane);
                0.0
            });
            *count += 1.0;
        }
    }

    info!("Collected disk errors from {} logs", logs.len());
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVENTORY: &str = "\
boot noise
type=disk,subtype=SATA,serial=IGNORED,x=1,sd0=da9,y=2,scsi_id0=0:9:0,z=3,backplane0=sdiska9-front,slot0=9
Welcome to willie on sense0.example.org
type=disk,subtype=SATA,serial=WD-A1,model=x,sd0=da0,bus=1,scsi_id0=0:4:0,port=2,backplane0=sdiska0-front,slot0=0
type=disk,subtype=SATA,serial=WD-A2,model=x,sd0=da1,bus=1,scsi_id0=0:5:0,port=2,backplane0=sdiska1-front,slot0=1
type=enclosure,name=front
Welcome to willie on sense1.example.org
type=disk,subtype=SATA,serial=WD-B1,model=x,sd0=da0,bus=1,scsi_id0=1:4:0,port=2,backplane0=sdiska0-rear,slot0=0
";

    const LOG: &str = "\
mps0: (0:4:0) terminated ioc 804b scsi 0 state c xfer 0
(da1:mps0:1:5:0): READ(10). CDB: 28 00 00 00 00 00 00 00 01 00
(da0:mps0:0:4:0): SCSI command timeout on device handle 0x000a SMID 189
(da7:mps0:0:7:0): WRITE(16). CDB: 8a 00
unrelated line
";

    #[test]
    fn test_parse_inventory() {
        let inventory = parse_inventory(INVENTORY);
        assert_eq!(inventory.len(), 2);

        let sense0 = &inventory["sense0.example.org"];
        assert_eq!(sense0.len(), 2);
        assert_eq!(sense0[0].serial, "WD-A1");
        assert_eq!(sense0[0].sd, "da0");
        assert_eq!(sense0[0].scsi_id, "0:4:0");
        assert_eq!(sense0[0].backplane, "sdiska0-front");
        assert_eq!(sense0[1].slot, "1");
    }

    #[test]
    fn test_scan_kernel_log() {
        let errors = scan_kernel_log(LOG);
        let kinds: Vec<_> = errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiskErrorKind::Termination,
                DiskErrorKind::ScsiStatus,
                DiskErrorKind::ScsiTimeout,
                DiskErrorKind::ScsiStatus,
            ]
        );
        assert_eq!(errors[0].scsi_id, "0:4:0");
        assert_eq!(errors[1].scsi_id, "1:5:0");
        assert_eq!(errors[1].sd.as_deref(), Some("da1"));
    }

    #[test]
    fn test_find_ignores_first_character() {
        let inventory = parse_inventory(INVENTORY);
        let drives = &inventory["sense0.example.org"];
        assert_eq!(find_drive_by_scsi_id(drives, "1:5:0").unwrap().serial, "WD-A2");
        assert!(find_drive_by_scsi_id(drives, "0:7:0").is_none());
        assert!(find_drive_by_scsi_id(drives, "").is_none());
    }

    #[test]
    fn test_default_grid() {
        let grid = default_grid();
        assert_eq!(grid.len(), 8);
        assert_eq!(grid["sense0"].len(), 11);
        assert!(grid["sense1"].contains_key("sdiska10-rear"));
        assert!(grid["sense7"].contains_key("sdiskd0-rear"));
        assert!(grid["sense6"].contains_key("sdiskd5-front"));
    }

    #[test]
    fn test_collect_counts_by_backplane() {
        let inventory = parse_inventory(INVENTORY);
        let logs = vec![("sense0.example.org".to_string(), LOG.to_string())];
        let grid = collect(&inventory, &logs).unwrap();

        assert_eq!(grid["sense0"]["sdiska0-front"], 2.0);
        assert_eq!(grid["sense0"]["sdiska1-front"], 1.0);
        assert_eq!(grid["sense0"]["sdiska2-front"], 0.0);
        assert_eq!(grid["sense1"]["sdiska0-rear"], 0.0);
    }

    #[test]
    fn test_unknown_host_is_config_error() {
        let inventory = parse_inventory(INVENTORY);
        let logs = vec![("sense9.example.org".to_string(), LOG.to_string())];
        match collect(&inventory, &logs) {
            Err(TsuiteError::Config(message)) => assert!(message.contains("sense1.example.org")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
