//! Disk-to-volume mapping.
//!
//! A VM config entry is a disk when its key names a disk bus (`ide`, `sata`,
//! `scsi`) and its value names an image format (`qcow2`, `raw`, `vmdk`) and is
//! not a CD-ROM:
//!
//! ```text
//! scsi0: nfs_datastore:100/vm-100-disk-0.qcow2,size=32G
//!        └─ storage ──┘ └────── disk path ─────┘
//! ```

use std::collections::BTreeMap;

use crate::error::{Result, SnapshotError};

const BUS_KEYS: &[&str] = &["ide", "sata", "scsi"];
const IMAGE_FORMATS: &[&str] = &["qcow2", "raw", "vmdk"];

/// Disk paths of one VM living on the same storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskGroup {
    pub storage: String,
    pub disks: Vec<String>,
}

pub fn is_disk_entry(key: &str, value: &str) -> bool {
    BUS_KEYS.iter().any(|bus| key.contains(bus))
        && IMAGE_FORMATS.iter().any(|fmt| value.contains(fmt))
        && !value.contains("cdrom")
}

/// Split a disk value into `(storage, disk path)`.
pub fn parse_disk_value(key: &str, value: &str) -> Result<(String, String)> {
    let (storage, rest) = value.split_once(':').ok_or_else(|| {
        SnapshotError::config(format!("disk entry {key}: `{value}` has no storage prefix"))
    })?;
    let disk = rest.split(',').next().unwrap_or_default();
    if storage.is_empty() || disk.is_empty() {
        return Err(SnapshotError::config(format!(
            "disk entry {key}: `{value}` is missing a storage or disk path"
        )));
    }
    Ok((storage.to_string(), disk.to_string()))
}

/// Group every qualifying disk by storage backend, in order of first use.
pub fn map_disks(config: &BTreeMap<String, String>) -> Result<Vec<DiskGroup>> {
    let mut groups: Vec<DiskGroup> = Vec::new();
    for (key, value) in config {
        if !is_disk_entry(key, value) {
            continue;
        }
        let (storage, disk) = parse_disk_value(key, value)?;
        match groups.iter_mut().find(|g| g.storage == storage) {
            Some(group) => group.disks.push(disk),
            None => groups.push(DiskGroup {
                storage,
                disks: vec![disk],
            }),
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn disks_on_one_storage_share_a_group() {
        let cfg = config(&[
            ("scsi0", "storageA:vm-100-disk-0.qcow2,size=32G"),
            ("scsi1", "storageA:vm-100-disk-1.qcow2,size=10G"),
        ]);
        let groups = map_disks(&cfg).unwrap();
        assert_eq!(
            groups,
            vec![DiskGroup {
                storage: "storageA".into(),
                disks: vec!["vm-100-disk-0.qcow2".into(), "vm-100-disk-1.qcow2".into()],
            }]
        );
    }

    #[test]
    fn one_group_per_storage() {
        let cfg = config(&[
            ("ide0", "storageB:100/vm-100-disk-2.raw,size=4G"),
            ("sata0", "storageA:100/vm-100-disk-0.vmdk"),
            ("scsi0", "storageB:100/vm-100-disk-1.qcow2,cache=none"),
        ]);
        let groups = map_disks(&cfg).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].storage, "storageB");
        assert_eq!(groups[0].disks, vec!["100/vm-100-disk-2.raw", "100/vm-100-disk-1.qcow2"]);
        assert_eq!(groups[1].disks, vec!["100/vm-100-disk-0.vmdk"]);
    }

    #[test]
    fn skips_cdrom_non_bus_keys_and_non_images() {
        let cfg = config(&[
            ("ide2", "local:iso/debian.iso,media=cdrom,raw"),
            ("scsihw", "virtio-scsi-pci"),
            ("efidisk0", "storageA:100/vm-100-disk-9.raw"),
            ("unused0", "storageA:100/vm-100-disk-8.qcow2"),
            ("net0", "virtio=AA:BB:CC:DD:EE:FF,bridge=vmbr0"),
            ("scsi0", "storageA:vm-100-disk-0.qcow2"),
        ]);
        let groups = map_disks(&cfg).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].disks, vec!["vm-100-disk-0.qcow2"]);
    }

    #[test]
    fn value_without_storage_prefix_is_configuration_error() {
        let cfg = config(&[("scsi0", "vm-100-disk-0.qcow2,size=32G")]);
        let err = map_disks(&cfg).unwrap_err();
        assert!(matches!(err, SnapshotError::Configuration { .. }));
    }

    #[test]
    fn empty_disk_path_is_configuration_error() {
        assert!(parse_disk_value("scsi0", "storageA:,size=raw").is_err());
    }

    #[test]
    fn every_disk_lands_in_exactly_one_group() {
        let cfg = config(&[
            ("scsi0", "a:1.qcow2"),
            ("scsi1", "b:2.raw"),
            ("scsi2", "a:3.vmdk"),
            ("sata1", "c:4.qcow2"),
        ]);
        let groups = map_disks(&cfg).unwrap();
        let mut all: Vec<&String> = groups.iter().flat_map(|g| &g.disks).collect();
        all.sort();
        assert_eq!(all, vec!["1.qcow2", "2.raw", "3.vmdk", "4.qcow2"]);
        let mut names: Vec<&str> = groups.iter().map(|g| g.storage.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), groups.len());
    }
}
