//! read-only consistency check of a mounted volume
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::device::BlockDevice;

use super::{BlockAllocator, FlatFS, Result, ROOT_INODE};

/// what [FlatFS::check] found
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// every inode reachable from the root, root included
    pub reachable_inodes: Vec<u32>,
    /// marked in the block map but owned by no reachable inode
    pub leaked_blocks: Vec<u32>,
    /// owned by a reachable inode but not marked
    pub unmarked_blocks: Vec<u32>,
    /// owned by more than one reachable inode
    pub shared_blocks: Vec<u32>,
    /// inodes listed by more than one directory record
    pub relinked_inodes: Vec<u32>,
    pub highest_inode: u32,
    pub inode_count: u32,
}

impl CheckReport {
    /// nothing but leaks, which aborted creates are allowed to leave behind
    pub fn is_consistent(&self) -> bool {
        self.unmarked_blocks.is_empty()
            && self.shared_blocks.is_empty()
            && self.relinked_inodes.is_empty()
            && self.highest_inode <= self.inode_count
    }
}

impl<D: BlockDevice> FlatFS<D> {
    /// walk every directory reachable from the root and compare what the
    /// inodes own against the block map; never repairs anything
    pub fn check(&self) -> Result<CheckReport> {
        self.with_volume(|volume| -> Result<CheckReport> {
            let mut report = CheckReport {
                inode_count: volume.superblock().inode_count(),
                ..Default::default()
            };
            let mut seen = BTreeSet::from([ROOT_INODE]);
            // data block -> owners
            let mut owners: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
            let mut pending = VecDeque::from([ROOT_INODE]);

            while let Some(number) = pending.pop_front() {
                let inode = volume.inode(number)?;
                owners.entry(inode.data_block).or_default().push(number);
                if !inode.is_dir() {
                    continue;
                }
                for entry in volume.directory(number)?.entries()? {
                    if seen.insert(entry.inode_number) {
                        pending.push_back(entry.inode_number);
                    } else {
                        report.relinked_inodes.push(entry.inode_number);
                    }
                }
            }

            let block_map = volume.superblock().block_map();
            report.leaked_blocks = block_map
                .allocated_blocks()
                .filter(|block| !owners.contains_key(block))
                .collect();
            for (block, owned_by) in &owners {
                if !block_map.is_allocated(*block) {
                    report.unmarked_blocks.push(*block);
                }
                if owned_by.len() > 1 {
                    report.shared_blocks.push(*block);
                }
            }
            report.highest_inode = seen.iter().next_back().copied().unwrap_or(ROOT_INODE);
            report.reachable_inodes = seen.into_iter().collect();

            if report.is_consistent() {
                info!(
                    "check passed: {} reachable inodes, {} leaked blocks",
                    report.reachable_inodes.len(),
                    report.leaked_blocks.len()
                );
            } else {
                warn!("check found inconsistencies: {report:?}");
            }
            Ok(report)
        })
    }
}
