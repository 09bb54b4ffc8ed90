use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use label_engine::ActorId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub(crate) enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse roster {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode roster json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write roster {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
struct RosterFile {
    enabled: Vec<u64>,
    owners: Vec<u64>,
    members: Vec<u64>,
}

/// Who may toggle labels (owners and members), who may manage the roster (owners), and who
/// currently has labels switched on.
#[derive(Debug, Default)]
pub(crate) struct AccessRoster {
    path: Option<PathBuf>,
    enabled: BTreeSet<ActorId>,
    owners: BTreeSet<ActorId>,
    members: BTreeSet<ActorId>,
    operators: BTreeSet<ActorId>,
}

impl AccessRoster {
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the roster persisted at `path`; a missing file starts empty.
    pub(crate) fn load(path: &Path) -> Result<Self, RosterError> {
        let mut roster = Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        };
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "roster_missing_starting_empty");
                return Ok(roster);
            }
            Err(source) => {
                return Err(RosterError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let file: RosterFile =
            serde_json::from_str(&raw).map_err(|source| RosterError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        roster.enabled = to_ids(&file.enabled);
        roster.owners = to_ids(&file.owners);
        roster.members = to_ids(&file.members);
        Ok(roster)
    }

    /// Operators are always owners and can never be removed from that role.
    pub(crate) fn seed_operators(
        &mut self,
        operators: impl IntoIterator<Item = ActorId>,
    ) -> Result<(), RosterError> {
        self.operators.clear();
        for id in operators {
            self.operators.insert(id);
            self.owners.insert(id);
        }
        debug!(operators = self.operators.len(), "roster_operators_seeded");
        self.save()
    }

    pub(crate) fn is_owner(&self, id: ActorId) -> bool {
        self.owners.contains(&id)
    }

    pub(crate) fn is_member(&self, id: ActorId) -> bool {
        self.members.contains(&id)
    }

    pub(crate) fn is_operator(&self, id: ActorId) -> bool {
        self.operators.contains(&id)
    }

    pub(crate) fn is_enabled(&self, id: ActorId) -> bool {
        self.enabled.contains(&id)
    }

    pub(crate) fn is_authorized(&self, id: ActorId) -> bool {
        self.is_owner(id) || self.is_member(id)
    }

    pub(crate) fn can_use(&self, id: ActorId) -> bool {
        self.is_authorized(id) && self.is_enabled(id)
    }

    pub(crate) fn can_manage(&self, id: ActorId) -> bool {
        self.is_owner(id)
    }

    pub(crate) fn owners(&self) -> Vec<ActorId> {
        self.owners.iter().copied().collect()
    }

    pub(crate) fn members(&self) -> Vec<ActorId> {
        self.members.iter().copied().collect()
    }

    pub(crate) fn set_enabled(&mut self, id: ActorId, enabled: bool) -> Result<(), RosterError> {
        if enabled {
            self.enabled.insert(id);
        } else {
            self.enabled.remove(&id);
        }
        self.save()
    }

    /// Promotes `id` to owner, dropping any member entry.
    pub(crate) fn add_owner(&mut self, id: ActorId) -> Result<(), RosterError> {
        self.owners.insert(id);
        self.members.remove(&id);
        self.save()
    }

    pub(crate) fn add_member(&mut self, id: ActorId) -> Result<(), RosterError> {
        self.members.insert(id);
        self.save()
    }

    pub(crate) fn remove_owner(&mut self, id: ActorId) -> Result<bool, RosterError> {
        if !self.owners.remove(&id) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Removing a member also switches their labels off.
    pub(crate) fn remove_member(&mut self, id: ActorId) -> Result<bool, RosterError> {
        if !self.members.remove(&id) {
            return Ok(false);
        }
        self.enabled.remove(&id);
        self.save()?;
        Ok(true)
    }

    pub(crate) fn save(&self) -> Result<(), RosterError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let file = RosterFile {
            enabled: from_ids(&self.enabled),
            owners: from_ids(&self.owners),
            members: from_ids(&self.members),
        };
        let text = serde_json::to_string_pretty(&file).map_err(RosterError::Encode)?;
        write_replacing(path, &text).map_err(|source| RosterError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn to_ids(raw: &[u64]) -> BTreeSet<ActorId> {
    raw.iter().copied().map(ActorId).collect()
}

fn from_ids(ids: &BTreeSet<ActorId>) -> Vec<u64> {
    ids.iter().map(|id| id.0).collect()
}

/// Writes through a sibling temp file so a crash never leaves a truncated roster behind.
fn write_replacing(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "roster.json".into());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, text)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn can_use_requires_role_and_enabled_flag() {
        let mut roster = AccessRoster::in_memory();
        roster.add_member(ActorId(1)).expect("add");
        assert!(!roster.can_use(ActorId(1)));

        roster.set_enabled(ActorId(1), true).expect("enable");
        assert!(roster.can_use(ActorId(1)));

        roster.set_enabled(ActorId(2), true).expect("enable");
        assert!(!roster.can_use(ActorId(2)));
    }

    #[test]
    fn promoting_member_to_owner_drops_member_entry() {
        let mut roster = AccessRoster::in_memory();
        roster.add_member(ActorId(3)).expect("add");
        roster.add_owner(ActorId(3)).expect("promote");

        assert!(roster.is_owner(ActorId(3)));
        assert!(!roster.is_member(ActorId(3)));
    }

    #[test]
    fn removing_member_clears_enabled_flag() {
        let mut roster = AccessRoster::in_memory();
        roster.add_member(ActorId(4)).expect("add");
        roster.set_enabled(ActorId(4), true).expect("enable");

        assert!(roster.remove_member(ActorId(4)).expect("remove"));
        assert!(!roster.is_enabled(ActorId(4)));
        assert!(!roster.remove_member(ActorId(4)).expect("remove again"));
    }

    #[test]
    fn operators_become_owners() {
        let mut roster = AccessRoster::in_memory();
        roster.seed_operators([ActorId(9)]).expect("seed");
        assert!(roster.is_owner(ActorId(9)));
        assert!(roster.is_operator(ActorId(9)));
        assert!(roster.can_manage(ActorId(9)));
    }

    #[test]
    fn roster_round_trips_through_disk() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("nested").join("roster.json");

        let mut roster = AccessRoster::load(&path).expect("load empty");
        roster.add_owner(ActorId(1)).expect("owner");
        roster.add_member(ActorId(2)).expect("member");
        roster.set_enabled(ActorId(2), true).expect("enable");

        let reloaded = AccessRoster::load(&path).expect("reload");
        assert_eq!(reloaded.owners(), vec![ActorId(1)]);
        assert_eq!(reloaded.members(), vec![ActorId(2)]);
        assert!(reloaded.can_use(ActorId(2)));
        assert!(!path.with_file_name("roster.json.tmp").exists());
    }

    #[test]
    fn operators_are_not_persisted_as_a_separate_list() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("roster.json");
        let mut roster = AccessRoster::load(&path).expect("load");
        roster.seed_operators([ActorId(5)]).expect("seed");

        let reloaded = AccessRoster::load(&path).expect("reload");
        assert!(reloaded.is_owner(ActorId(5)));
        assert!(!reloaded.is_operator(ActorId(5)));
    }

    #[test]
    fn corrupt_roster_reports_parse_error() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("roster.json");
        fs::write(&path, "{ not json").expect("write");

        assert!(matches!(
            AccessRoster::load(&path),
            Err(RosterError::Parse { .. })
        ));
    }
}
