//! Installing fresh remote data over local state
//!
//! Fresh transforms mint new local ids. Before installing them, ids and
//! local-only fields are carried over from the previous collection by
//! remote id, so UI keys stay stable across refreshes. Projects the remote
//! side does not know about yet are kept.

use boardsync_model::{LocalId, Module, Project, RemoteId};
use std::collections::HashMap;

/// Merge a freshly transformed collection into the previous one
///
/// - Matched projects (same remote id) keep their local ids, external
///   reference, creation time and module kind, team, color and assignee
/// - A matched project with a pending remote confirmation is kept as-is
/// - Local-only projects, and pending projects the remote listing does not
///   contain yet, are appended in their previous order
#[must_use]
pub fn reconcile(previous: &[Project], fresh: Vec<Project>) -> Vec<Project> {
    reconcile_with(previous, fresh, |_| false)
}

/// [`reconcile`], additionally keeping every previous project for which
/// `hold` returns true as if it were pending
#[must_use]
pub fn reconcile_with(
    previous: &[Project],
    fresh: Vec<Project>,
    hold: impl Fn(&Project) -> bool,
) -> Vec<Project> {
    let held = |p: &Project| p.sync.is_syncing() || hold(p);
    let by_remote: HashMap<&RemoteId, &Project> = previous
        .iter()
        .filter_map(|p| p.remote_id.as_ref().map(|r| (r, p)))
        .collect();

    let mut matched: Vec<&RemoteId> = Vec::new();
    let mut merged: Vec<Project> = fresh
        .into_iter()
        .map(|project| {
            let Some(prev) = project
                .remote_id
                .as_ref()
                .and_then(|r| by_remote.get(r).copied())
            else {
                return project;
            };
            if let Some(r) = &prev.remote_id {
                matched.push(r);
            }
            if held(prev) {
                prev.clone()
            } else {
                carry_over(prev, project)
            }
        })
        .collect();

    merged.extend(
        previous
            .iter()
            .filter(|p| match &p.remote_id {
                None => true,
                Some(r) => held(*p) && !matched.contains(&r),
            })
            .cloned(),
    );
    merged
}

/// Carry local ids and local-only fields from `previous` onto `fresh`
#[must_use]
pub fn carry_over(previous: &Project, mut fresh: Project) -> Project {
    let ids = local_ids_by_remote(previous);
    let modules: HashMap<&LocalId, &Module> =
        previous.modules.iter().map(|m| (&m.id, m)).collect();

    fresh.id = previous.id.clone();
    fresh.created_at = previous.created_at;
    if fresh.external_ref.is_none() {
        fresh.external_ref.clone_from(&previous.external_ref);
    }

    for module in &mut fresh.modules {
        adopt(&ids, module.remote_id.as_ref(), &mut module.id);
        if let Some(local) = modules.get(&module.id) {
            module.kind.clone_from(&local.kind);
            module.team.clone_from(&local.team);
            module.color.clone_from(&local.color);
            if module.assigned_person.is_none() {
                module.assigned_person.clone_from(&local.assigned_person);
            }
        }
        for task in &mut module.tasks {
            adopt(&ids, task.remote_id.as_ref(), &mut task.id);
            for subtask in &mut task.subtasks {
                adopt(&ids, subtask.remote_id.as_ref(), &mut subtask.id);
            }
        }
    }
    fresh
}

fn local_ids_by_remote(project: &Project) -> HashMap<RemoteId, LocalId> {
    let mut ids = HashMap::new();
    for module in &project.modules {
        if let Some(r) = &module.remote_id {
            ids.insert(r.clone(), module.id.clone());
        }
        for task in &module.tasks {
            if let Some(r) = &task.remote_id {
                ids.insert(r.clone(), task.id.clone());
            }
            for subtask in &task.subtasks {
                if let Some(r) = &subtask.remote_id {
                    ids.insert(r.clone(), subtask.id.clone());
                }
            }
        }
    }
    ids
}

fn adopt(ids: &HashMap<RemoteId, LocalId>, remote: Option<&RemoteId>, local: &mut LocalId) {
    if let Some(existing) = remote.and_then(|r| ids.get(r)) {
        local.clone_from(existing);
    }
}

/// Remote ids confirmed during a multi-step remote operation, keyed by the
/// local id of the entity they belong to
///
/// Applied to whatever the entity looks like when the operation finishes,
/// never by overwriting it with the version the operation started from.
#[derive(Debug, Clone, Default)]
pub struct IdAssignments {
    assigned: HashMap<LocalId, RemoteId>,
}

impl IdAssignments {
    /// No assignments
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `local` was confirmed as `remote`
    pub fn record(&mut self, local: &LocalId, remote: RemoteId) {
        self.assigned.insert(local.clone(), remote);
    }

    /// Remote id recorded for `local`
    #[must_use]
    pub fn get(&self, local: &LocalId) -> Option<&RemoteId> {
        self.assigned.get(local)
    }

    /// Number of recorded assignments
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Attach recorded ids to the matching entities of `project`; returns
    /// how many were attached
    pub fn apply(&self, project: &mut Project) -> usize {
        let mut attached = 0;
        let mut attach = |id: &LocalId, slot: &mut Option<RemoteId>| {
            if let Some(remote) = self.assigned.get(id) {
                *slot = Some(remote.clone());
                attached += 1;
            }
        };

        attach(&project.id, &mut project.remote_id);
        for module in &mut project.modules {
            attach(&module.id, &mut module.remote_id);
            for task in &mut module.tasks {
                attach(&task.id, &mut task.remote_id);
                for subtask in &mut task.subtasks {
                    attach(&subtask.id, &mut subtask.remote_id);
                }
            }
        }
        attached
    }
}
