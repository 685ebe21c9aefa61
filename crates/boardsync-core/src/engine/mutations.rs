//! Module, task and sub-task mutations
//!
//! Lookups fail with `NotFound` before anything changes. The local change is
//! applied first; a remote call follows only when the affected entity (and
//! its parents) are confirmed remotely. Remote failures settle the project's
//! `sync` to `Error`; only `update_module` also returns them.

use super::SyncEngine;
use crate::error::{EntityKind, SyncError, SyncResult};
use crate::reconcile::IdAssignments;
use crate::requests::{ModuleChanges, NewModule, NewSubTask, NewTask, SubTaskChanges, TaskChanges};
use boardsync_model::{LocalId, Module, Project, SubTask, Task};

fn module_mut<'a>(project: &'a mut Project, id: &LocalId) -> SyncResult<&'a mut Module> {
    project
        .module_mut(id)
        .ok_or_else(|| SyncError::not_found(EntityKind::Module, id))
}

fn task_mut<'a>(module: &'a mut Module, id: &LocalId) -> SyncResult<&'a mut Task> {
    module
        .task_mut(id)
        .ok_or_else(|| SyncError::not_found(EntityKind::Task, id))
}

fn subtask_mut<'a>(task: &'a mut Task, id: &LocalId) -> SyncResult<&'a mut SubTask> {
    task.subtask_mut(id)
        .ok_or_else(|| SyncError::not_found(EntityKind::SubTask, id))
}

fn required_name(name: &str, kind: EntityKind) -> SyncResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::InvalidInput(format!("{kind} name must not be empty")));
    }
    Ok(name.to_string())
}

impl SyncEngine {
    /// Add a module, seeded from its template when one matches
    ///
    /// # Errors
    /// `NotFound` for an unknown project, `InvalidInput` for a blank name.
    pub async fn add_module(&self, project_id: &LocalId, request: NewModule) -> SyncResult<Module> {
        let name = required_name(&request.name, EntityKind::Module)?;
        let module = self
            .module_from_template(&name)
            .with_assigned_person(request.assigned_person);

        let board = self.apply_local(project_id, |p| {
            p.modules.push(module.clone());
            let board = p.remote_id.clone();
            let remote = board.is_some();
            Ok((board, remote))
        })?;
        tracing::info!(project = %project_id, module = %module.id, "module added");

        if let Some(board) = board {
            let mut ids = IdAssignments::new();
            let outcome = self
                .push_module(&board, &module, &mut ids)
                .await
                .map(|_| ());
            self.settle(project_id, &ids, outcome, "add module");
            self.schedule_reconcile();
        }
        self.persist_quietly().await;

        Ok(self.current_module(project_id, &module.id).unwrap_or(module))
    }

    /// Remove a module with its tasks
    ///
    /// # Errors
    /// `NotFound` for an unknown project or module.
    pub async fn remove_module(&self, project_id: &LocalId, module_id: &LocalId) -> SyncResult<()> {
        let (board, group) = self.apply_local(project_id, |p| {
            let index = p
                .modules
                .iter()
                .position(|m| &m.id == module_id)
                .ok_or_else(|| SyncError::not_found(EntityKind::Module, module_id))?;
            let removed = p.modules.remove(index);
            let board = p.remote_id.clone();
            let remote = board.is_some() && removed.remote_id.is_some();
            Ok(((board, removed.remote_id), remote))
        })?;
        tracing::info!(project = %project_id, module = %module_id, "module removed");

        if let (Some(board), Some(group)) = (&board, &group) {
            let outcome = self.inner.gateway.delete_group(board, group).await;
            self.settle(project_id, &IdAssignments::new(), outcome, "remove module");
        }
        if board.is_some() {
            self.schedule_reconcile();
        }
        self.persist_quietly().await;
        Ok(())
    }

    /// Change a module's name, color, team, kind or assignee
    ///
    /// Unlike the other mutations, a failed remote update is returned (and
    /// recorded as the global error) after the local change is kept.
    ///
    /// # Errors
    /// `NotFound` for an unknown project or module; `Transport` if the
    /// remote group update fails.
    pub async fn update_module(
        &self,
        project_id: &LocalId,
        module_id: &LocalId,
        changes: ModuleChanges,
    ) -> SyncResult<Module> {
        let group_changes = changes.group_changes();
        let (module, target) = self.apply_local(project_id, |p| {
            let board = p.remote_id.clone();
            let module = module_mut(p, module_id)?;
            changes.apply_to(module);
            let target = match (board, &module.remote_id) {
                (Some(board), Some(group)) if !group_changes.is_empty() => {
                    Some((board, group.clone()))
                }
                _ => None,
            };
            let remote = target.is_some();
            Ok(((module.clone(), target), remote))
        })?;
        tracing::info!(project = %project_id, module = %module_id, "module updated");

        if let Some((board, group)) = target {
            let outcome = self
                .inner
                .gateway
                .update_group(&board, &group, &group_changes)
                .await;
            let failure = outcome.clone().err();
            self.settle(project_id, &IdAssignments::new(), outcome, "update module");
            self.schedule_reconcile();
            if let Some(e) = failure {
                self.persist_quietly().await;
                return Err(self.surface(e.into()));
            }
        }
        self.persist_quietly().await;

        Ok(self.current_module(project_id, module_id).unwrap_or(module))
    }

    /// Add a task to a module
    ///
    /// A failed remote call is not returned; it leaves the project's `sync`
    /// in `Error` with the failure message.
    ///
    /// # Errors
    /// `NotFound` for an unknown project or module, `InvalidInput` for a
    /// blank name.
    pub async fn add_task(
        &self,
        project_id: &LocalId,
        module_id: &LocalId,
        request: NewTask,
    ) -> SyncResult<Task> {
        let task = Task::new(required_name(&request.name, EntityKind::Task)?)
            .with_status(request.status)
            .with_due_date(request.due_date);

        let target = self.apply_local(project_id, |p| {
            let board = p.remote_id.clone();
            let module = module_mut(p, module_id)?;
            module.tasks.push(task.clone());
            let target = board.zip(module.remote_id.clone());
            let remote = target.is_some();
            Ok((target, remote))
        })?;
        tracing::info!(project = %project_id, task = %task.id, "task added");

        if let Some((board, group)) = target {
            let mut ids = IdAssignments::new();
            let outcome = self
                .push_task(&board, &group, &task, &mut ids)
                .await
                .map(|_| ());
            self.settle(project_id, &ids, outcome, "add task");
        }
        self.persist_quietly().await;

        Ok(self
            .current_task(project_id, module_id, &task.id)
            .unwrap_or(task))
    }

    /// Change a task's name, status or due date
    ///
    /// A failed remote call is not returned; it leaves the project's `sync`
    /// in `Error` with the failure message.
    ///
    /// # Errors
    /// `NotFound` for an unknown project, module or task.
    pub async fn update_task(
        &self,
        project_id: &LocalId,
        module_id: &LocalId,
        task_id: &LocalId,
        changes: TaskChanges,
    ) -> SyncResult<Task> {
        let (task, target) = self.apply_local(project_id, |p| {
            let board = p.remote_id.clone();
            let task = task_mut(module_mut(p, module_id)?, task_id)?;
            changes.apply_to(task);
            let target = board
                .zip(task.remote_id.clone())
                .filter(|_| !changes.is_empty());
            let remote = target.is_some();
            Ok(((task.clone(), target), remote))
        })?;
        tracing::info!(project = %project_id, task = %task_id, "task updated");

        if let Some((board, item)) = target {
            let outcome = self
                .inner
                .gateway
                .update_item(&board, &item, &changes.item_changes())
                .await;
            self.settle(project_id, &IdAssignments::new(), outcome, "update task");
        }
        self.persist_quietly().await;

        Ok(self
            .current_task(project_id, module_id, task_id)
            .unwrap_or(task))
    }

    /// Remove a task with its sub-tasks
    ///
    /// # Errors
    /// `NotFound` for an unknown project, module or task.
    pub async fn remove_task(
        &self,
        project_id: &LocalId,
        module_id: &LocalId,
        task_id: &LocalId,
    ) -> SyncResult<()> {
        let item = self.apply_local(project_id, |p| {
            let remote_project = p.remote_id.is_some();
            let module = module_mut(p, module_id)?;
            let index = module
                .tasks
                .iter()
                .position(|t| &t.id == task_id)
                .ok_or_else(|| SyncError::not_found(EntityKind::Task, task_id))?;
            let item = module.tasks.remove(index).remote_id.filter(|_| remote_project);
            let remote = item.is_some();
            Ok((item, remote))
        })?;
        tracing::info!(project = %project_id, task = %task_id, "task removed");

        if let Some(item) = item {
            let outcome = self.inner.gateway.delete_item(&item).await;
            self.settle(project_id, &IdAssignments::new(), outcome, "remove task");
        }
        self.persist_quietly().await;
        Ok(())
    }

    /// Add a sub-task to a task
    ///
    /// # Errors
    /// `NotFound` for an unknown project, module or task, `InvalidInput`
    /// for a blank name.
    pub async fn add_subtask(
        &self,
        project_id: &LocalId,
        module_id: &LocalId,
        task_id: &LocalId,
        request: NewSubTask,
    ) -> SyncResult<SubTask> {
        let mut subtask = SubTask::new(required_name(&request.name, EntityKind::SubTask)?)
            .with_status(request.status)
            .with_assigned_person(request.assigned_person);
        subtask.due_date = request.due_date;

        let item = self.apply_local(project_id, |p| {
            let remote_project = p.remote_id.is_some();
            let task = task_mut(module_mut(p, module_id)?, task_id)?;
            task.subtasks.push(subtask.clone());
            let item = task.remote_id.clone().filter(|_| remote_project);
            let remote = item.is_some();
            Ok((item, remote))
        })?;
        tracing::info!(project = %project_id, subtask = %subtask.id, "sub-task added");

        if let Some(item) = item {
            let mut ids = IdAssignments::new();
            let outcome = self
                .push_subtask(&item, &subtask, &mut ids)
                .await
                .map(|_| ());
            self.settle(project_id, &ids, outcome, "add sub-task");
        }
        self.persist_quietly().await;

        Ok(self
            .current_subtask(project_id, module_id, task_id, &subtask.id)
            .unwrap_or(subtask))
    }

    /// Change a sub-task's name, status, assignee or due date
    ///
    /// # Errors
    /// `NotFound` for an unknown project, module, task or sub-task.
    pub async fn update_subtask(
        &self,
        project_id: &LocalId,
        module_id: &LocalId,
        task_id: &LocalId,
        subtask_id: &LocalId,
        changes: SubTaskChanges,
    ) -> SyncResult<SubTask> {
        let (subtask, subitem) = self.apply_local(project_id, |p| {
            let remote_project = p.remote_id.is_some();
            let task = task_mut(module_mut(p, module_id)?, task_id)?;
            let subtask = subtask_mut(task, subtask_id)?;
            changes.apply_to(subtask);
            let subitem = subtask
                .remote_id
                .clone()
                .filter(|_| remote_project && !changes.is_empty());
            let remote = subitem.is_some();
            Ok(((subtask.clone(), subitem), remote))
        })?;
        tracing::info!(project = %project_id, subtask = %subtask_id, "sub-task updated");

        if let Some(subitem) = subitem {
            let outcome = self
                .inner
                .gateway
                .update_subitem(&subitem, &changes.subitem_changes())
                .await;
            self.settle(project_id, &IdAssignments::new(), outcome, "update sub-task");
        }
        self.persist_quietly().await;

        Ok(self
            .current_subtask(project_id, module_id, task_id, subtask_id)
            .unwrap_or(subtask))
    }

    /// Remove a sub-task
    ///
    /// # Errors
    /// `NotFound` for an unknown project, module, task or sub-task.
    pub async fn remove_subtask(
        &self,
        project_id: &LocalId,
        module_id: &LocalId,
        task_id: &LocalId,
        subtask_id: &LocalId,
    ) -> SyncResult<()> {
        let subitem = self.apply_local(project_id, |p| {
            let remote_project = p.remote_id.is_some();
            let task = task_mut(module_mut(p, module_id)?, task_id)?;
            let index = task
                .subtasks
                .iter()
                .position(|s| &s.id == subtask_id)
                .ok_or_else(|| SyncError::not_found(EntityKind::SubTask, subtask_id))?;
            let subitem = task
                .subtasks
                .remove(index)
                .remote_id
                .filter(|_| remote_project);
            let remote = subitem.is_some();
            Ok((subitem, remote))
        })?;
        tracing::info!(project = %project_id, subtask = %subtask_id, "sub-task removed");

        if let Some(subitem) = subitem {
            let outcome = self.inner.gateway.delete_subitem(&subitem).await;
            self.settle(project_id, &IdAssignments::new(), outcome, "remove sub-task");
        }
        self.persist_quietly().await;
        Ok(())
    }

    fn current_module(&self, project_id: &LocalId, module_id: &LocalId) -> Option<Module> {
        self.project(project_id)?.module(module_id).cloned()
    }

    fn current_task(
        &self,
        project_id: &LocalId,
        module_id: &LocalId,
        task_id: &LocalId,
    ) -> Option<Task> {
        self.current_module(project_id, module_id)?
            .task(task_id)
            .cloned()
    }

    fn current_subtask(
        &self,
        project_id: &LocalId,
        module_id: &LocalId,
        task_id: &LocalId,
        subtask_id: &LocalId,
    ) -> Option<SubTask> {
        self.current_task(project_id, module_id, task_id)?
            .subtasks
            .into_iter()
            .find(|s| &s.id == subtask_id)
    }
}
