//! Fixtures: template tables and raw board builders

use boardsync_model::{ModuleTemplate, StaticTemplates, TaskDefinition};
use boardsync_remote::{RawBoard, RawColumnValue, RawGroup, RawGroupRef, RawItem, RawSubitem};

/// Template table with an "Infrastructure" template of three tasks and a
/// "Training" template of one task with two sub-tasks
#[must_use]
pub fn sample_templates() -> StaticTemplates {
    StaticTemplates::new(vec![
        ModuleTemplate {
            name: "Infrastructure".into(),
            kind: "technical".into(),
            color: "#00c875".into(),
            team: "Platform".into(),
            tasks: vec![
                TaskDefinition::new("Provision servers"),
                TaskDefinition::new("Configure network"),
                TaskDefinition::new("Set up monitoring"),
            ],
        },
        ModuleTemplate {
            name: "Training".into(),
            kind: "enablement".into(),
            color: "#fdab3d".into(),
            team: "Customer Success".into(),
            tasks: vec![TaskDefinition::new("Run workshop").with_subtasks(["Book room", "Send invites"])],
        },
    ])
}

/// Builder for raw board payloads
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    board: RawBoard,
}

impl BoardBuilder {
    /// Active board
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            board: RawBoard {
                id: Some(id.into()),
                name: Some(name.into()),
                description: None,
                external_ref: None,
                state: Some("active".into()),
                groups: Vec::new(),
                items: Vec::new(),
            },
        }
    }

    /// Set board state (`active`, `archived`, `deleted`)
    #[must_use]
    pub fn state(mut self, state: &str) -> Self {
        self.board.state = Some(state.into());
        self
    }

    /// Set description
    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.board.description = Some(description.into());
        self
    }

    /// Set the external reference
    #[must_use]
    pub fn external_ref(mut self, external_ref: &str) -> Self {
        self.board.external_ref = Some(external_ref.into());
        self
    }

    /// Add a group
    #[must_use]
    pub fn group(mut self, id: &str, title: &str) -> Self {
        self.board.groups.push(RawGroup {
            id: Some(id.into()),
            title: Some(title.into()),
            color: None,
        });
        self
    }

    /// Add an item with a status column
    #[must_use]
    pub fn item(mut self, id: &str, group: &str, name: &str, status: &str) -> Self {
        self.board.items.push(RawItem {
            id: Some(id.into()),
            name: Some(name.into()),
            group: Some(RawGroupRef {
                id: Some(group.into()),
            }),
            column_values: vec![RawColumnValue::new("status", "status", status)],
            subitems: Vec::new(),
        });
        self
    }

    /// Add a sub-item to the most recently added item
    ///
    /// # Panics
    /// If no item has been added yet.
    #[must_use]
    pub fn subitem(mut self, id: &str, name: &str, status: &str) -> Self {
        let item = self
            .board
            .items
            .last_mut()
            .expect("subitem() requires a preceding item()");
        item.subitems.push(RawSubitem {
            id: Some(id.into()),
            name: Some(name.into()),
            column_values: vec![RawColumnValue::new("status", "status", status)],
        });
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> RawBoard {
        self.board
    }
}

/// Two active project boards, one archived board and one sub-item board
#[must_use]
pub fn sample_workspace() -> Vec<RawBoard> {
    vec![
        BoardBuilder::new("100", "Acme-123")
            .description("Rollout for Acme")
            .group("g1", "Infrastructure")
            .item("i1", "g1", "Provision servers", "Done")
            .item("i2", "g1", "Configure network", "Working on it")
            .group("g2", "Training")
            .item("i3", "g2", "Run workshop", "")
            .subitem("s1", "Book room", "Done")
            .build(),
        BoardBuilder::new("200", "Globex")
            .group("g3", "Custom work")
            .item("i4", "g3", "Kickoff", "Terminé")
            .build(),
        BoardBuilder::new("300", "Old project").state("archived").build(),
        BoardBuilder::new("400", "Subitems of Acme-123").build(),
    ]
}
