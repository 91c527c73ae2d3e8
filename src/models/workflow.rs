use serde::{Deserialize, Serialize};

use crate::models::tournament::{Registration, TournamentSummary};

/// The user driving an interaction, as reported by the host transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    #[serde(default)]
    pub is_administrator: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit,
}

/// Workflow session states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    Listing,
    Detail { tournament: String },
    ConfirmingWithdraw { tournament: String },
    Form {
        mode: FormMode,
        /// Tournament being edited; `None` when creating.
        tournament: Option<String>,
    },
}

/// Inputs a session can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Select,
    Back,
    Join,
    Withdraw,
    Confirm,
    Edit,
    Create,
    SubmitForm,
}

impl WorkflowState {
    /// Check if the action is valid in this state
    pub fn accepts(&self, action: WorkflowAction) -> bool {
        match (self, action) {
            (WorkflowState::Listing, WorkflowAction::Select) => true,
            (WorkflowState::Listing, WorkflowAction::Create) => true,
            (WorkflowState::Detail { .. }, WorkflowAction::Join) => true,
            (WorkflowState::Detail { .. }, WorkflowAction::Withdraw) => true,
            (WorkflowState::Detail { .. }, WorkflowAction::Edit) => true,
            (WorkflowState::Detail { .. }, WorkflowAction::Back) => true,
            (WorkflowState::ConfirmingWithdraw { .. }, WorkflowAction::Confirm) => true,
            (WorkflowState::Form { .. }, WorkflowAction::SubmitForm) => true,
            _ => false,
        }
    }

    pub fn available_actions(&self) -> Vec<WorkflowAction> {
        match self {
            WorkflowState::Listing => vec![WorkflowAction::Select, WorkflowAction::Create],
            WorkflowState::Detail { .. } => vec![
                WorkflowAction::Join,
                WorkflowAction::Withdraw,
                WorkflowAction::Edit,
                WorkflowAction::Back,
            ],
            WorkflowState::ConfirmingWithdraw { .. } => vec![WorkflowAction::Confirm],
            WorkflowState::Form { .. } => vec![WorkflowAction::SubmitForm],
        }
    }
}

/// Enabled/disabled flags for the detail view buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailActions {
    pub join: bool,
    pub withdraw: bool,
    /// `None` for viewers without the administrator capability.
    pub edit: Option<bool>,
}

impl DetailActions {
    pub fn for_viewer(is_registered: bool, is_administrator: bool) -> Self {
        Self {
            join: !is_registered,
            withdraw: is_registered,
            edit: is_administrator.then_some(true),
        }
    }

    pub fn can_edit(&self) -> bool {
        self.edit.unwrap_or(false)
    }
}

/// What the transport should render for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Surface {
    Listing {
        title: String,
        tournaments: Vec<TournamentSummary>,
        can_create: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
    },
    Detail {
        tournament: TournamentSummary,
        players: Vec<Registration>,
        actions: DetailActions,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
    },
    ConfirmWithdraw {
        tournament: String,
        label: String,
        placeholder: String,
    },
    Form {
        mode: FormMode,
        name: String,
        start_time: String,
        end_time: String,
    },
}

impl Surface {
    pub fn notice(&self) -> Option<&str> {
        match self {
            Surface::Listing { notice, .. } | Surface::Detail { notice, .. } => notice.as_deref(),
            _ => None,
        }
    }
}

/// Session id plus the surface to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResponse {
    pub session_id: uuid::Uuid,
    pub state: WorkflowState,
    pub surface: Surface,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_accepts() {
        let detail = WorkflowState::Detail {
            tournament: "Cup1".to_string(),
        };
        let confirming = WorkflowState::ConfirmingWithdraw {
            tournament: "Cup1".to_string(),
        };

        assert!(WorkflowState::Listing.accepts(WorkflowAction::Select));
        assert!(detail.accepts(WorkflowAction::Join));
        assert!(detail.accepts(WorkflowAction::Withdraw));
        assert!(confirming.accepts(WorkflowAction::Confirm));

        assert!(!WorkflowState::Listing.accepts(WorkflowAction::Join));
        assert!(!detail.accepts(WorkflowAction::Confirm));
        assert!(!confirming.accepts(WorkflowAction::Join));
        assert!(!confirming.accepts(WorkflowAction::Back));
    }

    #[test]
    fn test_available_actions_agree_with_accepts() {
        let states = vec![
            WorkflowState::Listing,
            WorkflowState::Detail {
                tournament: "a".to_string(),
            },
            WorkflowState::ConfirmingWithdraw {
                tournament: "a".to_string(),
            },
            WorkflowState::Form {
                mode: FormMode::Create,
                tournament: None,
            },
        ];
        for state in states {
            for action in state.available_actions() {
                assert!(state.accepts(action), "{state:?} should accept {action:?}");
            }
        }
    }

    #[test]
    fn test_detail_actions_for_viewer() {
        let member = DetailActions::for_viewer(false, false);
        assert!(member.join);
        assert!(!member.withdraw);
        assert_eq!(member.edit, None);
        assert!(!member.can_edit());

        let admin = DetailActions::for_viewer(true, true);
        assert!(!admin.join);
        assert!(admin.withdraw);
        assert!(admin.can_edit());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(WorkflowState::ConfirmingWithdraw {
            tournament: "Cup1".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"state": "CONFIRMING_WITHDRAW", "tournament": "Cup1"})
        );
    }

    #[test]
    fn test_actor_defaults_to_member() {
        let actor: Actor = serde_json::from_str(r#"{"user_id": "42"}"#).unwrap();
        assert!(!actor.is_administrator);
    }
}
