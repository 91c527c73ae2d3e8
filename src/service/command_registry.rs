use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An interaction command the host transport should register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
    /// Id assigned by the chat platform once the command is synced.
    pub id: Option<String>,
}

/// Commands known to this service and the ids the platform gave them.
///
/// Owned by the HTTP app state and handed to handlers; nothing here is global.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<CommandInfo>,
}

impl CommandRegistry {
    pub fn new(commands: Vec<CommandInfo>) -> Self {
        Self { commands }
    }

    /// The commands this service answers.
    pub fn builtin() -> Self {
        Self::new(vec![
            CommandInfo {
                name: "tournaments".to_string(),
                description: "Create, manage, and view tournaments.".to_string(),
                id: None,
            },
            CommandInfo {
                name: "help".to_string(),
                description: "Show a list of the bot's registered slash commands.".to_string(),
                id: None,
            },
        ])
    }

    pub fn commands(&self) -> &[CommandInfo] {
        &self.commands
    }

    /// Record the ids returned by a platform sync. Returns how many commands matched.
    pub fn apply_sync(&mut self, synced: &HashMap<String, String>) -> usize {
        let mut matched = 0;
        for command in &mut self.commands {
            command.id = synced.get(&command.name).cloned();
            if command.id.is_some() {
                matched += 1;
            }
        }
        matched
    }

    pub fn mentions(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|command| match &command.id {
                Some(id) => format!("</{}:{}>", command.name, id),
                None => format!("`/{}` (unsynced)", command.name),
            })
            .collect()
    }

    pub fn format_mentions(&self) -> String {
        if self.commands.is_empty() {
            return "No commands registered.".to_string();
        }
        self.mentions().join("\n")
    }
}
