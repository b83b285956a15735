//! The bookmark tree: groups of named shell commands.
//!
//! A [`Bookmarks`] store owns an ordered list of [`Group`]s, each of which
//! exclusively owns its [`Command`]s. Every command carries an ID that is
//! unique across the whole store and never reused; `next_id` is always
//! greater than every ID handed out so far.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type CommandId = u64;

/// What happens when a command is selected in the interactive session.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Show the action menu.
    #[default]
    None,
    Copy,
    Run,
}

impl ActionType {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, ActionType::None)
    }
}

impl Display for ActionType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            ActionType::None => "none",
            ActionType::Copy => "copy",
            ActionType::Run => "run",
        })
    }
}

impl FromStr for ActionType {
    type Err = Error;

    /// Parses a user supplied action. An empty string means [`ActionType::None`].
    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "none" => Ok(ActionType::None),
            "copy" => Ok(ActionType::Copy),
            "run" => Ok(ActionType::Run),
            other => Err(Error::InvalidAction(other.to_string())),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Command {
    #[serde(default)]
    pub id: CommandId,
    pub name: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "ActionType::is_none")]
    pub default_action: ActionType,
}

impl Command {
    #[must_use]
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    fn matches(&self, name_or_id: &str) -> bool {
        self.name == name_or_id || self.id.to_string() == name_or_id
    }
}

impl Display for Command {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "[{}] {}: {}", self.id, self.name, self.command)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Group {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            commands: Vec::new(),
        }
    }

    fn position(&self, name_or_id: &str) -> Option<usize> {
        self.commands.iter().position(|cmd| cmd.matches(name_or_id))
    }

    /// Replaces the fields of the command at `index`. The new name must not
    /// belong to any other command of the group.
    fn apply_update(&mut self, index: usize, update: CommandUpdate) -> Result<()> {
        let collides = self
            .commands
            .iter()
            .enumerate()
            .any(|(i, other)| i != index && other.name == update.name);
        if collides {
            return Err(Error::DuplicateCommand {
                group: self.name.clone(),
                command: update.name,
            });
        }

        let command = &mut self.commands[index];
        command.name = update.name;
        command.command = update.command;
        command.description = non_empty_description(update.description);
        if let Some(action) = update.default_action {
            command.default_action = action;
        }
        debug!("Updated command {} in group `{}`", command.id, self.name);
        Ok(())
    }
}

/// A read-only projection of a command annotated with its owning group.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatCommand {
    pub id: CommandId,
    pub group_name: String,
    pub name: String,
    pub command: String,
    pub description: String,
    pub default_action: ActionType,
}

impl FlatCommand {
    #[must_use]
    pub fn from_command(group_name: &str, command: &Command) -> Self {
        Self {
            id: command.id,
            group_name: group_name.to_string(),
            name: command.name.clone(),
            command: command.command.clone(),
            description: command.description_text().to_string(),
            default_action: command.default_action,
        }
    }

    /// Text the fuzzy search matches against.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.group_name, self.name, self.command, self.description
        )
    }
}

/// New values for an existing command. `default_action` is only applied
/// when set.
#[derive(Debug, Clone, Default)]
pub struct CommandUpdate {
    pub name: String,
    pub command: String,
    pub description: Option<String>,
    pub default_action: Option<ActionType>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Bookmarks {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub next_id: CommandId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

impl Default for Bookmarks {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            next_id: 1,
            editor: None,
        }
    }
}

fn non_empty_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.is_empty())
}

impl Bookmarks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns IDs to commands that have none and raises `next_id` above
    /// the largest ID present.
    pub fn migrate_ids(&mut self) {
        let max_id = self
            .groups
            .iter()
            .flat_map(|g| g.commands.iter())
            .map(|cmd| cmd.id)
            .max()
            .unwrap_or(0);

        if self.next_id <= max_id {
            self.next_id = max_id + 1;
        }

        for group in &mut self.groups {
            for command in &mut group.commands {
                if command.id == 0 {
                    command.id = self.next_id;
                    self.next_id += 1;
                    debug!("Assigned ID {} to command `{}`", command.id, command.name);
                }
            }
        }
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    fn group_mut(&mut self, name: &str) -> Result<&mut Group> {
        self.groups
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| Error::GroupNotFound(name.to_string()))
    }

    pub fn add_group(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::EmptyName("group"));
        }
        if self.group(name).is_some() {
            return Err(Error::DuplicateGroup(name.to_string()));
        }
        self.groups.push(Group::new(name));
        debug!("Added group `{name}`");
        Ok(())
    }

    pub fn rename_group(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if new_name.is_empty() {
            return Err(Error::EmptyName("group"));
        }
        if old_name != new_name && self.group(new_name).is_some() {
            return Err(Error::DuplicateGroup(new_name.to_string()));
        }
        self.group_mut(old_name)?.name = new_name.to_string();
        debug!("Renamed group `{old_name}` to `{new_name}`");
        Ok(())
    }

    /// Removes a group together with all of its commands.
    pub fn remove_group(&mut self, name: &str) -> Result<()> {
        let index = self
            .groups
            .iter()
            .position(|g| g.name == name)
            .ok_or_else(|| Error::GroupNotFound(name.to_string()))?;
        let removed = self.groups.remove(index);
        debug!(
            "Removed group `{name}` with {} commands",
            removed.commands.len()
        );
        Ok(())
    }

    /// Appends a command to a group and returns its freshly assigned ID.
    pub fn add_command(
        &mut self,
        group_name: &str,
        name: &str,
        command: &str,
        description: Option<String>,
        default_action: ActionType,
    ) -> Result<CommandId> {
        if name.is_empty() {
            return Err(Error::EmptyName("command"));
        }

        let id = self.next_id;
        let group = self.group_mut(group_name)?;

        if group.commands.iter().any(|cmd| cmd.name == name) {
            return Err(Error::DuplicateCommand {
                group: group_name.to_string(),
                command: name.to_string(),
            });
        }

        group.commands.push(Command {
            id,
            name: name.to_string(),
            command: command.to_string(),
            description: non_empty_description(description),
            default_action,
        });
        self.next_id += 1;
        debug!("Added command `{name}` ({id}) to group `{group_name}`");
        Ok(id)
    }

    /// Updates the command matching `name_or_id` in place, keeping its ID.
    pub fn update_command(
        &mut self,
        group_name: &str,
        name_or_id: &str,
        update: CommandUpdate,
    ) -> Result<()> {
        if update.name.is_empty() {
            return Err(Error::EmptyName("command"));
        }

        let group = self.group_mut(group_name)?;
        let index = group
            .position(name_or_id)
            .ok_or_else(|| Error::CommandNotFound {
                group: group_name.to_string(),
                command: name_or_id.to_string(),
            })?;
        group.apply_update(index, update)
    }

    /// Updates the command with ID `id` in place. Names are never consulted
    /// when locating it.
    pub fn update_command_by_id(&mut self, id: CommandId, update: CommandUpdate) -> Result<()> {
        if update.name.is_empty() {
            return Err(Error::EmptyName("command"));
        }

        let (group_index, index) = self
            .groups
            .iter()
            .enumerate()
            .find_map(|(g, group)| {
                group
                    .commands
                    .iter()
                    .position(|cmd| cmd.id == id)
                    .map(|i| (g, i))
            })
            .ok_or(Error::CommandIdNotFound(id))?;
        self.groups[group_index].apply_update(index, update)
    }

    pub fn remove_command(&mut self, group_name: &str, name_or_id: &str) -> Result<()> {
        let group = self.group_mut(group_name)?;
        let index = group
            .position(name_or_id)
            .ok_or_else(|| Error::CommandNotFound {
                group: group_name.to_string(),
                command: name_or_id.to_string(),
            })?;
        let removed = group.commands.remove(index);
        debug!("Removed command `{}` from group `{group_name}`", removed.name);
        Ok(())
    }

    pub fn remove_command_by_id(&mut self, id: CommandId) -> Result<()> {
        for group in &mut self.groups {
            if let Some(index) = group.commands.iter().position(|cmd| cmd.id == id) {
                group.commands.remove(index);
                debug!("Removed command {id} from group `{}`", group.name);
                return Ok(());
            }
        }
        Err(Error::CommandIdNotFound(id))
    }

    pub fn set_command_action(&mut self, id: CommandId, action: ActionType) -> Result<()> {
        let command = self
            .groups
            .iter_mut()
            .flat_map(|g| g.commands.iter_mut())
            .find(|cmd| cmd.id == id)
            .ok_or(Error::CommandIdNotFound(id))?;
        command.default_action = action;
        Ok(())
    }

    pub fn command(&self, group_name: &str, name_or_id: &str) -> Result<&Command> {
        let group = self
            .group(group_name)
            .ok_or_else(|| Error::GroupNotFound(group_name.to_string()))?;
        group
            .commands
            .iter()
            .find(|cmd| cmd.matches(name_or_id))
            .ok_or_else(|| Error::CommandNotFound {
                group: group_name.to_string(),
                command: name_or_id.to_string(),
            })
    }

    /// Finds a command by its global ID, returning it with its group name.
    #[must_use]
    pub fn command_by_id(&self, id: CommandId) -> Option<(&Command, &str)> {
        self.groups.iter().find_map(|g| {
            g.commands
                .iter()
                .find(|cmd| cmd.id == id)
                .map(|cmd| (cmd, g.name.as_str()))
        })
    }

    #[must_use]
    pub fn flat_commands(&self) -> Vec<FlatCommand> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.commands
                    .iter()
                    .map(move |cmd| FlatCommand::from_command(&g.name, cmd))
            })
            .collect()
    }
}
