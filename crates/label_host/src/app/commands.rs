use label_engine::ActorId;
use tracing::{info, warn};

use super::roster::{AccessRoster, RosterError};

const OPEN_USAGE: &str = "open effect <on|off>";
const MANAGE_USAGE: &str = "openeffect <add|remove|members|owners|all> ...";
const ADD_USAGE: &str = "openeffect add <member|owner> <name>";
const REMOVE_USAGE: &str = "openeffect remove <member|owner> <name>";
const DENIED: &str = "you do not have permission to run this command";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RosterRole {
    Member,
    Owner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LabelCommand {
    Toggle { show: bool },
    Add { role: RosterRole, name: String },
    Remove { role: RosterRole, name: String },
    ListMembers,
    ListOwners,
    ListAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandParseError {
    reason: String,
    usage: String,
}

impl CommandParseError {
    fn new(reason: impl Into<String>, usage: &str) -> Self {
        Self {
            reason: reason.into(),
            usage: usage.to_string(),
        }
    }
}

/// Follow-up the session owes the label service after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandEffect {
    None,
    PreferenceChanged { viewer: ActorId, wants_show: bool },
    RefreshViewer(ActorId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandReply {
    pub(crate) lines: Vec<String>,
    pub(crate) effect: CommandEffect,
}

impl CommandReply {
    fn text(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            effect: CommandEffect::None,
        }
    }

    fn with_effect(line: impl Into<String>, effect: CommandEffect) -> Self {
        Self {
            lines: vec![line.into()],
            effect,
        }
    }
}

/// Name lookups the roster commands need from the host.
pub(crate) trait PlayerDirectory {
    fn resolve_name(&self, name: &str) -> Option<ActorId>;
    fn display_name(&self, id: ActorId) -> Option<String>;
}

fn tokenize(line: &str) -> Vec<String> {
    line.trim()
        .trim_start_matches('/')
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Parses the arguments of a command already known to be `open` or `openeffect`.
pub(crate) fn parse_command(name: &str, args: &[String]) -> Result<LabelCommand, CommandParseError> {
    match name.to_ascii_lowercase().as_str() {
        "open" => parse_open_command(args),
        "openeffect" => parse_manage_command(args),
        other => Err(CommandParseError::new(
            format!("unknown command '{other}'"),
            "open | openeffect",
        )),
    }
}

fn parse_open_command(args: &[String]) -> Result<LabelCommand, CommandParseError> {
    if args.len() != 2 || !args[0].eq_ignore_ascii_case("effect") {
        return Err(CommandParseError::new(
            "expected 'effect' followed by on|off",
            OPEN_USAGE,
        ));
    }
    match args[1].to_ascii_lowercase().as_str() {
        "on" => Ok(LabelCommand::Toggle { show: true }),
        "off" => Ok(LabelCommand::Toggle { show: false }),
        _ => Err(CommandParseError::new(
            format!("unknown switch '{}' (expected on|off)", args[1]),
            OPEN_USAGE,
        )),
    }
}

fn parse_manage_command(args: &[String]) -> Result<LabelCommand, CommandParseError> {
    let Some(action) = args.first() else {
        return Err(CommandParseError::new("missing subcommand", MANAGE_USAGE));
    };
    match action.to_ascii_lowercase().as_str() {
        "members" | "owners" | "all" if args.len() > 1 => Err(CommandParseError::new(
            format!("'{action}' takes no arguments"),
            MANAGE_USAGE,
        )),
        "members" => Ok(LabelCommand::ListMembers),
        "owners" => Ok(LabelCommand::ListOwners),
        "all" => Ok(LabelCommand::ListAll),
        "add" => {
            let (role, name) = parse_role_and_name(&args[1..], ADD_USAGE)?;
            Ok(LabelCommand::Add { role, name })
        }
        "remove" => {
            let (role, name) = parse_role_and_name(&args[1..], REMOVE_USAGE)?;
            Ok(LabelCommand::Remove { role, name })
        }
        _ => Err(CommandParseError::new(
            format!("unknown subcommand '{action}'"),
            MANAGE_USAGE,
        )),
    }
}

fn parse_role_and_name(
    args: &[String],
    usage: &str,
) -> Result<(RosterRole, String), CommandParseError> {
    if args.len() != 2 {
        return Err(CommandParseError::new(
            "expected <member|owner> <name>",
            usage,
        ));
    }
    let role = match args[0].to_ascii_lowercase().as_str() {
        "member" => RosterRole::Member,
        "owner" => RosterRole::Owner,
        _ => {
            return Err(CommandParseError::new(
                format!("unknown role '{}' (expected member|owner)", args[0]),
                usage,
            ))
        }
    };
    Ok((role, args[1].clone()))
}

/// Roster edits are refused for non-owners before their arguments are looked at.
fn requests_roster_change(command: &str, args: &[String]) -> bool {
    command == "openeffect"
        && args.first().is_some_and(|action| {
            action.eq_ignore_ascii_case("add") || action.eq_ignore_ascii_case("remove")
        })
}

/// Runs one command line on behalf of `sender`. Roster changes are persisted before the
/// reply is returned.
pub(crate) fn execute_line<D: PlayerDirectory + ?Sized>(
    sender: ActorId,
    line: &str,
    roster: &mut AccessRoster,
    directory: &D,
) -> Result<CommandReply, RosterError> {
    let tokens = tokenize(line);
    let Some((name, args)) = tokens.split_first() else {
        return Ok(CommandReply::text("error: empty command"));
    };
    let lower = name.to_ascii_lowercase();
    if lower != "open" && lower != "openeffect" {
        return Ok(CommandReply::text(format!(
            "error: unknown command '{name}'"
        )));
    }
    let refused = !roster.is_authorized(sender)
        || (requests_roster_change(&lower, args) && !roster.can_manage(sender));
    if refused {
        warn!(sender = sender.0, command = %lower, "label_command_denied");
        return Ok(CommandReply::text(DENIED));
    }

    let command = match parse_command(&lower, args) {
        Ok(command) => command,
        Err(error) => {
            return Ok(CommandReply::text(format!(
                "error: {}. usage: {}",
                error.reason, error.usage
            )))
        }
    };
    execute(sender, command, roster, directory)
}

fn execute<D: PlayerDirectory + ?Sized>(
    sender: ActorId,
    command: LabelCommand,
    roster: &mut AccessRoster,
    directory: &D,
) -> Result<CommandReply, RosterError> {
    match command {
        LabelCommand::Toggle { show } => {
            roster.set_enabled(sender, show)?;
            info!(sender = sender.0, show, "label_preference_changed");
            let line = if show {
                "effect labels turned ON"
            } else {
                "effect labels turned OFF"
            };
            Ok(CommandReply::with_effect(
                line,
                CommandEffect::PreferenceChanged {
                    viewer: sender,
                    wants_show: show,
                },
            ))
        }
        LabelCommand::Add { role, name } => {
            let Some(target) = directory.resolve_name(&name) else {
                return Ok(CommandReply::text(format!("no player named '{name}'")));
            };
            match role {
                RosterRole::Owner => {
                    if target == sender {
                        return Ok(CommandReply::text("you cannot add yourself"));
                    }
                    roster.add_owner(target)?;
                    info!(sender = sender.0, target = target.0, "roster_owner_added");
                    Ok(CommandReply::with_effect(
                        format!("added {name} as owner"),
                        CommandEffect::RefreshViewer(target),
                    ))
                }
                RosterRole::Member => {
                    roster.add_member(target)?;
                    info!(sender = sender.0, target = target.0, "roster_member_added");
                    Ok(CommandReply::with_effect(
                        format!("added {name} as member"),
                        CommandEffect::RefreshViewer(target),
                    ))
                }
            }
        }
        LabelCommand::Remove { role, name } => {
            let Some(target) = directory.resolve_name(&name) else {
                return Ok(CommandReply::text(format!("no player named '{name}'")));
            };
            match role {
                RosterRole::Owner => {
                    if roster.is_operator(target) {
                        return Ok(CommandReply::text(format!(
                            "{name} is an operator and cannot be removed"
                        )));
                    }
                    if target == sender {
                        return Ok(CommandReply::text("you cannot remove yourself"));
                    }
                    if !roster.remove_owner(target)? {
                        return Ok(CommandReply::text(format!("{name} is not an owner")));
                    }
                    info!(sender = sender.0, target = target.0, "roster_owner_removed");
                    Ok(CommandReply::with_effect(
                        format!("removed owner {name}"),
                        CommandEffect::RefreshViewer(target),
                    ))
                }
                RosterRole::Member => {
                    if !roster.remove_member(target)? {
                        return Ok(CommandReply::text(format!("{name} is not a member")));
                    }
                    info!(sender = sender.0, target = target.0, "roster_member_removed");
                    Ok(CommandReply::with_effect(
                        format!("removed member {name}"),
                        CommandEffect::RefreshViewer(target),
                    ))
                }
            }
        }
        LabelCommand::ListMembers => Ok(list_reply(&[("Members", roster.members())], directory)),
        LabelCommand::ListOwners => Ok(list_reply(&[("Owners", roster.owners())], directory)),
        LabelCommand::ListAll => Ok(list_reply(
            &[("Owners", roster.owners()), ("Members", roster.members())],
            directory,
        )),
    }
}

fn list_reply<D: PlayerDirectory + ?Sized>(
    sections: &[(&str, Vec<ActorId>)],
    directory: &D,
) -> CommandReply {
    let mut lines = Vec::new();
    for (title, ids) in sections {
        lines.push(format!("{title}:"));
        for id in ids {
            lines.push(
                directory
                    .display_name(*id)
                    .unwrap_or_else(|| id.0.to_string()),
            );
        }
    }
    CommandReply {
        lines,
        effect: CommandEffect::None,
    }
}

/// Tab completion for a partially typed command line. The last token is the one being
/// completed; an empty trailing token is produced when the line ends in whitespace.
pub(crate) fn complete(sender: ActorId, line: &str, roster: &AccessRoster) -> Vec<String> {
    let trimmed = line.trim_start().trim_start_matches('/');
    let mut tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if trimmed.is_empty() || trimmed.ends_with(char::is_whitespace) {
        tokens.push("");
    }
    let Some((name, args)) = tokens.split_first() else {
        return Vec::new();
    };
    let Some((partial, previous)) = args.split_last() else {
        return Vec::new();
    };

    let candidates: &[&str] = match name.to_ascii_lowercase().as_str() {
        "open" => match previous {
            [] => &["effect"],
            [first] if first.eq_ignore_ascii_case("effect") => &["on", "off"],
            _ => &[],
        },
        "openeffect" => {
            let manager = roster.can_manage(sender);
            match previous {
                [] if manager => &["members", "owners", "all", "add", "remove"],
                [] => &["members", "owners", "all"],
                [first]
                    if manager
                        && (first.eq_ignore_ascii_case("add")
                            || first.eq_ignore_ascii_case("remove")) =>
                {
                    &["member", "owner"]
                }
                _ => &[],
            }
        }
        _ => &[],
    };

    let prefix = partial.to_ascii_lowercase();
    candidates
        .iter()
        .filter(|candidate| candidate.starts_with(&prefix))
        .map(|candidate| candidate.to_string())
        .collect()
}
