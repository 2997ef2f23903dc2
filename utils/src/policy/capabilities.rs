use hush_db::{DisabledCapabilities, RELEASE_ACTION};

/// Command that toggles silence, never disabled by a silence.
pub const SILENCE_COMMAND: &str = "silence_command";

/// Everything currently enabled except the silence controls themselves.
/// With `disable_commands` off only actions are taken away.
pub fn capabilities_to_disable<A, C>(
    enabled_actions: A,
    enabled_commands: C,
    disable_commands: bool,
) -> DisabledCapabilities
where
    A: IntoIterator,
    A::Item: AsRef<str>,
    C: IntoIterator,
    C::Item: AsRef<str>,
{
    let actions = enabled_actions
        .into_iter()
        .filter(|name| name.as_ref() != RELEASE_ACTION)
        .map(|name| name.as_ref().to_string());
    let commands: Vec<String> = if disable_commands {
        enabled_commands
            .into_iter()
            .filter(|name| name.as_ref() != SILENCE_COMMAND)
            .map(|name| name.as_ref().to_string())
            .collect()
    } else {
        Vec::new()
    };
    DisabledCapabilities::new(actions, commands)
}
