// ABOUTME: Resolves which agents run, in what order, and which provider each one uses.
// ABOUTME: Explicit sequence, then the serial pipeline, then a single default agent.

use crate::config::{Provider, find_provider};

use super::definition::Agent;

/// Find an agent by id. Blank ids never match.
pub fn find_agent<'a>(agents: &'a [Agent], id: Option<&str>) -> Option<&'a Agent> {
    let id = id.map(str::trim).filter(|id| !id.is_empty())?;
    agents.iter().find(|agent| agent.id == id)
}

/// Pick the ordered list of agents for a run.
///
/// 1. `sequence_ids`, in the given order, skipping unknown ids.
/// 2. Every serial-enabled agent, sorted by `serial_order` (the agent's index
///    when unset), ties broken by position in `agents`.
/// 3. A single agent: `agent_id`, then `default_agent_id`, then the first agent.
///
/// Returns an empty list only when `agents` is empty.
pub fn resolve_agent_sequence<'a>(
    agents: &'a [Agent],
    sequence_ids: &[String],
    agent_id: Option<&str>,
    default_agent_id: Option<&str>,
) -> Vec<&'a Agent> {
    let explicit: Vec<&Agent> = sequence_ids
        .iter()
        .filter_map(|id| find_agent(agents, Some(id)))
        .collect();
    if !explicit.is_empty() {
        return explicit;
    }

    let mut serial: Vec<(i64, usize, &Agent)> = agents
        .iter()
        .enumerate()
        .filter(|(_, agent)| agent.serial_enabled)
        .map(|(index, agent)| (agent.serial_order.unwrap_or(index as i64), index, agent))
        .collect();
    if !serial.is_empty() {
        serial.sort_by_key(|(order, index, _)| (*order, *index));
        return serial.into_iter().map(|(_, _, agent)| agent).collect();
    }

    find_agent(agents, agent_id)
        .or_else(|| find_agent(agents, default_agent_id))
        .or_else(|| agents.first())
        .into_iter()
        .collect()
}

/// Pick the provider a run reports and falls back to.
///
/// Explicit `provider_id`, then the first agent's provider, then
/// `default_provider_id`, then the first provider.
pub fn resolve_primary_provider<'a>(
    providers: &'a [Provider],
    provider_id: Option<&str>,
    first_agent: Option<&Agent>,
    default_provider_id: Option<&str>,
) -> Option<&'a Provider> {
    find_provider(providers, provider_id)
        .or_else(|| find_provider(providers, first_agent.and_then(|a| a.provider_id.as_deref())))
        .or_else(|| find_provider(providers, default_provider_id))
        .or_else(|| providers.first())
}

/// The provider a stage talks to: the agent's own when it resolves, else `primary`.
pub fn stage_provider<'a>(
    providers: &'a [Provider],
    agent: &Agent,
    primary: &'a Provider,
) -> &'a Provider {
    find_provider(providers, agent.provider_id.as_deref()).unwrap_or(primary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(agents: &[&Agent]) -> Vec<String> {
        agents.iter().map(|a| a.id.clone()).collect()
    }

    fn roster() -> Vec<Agent> {
        vec![
            Agent::new("drafter", "Draft."),
            Agent::new("editor", "Edit."),
            Agent::new("critic", "Critique."),
        ]
    }

    #[test]
    fn test_explicit_sequence_keeps_order_and_skips_unknown() {
        let agents = roster();
        let sequence = vec!["critic".to_string(), "ghost".to_string(), "drafter".to_string()];

        let resolved = resolve_agent_sequence(&agents, &sequence, None, None);
        assert_eq!(ids(&resolved), vec!["critic", "drafter"]);
    }

    #[test]
    fn test_unresolvable_sequence_falls_back() {
        let agents = roster();
        let sequence = vec!["ghost".to_string()];

        let resolved = resolve_agent_sequence(&agents, &sequence, Some("editor"), None);
        assert_eq!(ids(&resolved), vec!["editor"]);
    }

    #[test]
    fn test_serial_agents_sorted_by_order() {
        let agents = vec![
            Agent::new("a", "").serial(2),
            Agent::new("solo", ""),
            Agent::new("b", "").serial(1),
        ];

        let resolved = resolve_agent_sequence(&agents, &[], Some("solo"), None);
        assert_eq!(ids(&resolved), vec!["b", "a"]);
    }

    #[test]
    fn test_serial_order_defaults_to_index_and_ties_keep_position() {
        let mut first = Agent::new("first", "");
        first.serial_enabled = true;
        let mut third = Agent::new("third", "");
        third.serial_enabled = true;
        let agents = vec![
            first,
            Agent::new("tied", "").serial(2),
            third,
            Agent::new("early", "").serial(0),
        ];

        // first -> 0, tied -> 2, third -> 2, early -> 0
        let resolved = resolve_agent_sequence(&agents, &[], None, None);
        assert_eq!(ids(&resolved), vec!["first", "early", "tied", "third"]);
    }

    #[test]
    fn test_single_agent_fallback_chain() {
        let agents = roster();

        let explicit = resolve_agent_sequence(&agents, &[], Some("critic"), Some("editor"));
        assert_eq!(ids(&explicit), vec!["critic"]);

        let default = resolve_agent_sequence(&agents, &[], Some("ghost"), Some("editor"));
        assert_eq!(ids(&default), vec!["editor"]);

        let first = resolve_agent_sequence(&agents, &[], None, Some(" "));
        assert_eq!(ids(&first), vec!["drafter"]);
    }

    #[test]
    fn test_no_agents() {
        assert!(resolve_agent_sequence(&[], &["x".to_string()], Some("x"), Some("x")).is_empty());
    }

    #[test]
    fn test_primary_provider_fallback_chain() {
        let providers = vec![
            Provider::new("openai", "https://api.openai.com/v1"),
            Provider::new("local", "http://localhost:11434/v1"),
            Provider::new("groq", "https://api.groq.com/openai/v1"),
        ];
        let agent = Agent::new("editor", "").provider("groq");

        let explicit = resolve_primary_provider(&providers, Some("local"), Some(&agent), None);
        assert_eq!(explicit.unwrap().id, "local");

        let from_agent = resolve_primary_provider(&providers, Some("ghost"), Some(&agent), None);
        assert_eq!(from_agent.unwrap().id, "groq");

        let unbound = Agent::new("plain", "");
        let default = resolve_primary_provider(&providers, None, Some(&unbound), Some("local"));
        assert_eq!(default.unwrap().id, "local");

        let first = resolve_primary_provider(&providers, None, None, None);
        assert_eq!(first.unwrap().id, "openai");

        assert!(resolve_primary_provider(&[], Some("openai"), Some(&agent), None).is_none());
    }

    #[test]
    fn test_stage_provider_falls_back_to_primary() {
        let providers = vec![
            Provider::new("openai", "https://api.openai.com/v1"),
            Provider::new("local", "http://localhost:11434/v1"),
        ];
        let primary = &providers[0];

        let bound = Agent::new("a", "").provider("local");
        assert_eq!(stage_provider(&providers, &bound, primary).id, "local");

        let dangling = Agent::new("b", "").provider("removed");
        assert_eq!(stage_provider(&providers, &dangling, primary).id, "openai");
    }
}
