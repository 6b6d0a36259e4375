use crate::configs::FilterConfig;
use crate::model::{FilterVerdict, ServerEvent, SourceDialect};

/// # Filter Engine
///
/// Evaluates events against the acceptance rules as an ordered chain; the first
/// failing rule decides and supplies the reason. Evaluation has no side effects,
/// so the same event always gets the same verdict.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    config: FilterConfig,
}

type Rule = fn(&FilterConfig, &ServerEvent) -> Option<String>;

const RULES: [Rule; 5] = [
    positional_rule,
    money_rule,
    player_threshold_rule,
    name_rule,
    high_value_rule,
];

impl FilterEngine {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn evaluate(&self, event: &ServerEvent) -> FilterVerdict {
        RULES
            .iter()
            .find_map(|rule| rule(&self.config, event))
            .map_or_else(FilterVerdict::accept, FilterVerdict::reject)
    }
}

fn positional_rule(config: &FilterConfig, event: &ServerEvent) -> Option<String> {
    let rules = &config.positional;
    if event.source_dialect != SourceDialect::Positional || !rules.enabled {
        return None;
    }

    if rules.require_job_id && event.job_id.is_none() {
        return Some("positional message missing required job_id".to_string());
    }

    if let Some(current) = event.player_count() {
        if !(rules.min_players..=rules.max_players).contains(&current) {
            return Some(format!(
                "positional players {} not in range [{}, {}]",
                current, rules.min_players, rules.max_players
            ));
        }
    }

    if rules.ignore_zero_income && event.money_rate == Some(0.0) {
        return Some("positional server has zero income (ignored)".to_string());
    }

    None
}

fn money_rule(config: &FilterConfig, event: &ServerEvent) -> Option<String> {
    let money = event.money_rate?;
    if config.money.contains(money) {
        return None;
    }
    Some(format!(
        "money {}M/s not in range [{}, {}]",
        money, config.money.min, config.money.max
    ))
}

fn player_threshold_rule(config: &FilterConfig, event: &ServerEvent) -> Option<String> {
    let current = event.player_count()?;
    (current >= config.player_threshold).then(|| {
        format!(
            "players {} >= threshold {}",
            current, config.player_threshold
        )
    })
}

fn name_rule(config: &FilterConfig, event: &ServerEvent) -> Option<String> {
    let name = event.name.as_deref()?;

    if config.ignore_unknown && name.eq_ignore_ascii_case("unknown") {
        return Some("name is 'Unknown' (ignored)".to_string());
    }
    if config.ignore_list.iter().any(|n| n == name) {
        return Some(format!("name '{}' in ignore list", name));
    }
    if config.allow_list.enabled && !config.allow_list.allowed_names.iter().any(|n| n == name) {
        return Some(format!("name '{}' not in allowed list", name));
    }
    None
}

fn high_value_rule(config: &FilterConfig, event: &ServerEvent) -> Option<String> {
    (event.is_high_value && !config.bypass_high_value)
        .then(|| "high-value server blocked by configuration".to_string())
}
