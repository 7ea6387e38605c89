use crate::config::{EffectiveConfiguration, RuleId, RuleSetting, Severity};
use crate::scan::ScanResult;
use regex::Regex;
use serde_json::json;

/// Which rules to display.
#[derive(Debug, Default)]
pub struct RuleView {
    /// Only rules whose id matches.
    pub filter: Option<Regex>,
    /// Include rules set to `off`.
    pub include_off: bool,
}

impl RuleView {
    pub fn visible<'a>(
        &self,
        config: &'a EffectiveConfiguration,
    ) -> Vec<(&'a RuleId, &'a RuleSetting)> {
        config
            .rules()
            .iter()
            .filter(|(_, setting)| self.include_off || setting.is_enabled())
            .filter(|(id, _)| {
                self.filter
                    .as_ref()
                    .map_or(true, |re| re.is_match(id.as_str()))
            })
            .collect()
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warn => "\x1b[33mwarn \x1b[0m",
        Severity::Off => "\x1b[90moff  \x1b[0m",
    }
}

/// Print one file's effective configuration with ANSI colors.
pub fn print_pretty(path: &str, config: &EffectiveConfiguration, view: &RuleView) {
    println!("\x1b[4m{}\x1b[0m", path);

    let rules = view.visible(config);
    if rules.is_empty() {
        println!("  \x1b[90mno rules\x1b[0m");
    }
    for (id, setting) in &rules {
        let source = config
            .source(id.as_str())
            .map(|s| s.to_string())
            .unwrap_or_default();
        println!(
            "  {} \x1b[90m{:<35}\x1b[0m {:<20}",
            severity_label(setting.severity()),
            id,
            source
        );
        if !setting.options().is_empty() {
            let options = serde_json::Value::Array(setting.options().to_vec());
            println!("        \x1b[90m└─\x1b[0m \x1b[36m{}\x1b[0m", options);
        }
    }

    if !config.environments().is_empty() {
        let envs: Vec<&str> = config.environments().iter().map(String::as_str).collect();
        println!("\n  \x1b[1menv\x1b[0m      {}", envs.join(", "));
    }
    if !config.plugins().is_empty() {
        let plugins: Vec<&str> = config.plugins().iter().map(String::as_str).collect();
        println!("  \x1b[1mplugins\x1b[0m  {}", plugins.join(", "));
    }
    if let Some(parser) = config.parser() {
        println!("  \x1b[1mparser\x1b[0m   {}", parser);
    }

    let enabled = config.enabled_rules().count();
    println!(
        "\n\x1b[1m{} rule{} enabled\x1b[0m ({} configured, {} globals)",
        enabled,
        if enabled == 1 { "" } else { "s" },
        config.rules().len(),
        config.globals().len()
    );
}

/// Structured form of one file's configuration, restricted to the visible rules.
pub fn to_json(path: &str, config: &EffectiveConfiguration, view: &RuleView) -> serde_json::Value {
    let rules: serde_json::Map<String, serde_json::Value> = view
        .visible(config)
        .into_iter()
        .map(|(id, setting)| {
            (
                id.to_string(),
                json!({
                    "setting": setting,
                    "source": config.source(id.as_str()),
                }),
            )
        })
        .collect();

    json!({
        "path": path,
        "rules": rules,
        "globals": config.globals(),
        "env": config.environments(),
        "plugins": config.plugins(),
        "parser": config.parser(),
        "parserOptions": config.parser_options(),
        "settings": config.settings(),
    })
}

pub fn print_json(path: &str, config: &EffectiveConfiguration, view: &RuleView) {
    let output = to_json(path, config, view);
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

/// Print a one-line summary per resolved file.
pub fn print_batch_pretty(result: &ScanResult) {
    for file in &result.files {
        let errors = file
            .config
            .enabled_rules()
            .filter(|(_, s)| s.severity() == Severity::Error)
            .count();
        let warnings = file
            .config
            .enabled_rules()
            .filter(|(_, s)| s.severity() == Severity::Warn)
            .count();
        println!(
            "  {:<50} \x1b[31m{:>3} error\x1b[0m  \x1b[33m{:>3} warn\x1b[0m",
            file.path, errors, warnings
        );
    }

    println!(
        "\n\x1b[1m{} file{} resolved\x1b[0m ({} ignored, {} overrides loaded)",
        result.files.len(),
        if result.files.len() == 1 { "" } else { "s" },
        result.files_ignored,
        result.overrides_loaded
    );
}

pub fn print_batch_json(result: &ScanResult) {
    let view = RuleView::default();
    let files: Vec<_> = result
        .files
        .iter()
        .map(|f| to_json(&f.path, &f.config, &view))
        .collect();

    let output = json!({
        "files": files,
        "summary": {
            "resolved": result.files.len(),
            "ignored": result.files_ignored,
            "overrides_loaded": result.overrides_loaded,
        },
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}
