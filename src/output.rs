//! Renderers for query results, single patterns and pattern listings.
//!
//! JSON and YAML renderings are the envelope shapes themselves. Text is for
//! terminals and carries no stability guarantee.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::enums::OutputFormat;
use crate::error::{Error, Result};
use crate::index::PatternRef;
use crate::loader::ROOT_KEY;
use crate::response::{PatternOutputVerbose, QueryResult, ResponseBody};
use crate::types::ThreatPattern;

const RULE_WIDE: usize = 50;
const RULE_PAGE: usize = 60;
const RULE_NARROW: usize = 40;

/// Render a query result.
pub fn format_output(result: &QueryResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(result),
        OutputFormat::Yaml => to_yaml(result),
        OutputFormat::Text => Ok(ResultText(result).to_string()),
    }
}

/// Render one full pattern record.
///
/// The YAML rendering wraps the record in its `threat_pattern` root, so it can
/// be read back with [`crate::loader::parse_pattern`].
pub fn format_pattern_detail(pattern: &ThreatPattern, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(pattern),
        OutputFormat::Yaml => {
            let mut root = serde_json::Map::new();
            root.insert(ROOT_KEY.to_string(), serde_json::to_value(pattern)?);
            to_yaml(&serde_json::Value::Object(root))
        }
        OutputFormat::Text => Ok(PatternText(pattern).to_string()),
    }
}

/// One line per pattern, or a short block per pattern when `verbose`.
pub fn format_pattern_list(patterns: &[PatternRef], verbose: bool) -> String {
    PatternList { patterns, verbose }.to_string()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    // Through serde_json::Value for consistent field ordering.
    let value = serde_json::to_value(value)?;
    serde_saphyr::to_string(&value).map_err(|e| Error::EncodeYaml(e.to_string()))
}

fn rule(f: &mut Formatter<'_>, ch: char, width: usize) -> fmt::Result {
    writeln!(f, "{}", ch.to_string().repeat(width))
}

// ─── Query results ──────────────────────────────────────────────────────────

struct ResultText<'a>(&'a QueryResult);

impl Display for ResultText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "Found {} relevant threat pattern(s)", result.pattern_count)?;
        rule(f, '=', RULE_WIDE)?;
        writeln!(f)?;

        match &result.body {
            ResponseBody::Machine {
                patterns,
                code_pattern,
                token_limit_reached,
                ..
            } => {
                for (i, p) in patterns.iter().enumerate() {
                    writeln!(f, "[{}] {} (Severity: {})", i + 1, p.id, p.severity)?;
                    rule(f, '-', RULE_NARROW)?;
                    writeln!(f, "THREAT: {}\n", p.threat)?;
                    writeln!(f, "CHECK:  {}\n", p.check)?;
                    writeln!(f, "FIX:    {}\n", p.fix)?;
                }
                if *token_limit_reached {
                    writeln!(
                        f,
                        "({} of {} patterns shown; token budget reached)\n",
                        result.patterns_included, result.pattern_count
                    )?;
                }
                if let Some(code) = code_pattern {
                    rule(f, '=', RULE_WIDE)?;
                    writeln!(f, "SECURE CODE TEMPLATE")?;
                    writeln!(f, "Language: {} | Framework: {}", code.language, code.framework)?;
                    rule(f, '-', RULE_NARROW)?;
                    writeln!(f, "{}", code.secure_template)?;
                }
            }
            ResponseBody::Human { verbose_patterns } => {
                for (i, p) in verbose_patterns.iter().enumerate() {
                    write_verbose(f, i + 1, p)?;
                }
            }
        }
        Ok(())
    }
}

fn write_verbose(f: &mut Formatter<'_>, n: usize, p: &PatternOutputVerbose) -> fmt::Result {
    writeln!(f, "[{}] {}: {} (Severity: {})", n, p.id, p.name, p.severity)?;
    writeln!(f, "Tier: {} | Likelihood: {}", p.tier, p.likelihood)?;
    rule(f, '-', RULE_NARROW)?;
    writeln!(f, "THREAT: {}\n", p.threat)?;
    writeln!(f, "CHECK:  {}\n", p.check)?;
    writeln!(f, "FIX:    {}\n", p.fix)?;

    if !p.description.trim().is_empty() {
        writeln!(f, "DESCRIPTION\n{}\n", p.description.trim())?;
    }

    if let Some(scenario) = &p.attack_scenario {
        writeln!(f, "ATTACK SCENARIO\n{}", scenario.narrative.trim())?;
        if !scenario.preconditions.is_empty() {
            writeln!(f, "Preconditions:")?;
            for pre in &scenario.preconditions {
                writeln!(f, "  • {}", pre)?;
            }
        }
        for step in &scenario.steps {
            writeln!(f, "  {}. {}", step.step, step.action)?;
        }
        writeln!(f)?;
    }

    if !p.mitigations.is_empty() {
        writeln!(f, "MITIGATIONS")?;
        for m in &p.mitigations {
            let name = if m.name.is_empty() { &m.id } else { &m.name };
            writeln!(f, "[{}] {}", m.id, name)?;
            writeln!(
                f,
                "    Effectiveness: {} | Effort: {}",
                m.effectiveness, m.implementation_effort
            )?;
            writeln!(f, "    {}", first_line(&m.description))?;
            for ex in &m.code_examples {
                if let Some(secure) = ex.secure_code.as_deref().filter(|s| !s.is_empty()) {
                    writeln!(f, "    Secure ({} / {}):", ex.language, ex.framework)?;
                    for line in secure.lines() {
                        writeln!(f, "      {}", line)?;
                    }
                }
            }
        }
        writeln!(f)?;
    }

    if !p.related_patterns.is_empty() {
        writeln!(f, "Related: {}", p.related_patterns.join(", "))?;
    }
    let references: Vec<&str> = p
        .cwe_references
        .iter()
        .chain(&p.owasp_references)
        .map(String::as_str)
        .collect();
    if !references.is_empty() {
        writeln!(f, "References: {}", references.join(", "))?;
    }
    writeln!(f)
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

// ─── Pattern detail ─────────────────────────────────────────────────────────

struct PatternText<'a>(&'a ThreatPattern);

impl Display for PatternText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let p = self.0;
        writeln!(f, "{}: {}", p.id, p.name)?;
        writeln!(
            f,
            "Tier: {} | Severity: {} | Likelihood: {}",
            p.tier, p.severity, p.likelihood
        )?;
        writeln!(f, "Category: {} > {}", p.category, p.subcategory)?;
        writeln!(f, "Language: {} | Framework: {}", p.language, p.framework)?;
        rule(f, '=', RULE_PAGE)?;
        writeln!(f)?;

        section(f, "DESCRIPTION")?;
        writeln!(f, "{}\n", p.description.trim())?;

        section(f, "AGENT SUMMARY")?;
        writeln!(f, "Threat: {}", p.agent_summary.threat)?;
        writeln!(f, "Check:  {}", p.agent_summary.check)?;
        writeln!(f, "Fix:    {}\n", p.agent_summary.fix)?;

        bullets(f, "LLM BLINDSPOTS", &p.differentiation.llm_blindspots)?;

        if !p.mitigations.is_empty() {
            section(f, "MITIGATIONS")?;
            for m in &p.mitigations {
                let name = m.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(m.id.as_str());
                writeln!(f, "[{}] {}", m.id, name)?;
                writeln!(
                    f,
                    "    Effectiveness: {} | Effort: {}",
                    m.effectiveness, m.implementation_effort
                )?;
                writeln!(f, "    {}\n", first_line(&m.description))?;
            }
        }

        bullets(f, "GENERALIZES TO", &p.generalizes_to)?;

        let references = &p.provenance.public_references;
        if !references.is_empty() {
            section(f, "REFERENCES")?;
            for r in references {
                let name = r.name.as_deref().unwrap_or("");
                let label = r
                    .cwe
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .or(r.owasp.as_deref().filter(|s| !s.is_empty()));
                if let Some(label) = label {
                    writeln!(f, "• {}: {}", label, name)?;
                }
                if let Some(url) = r.url.as_deref().filter(|s| !s.is_empty()) {
                    writeln!(f, "  {}", url)?;
                }
            }
        }
        Ok(())
    }
}

fn section(f: &mut Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", title)?;
    rule(f, '-', RULE_NARROW)
}

fn bullets(f: &mut Formatter<'_>, title: &str, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    section(f, title)?;
    for item in items {
        writeln!(f, "• {}", item)?;
    }
    writeln!(f)
}

// ─── Pattern listings ───────────────────────────────────────────────────────

struct PatternList<'a> {
    patterns: &'a [PatternRef],
    verbose: bool,
}

impl Display for PatternList<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.patterns.is_empty() {
            return writeln!(f, "No patterns found");
        }
        writeln!(f, "Found {} pattern(s):\n", self.patterns.len())?;

        for p in self.patterns {
            if self.verbose {
                writeln!(f, "[{}] {}", p.tier, p.id)?;
                writeln!(f, "  Name:     {}", p.name)?;
                writeln!(f, "  Category: {} > {}", p.category, p.subcategory)?;
                writeln!(f, "  Severity: {} | Likelihood: {}", p.severity, p.likelihood)?;
                writeln!(f, "  Language: {} | Framework: {}\n", p.language, p.framework)?;
            } else {
                let tag = format!("[{}/{}]", p.severity, p.tier);
                writeln!(f, "{}  {:<20}  {}", p.id, tag, p.name)?;
            }
        }
        Ok(())
    }
}
